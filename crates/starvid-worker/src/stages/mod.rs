//! Job lifecycle stages.
//!
//! Each stage checks the job record before doing any work, so a redelivered
//! message whose job already moved on is skipped instead of reversing the
//! record. Errors from the stage's own work become a `failed` record; only
//! store or queue failures surface as `Err`.

mod process_stars;
mod render_video;

pub use process_stars::process_stars;
pub use render_video::render_video;

use starvid_models::{JobId, JobRecord, JobStatus};

use crate::context::ProcessingContext;
use crate::error::{WorkerError, WorkerResult};
use crate::logging::JobLogger;
use crate::metrics;

/// Result of running one stage message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    /// Work done and the next stage enqueued
    Advanced,
    /// Job reached `completed`
    Completed,
    /// Job written as `failed` with this message
    Failed(String),
    /// Message ignored because the job is elsewhere in its lifecycle
    Skipped(String),
}

/// Check the current status and write the stage's record.
///
/// Returns `Some(outcome)` when the stage must not run.
async fn enter_stage(
    ctx: &ProcessingContext,
    job_id: &JobId,
    allowed: &[JobStatus],
    record: &JobRecord,
    logger: &JobLogger,
) -> WorkerResult<Option<StageOutcome>> {
    let Some(current) = ctx.jobs.status(job_id).await? else {
        logger.log_warning("job record missing, skipping message");
        return Ok(Some(StageOutcome::Skipped("job record missing".to_string())));
    };

    if !allowed.contains(&current) {
        logger.log_warning(&format!("job is {}, skipping message", current));
        return Ok(Some(StageOutcome::Skipped(format!("job is {}", current))));
    }

    match ctx.jobs.transition(job_id, record).await {
        Ok(()) => Ok(None),
        Err(e) if e.is_invalid_transition() => {
            Ok(Some(StageOutcome::Skipped(e.to_string())))
        }
        Err(e) => Err(e.into()),
    }
}

/// Write a `failed` record for a stage error.
async fn record_failure(
    ctx: &ProcessingContext,
    job_id: &JobId,
    owner: &str,
    repo: &str,
    logger: &JobLogger,
    error: &WorkerError,
) -> WorkerResult<StageOutcome> {
    let message = error.to_string();
    logger.log_error(&message);

    let record = JobRecord::failed(owner, repo, &message);
    match ctx.jobs.transition(job_id, &record).await {
        Ok(()) => {
            metrics::record_job_failed(logger.stage());
            Ok(StageOutcome::Failed(record.error.unwrap_or(message)))
        }
        Err(e) if e.is_invalid_transition() => Ok(StageOutcome::Skipped(e.to_string())),
        Err(e) => Err(e.into()),
    }
}
