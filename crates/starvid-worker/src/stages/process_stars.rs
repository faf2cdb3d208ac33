//! `processing` stage: fetch star history and hand off to rendering.

use starvid_models::{JobRecord, JobStatus, StarData};
use starvid_queue::{ProcessStarsJob, RenderVideoJob};
use tracing::Instrument;

use super::{enter_stage, record_failure, StageOutcome};
use crate::context::ProcessingContext;
use crate::error::WorkerResult;
use crate::logging::JobLogger;

const STAGE: &str = "process_stars";

/// Drive a `pending` job through `processing`.
///
/// Writes `processing`, fetches repository metadata and stargazers, caches
/// the aggregated star data under `owner:repo` and enqueues the render stage.
pub async fn process_stars(ctx: &ProcessingContext, job: &ProcessStarsJob) -> WorkerResult<StageOutcome> {
    let logger = JobLogger::new(&job.job_id, STAGE);
    let span = logger.create_span();

    async {
        let record = JobRecord::processing(&job.owner, &job.repo);
        let allowed = [JobStatus::Pending, JobStatus::Processing];
        if let Some(skip) = enter_stage(ctx, &job.job_id, &allowed, &record, &logger).await? {
            return Ok(skip);
        }

        logger.log_start(&format!("fetching star history for {}/{}", job.owner, job.repo));

        match fetch_and_hand_off(ctx, job, &logger).await {
            Ok(()) => {
                logger.log_completion("handed off to rendering");
                Ok(StageOutcome::Advanced)
            }
            Err(e) => record_failure(ctx, &job.job_id, &job.owner, &job.repo, &logger, &e).await,
        }
    }
    .instrument(span)
    .await
}

async fn fetch_and_hand_off(
    ctx: &ProcessingContext,
    job: &ProcessStarsJob,
    logger: &JobLogger,
) -> WorkerResult<()> {
    let history = ctx.source.fetch_star_history(&job.owner, &job.repo).await?;
    let repository = history.repository;

    let star_data = StarData::new(
        repository.owner_login,
        repository.owner_avatar_url,
        repository.name,
        repository.stargazers_count,
        &history.stargazers,
    );
    logger.log_progress(&format!(
        "{} stars, {} stargazers fetched, {} days on the timeline",
        star_data.stars,
        history.stargazers.len(),
        star_data.timeline.len()
    ));

    ctx.stars.put(&job.owner, &job.repo, &star_data).await?;

    let render = RenderVideoJob::new(job.job_id.clone(), &job.owner, &job.repo, job.theme, star_data);
    match ctx.queue.enqueue(render.into()).await {
        Ok(_) => Ok(()),
        Err(e) if e.is_duplicate() => {
            logger.log_warning("render stage already enqueued");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
