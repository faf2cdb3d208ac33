//! `rendering` stage: produce the video and complete the job.

use starvid_media::RenderRequest;
use starvid_models::{JobRecord, JobStatus};
use starvid_queue::RenderVideoJob;
use starvid_storage::LocalArtifactStore;
use tracing::Instrument;

use super::{enter_stage, record_failure, StageOutcome};
use crate::context::ProcessingContext;
use crate::error::{WorkerError, WorkerResult};
use crate::logging::JobLogger;
use crate::metrics;

const STAGE: &str = "render_video";

/// Drive a `processing` job through `rendering` to `completed`.
pub async fn render_video(ctx: &ProcessingContext, job: &RenderVideoJob) -> WorkerResult<StageOutcome> {
    let logger = JobLogger::new(&job.job_id, STAGE);
    let span = logger.create_span();

    async {
        let record = JobRecord::rendering(&job.owner, &job.repo);
        let allowed = [JobStatus::Processing, JobStatus::Rendering];
        if let Some(skip) = enter_stage(ctx, &job.job_id, &allowed, &record, &logger).await? {
            return Ok(skip);
        }

        logger.log_start(&format!("rendering {} theme", job.theme));

        let request = RenderRequest {
            owner: job.owner.clone(),
            repo: job.repo.clone(),
            theme: job.theme,
            star_data: job.star_data.clone(),
        };

        let video = match ctx.renderer.render(&request).await {
            Ok(video) => video,
            Err(e) => {
                let err = WorkerError::from(e);
                return record_failure(ctx, &job.job_id, &job.owner, &job.repo, &logger, &err).await;
            }
        };

        let video_url = LocalArtifactStore::video_url(&video.file_name);
        let completed = JobRecord::completed(&job.owner, &job.repo, &video_url, job.star_data.clone());
        match ctx.jobs.transition(&job.job_id, &completed).await {
            Ok(()) => {
                metrics::record_job_completed();
                logger.log_completion(&video_url);
                Ok(StageOutcome::Completed)
            }
            Err(e) if e.is_invalid_transition() => {
                logger.log_warning("job finished elsewhere while rendering");
                Ok(StageOutcome::Skipped(e.to_string()))
            }
            Err(e) => {
                let err = WorkerError::from(e);
                record_failure(ctx, &job.job_id, &job.owner, &job.repo, &logger, &err).await
            }
        }
    }
    .instrument(span)
    .await
}
