//! Job submission.

use std::sync::Arc;

use starvid_models::{JobId, JobRecord, SubmitStarsRequest};
use starvid_queue::{JobQueue, ProcessStarsJob};
use starvid_store::JobRepository;
use tracing::{error, info, warn};

use crate::error::{ApiError, ApiResult};
use crate::metrics;

/// Accepts star history requests and hands them to the worker.
#[derive(Clone)]
pub struct JobService {
    jobs: JobRepository,
    queue: Arc<dyn JobQueue>,
}

impl JobService {
    pub fn new(jobs: JobRepository, queue: Arc<dyn JobQueue>) -> Self {
        Self { jobs, queue }
    }

    /// Validate, write a `pending` record and enqueue the first stage.
    ///
    /// Nothing is written when validation fails. When the enqueue fails the
    /// job is marked `failed` before the error is returned.
    pub async fn submit(&self, request: SubmitStarsRequest) -> ApiResult<JobId> {
        if let Err(reason) = request.check() {
            warn!(owner = %request.owner, repo = %request.repo, "Rejected submission: {}", reason);
            return Err(ApiError::bad_request("Invalid request body"));
        }

        let SubmitStarsRequest { owner, repo, theme } = request;
        let job_id = JobId::generate(&owner, &repo);
        info!(job_id = %job_id, owner = %owner, repo = %repo, theme = %theme, "Fetching GitHub stars");

        self.jobs
            .put(&job_id, &JobRecord::pending(owner.as_str(), repo.as_str()))
            .await?;

        let job = ProcessStarsJob::new(job_id.clone(), owner.as_str(), repo.as_str(), theme);
        if let Err(e) = self.queue.enqueue(job.into()).await {
            error!(job_id = %job_id, "Failed to enqueue star fetch: {}", e);
            let failed = JobRecord::failed(owner, repo, e.to_string());
            if let Err(store_err) = self.jobs.put(&job_id, &failed).await {
                error!(job_id = %job_id, "Failed to mark job failed: {}", store_err);
            }
            return Err(ApiError::internal("Internal server error"));
        }

        metrics::record_job_submitted();
        info!(job_id = %job_id, "Star fetch job initiated");
        Ok(job_id)
    }
}
