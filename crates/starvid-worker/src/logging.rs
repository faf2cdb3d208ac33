//! Structured job logging.

use tracing::{error, info, warn, Span};
use starvid_models::JobId;

/// Logs stage lifecycle events with the job ID and stage attached.
#[derive(Debug, Clone)]
pub struct JobLogger {
    job_id: String,
    stage: &'static str,
}

impl JobLogger {
    pub fn new(job_id: &JobId, stage: &'static str) -> Self {
        Self {
            job_id: job_id.to_string(),
            stage,
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(job_id = %self.job_id, stage = self.stage, "Stage started: {}", message);
    }

    pub fn log_progress(&self, message: &str) {
        info!(job_id = %self.job_id, stage = self.stage, "Stage progress: {}", message);
    }

    pub fn log_warning(&self, message: &str) {
        warn!(job_id = %self.job_id, stage = self.stage, "Stage warning: {}", message);
    }

    pub fn log_error(&self, message: &str) {
        error!(job_id = %self.job_id, stage = self.stage, "Stage error: {}", message);
    }

    pub fn log_completion(&self, message: &str) {
        info!(job_id = %self.job_id, stage = self.stage, "Stage completed: {}", message);
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn stage(&self) -> &'static str {
        self.stage
    }

    /// Span wrapping one stage execution.
    pub fn create_span(&self) -> Span {
        tracing::info_span!("job", job_id = %self.job_id, stage = self.stage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_logger_creation() {
        let job_id = JobId::from_string("octocat-Hello-World-1");
        let logger = JobLogger::new(&job_id, "render_video");

        assert_eq!(logger.job_id(), "octocat-Hello-World-1");
        assert_eq!(logger.stage(), "render_video");
    }
}
