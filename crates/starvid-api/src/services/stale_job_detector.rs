//! Background sweep failing jobs that stopped advancing.
//!
//! A worker that crashes mid-stage leaves its job `processing` or
//! `rendering` forever. The sweep walks the active-job index and fails any
//! job whose last stage write is older than the configured threshold.

use std::time::Duration;

use tokio::time::interval;
use tracing::{error, info, warn};

use starvid_models::{JobId, JobRecord};
use starvid_store::JobRepository;

use crate::metrics;

/// Interval between stale job detection runs.
const DETECTION_INTERVAL: Duration = Duration::from_secs(30);

/// Error stored on jobs failed by the sweep.
pub const STALE_JOB_ERROR: &str =
    "Processing timed out. The worker may have crashed. Please try again.";

/// Stale job detector service.
pub struct StaleJobDetector {
    jobs: JobRepository,
    threshold: Duration,
    enabled: bool,
}

impl StaleJobDetector {
    pub fn new(jobs: JobRepository, threshold: Duration, enabled: bool) -> Self {
        Self {
            jobs,
            threshold,
            enabled,
        }
    }

    /// Start the background detection loop.
    ///
    /// Runs forever; spawn it as a background task.
    pub async fn run(&self) {
        if !self.enabled {
            info!("Stale job detection is disabled");
            return;
        }

        info!(
            "Starting stale job detector (interval: {:?}, threshold: {:?})",
            DETECTION_INTERVAL, self.threshold
        );

        let mut ticker = interval(DETECTION_INTERVAL);

        loop {
            ticker.tick().await;

            match self.check_once().await {
                Ok((stale, recovered)) if stale > 0 => {
                    info!(
                        "Stale job detection complete: {} stale, {} recovered",
                        stale, recovered
                    );
                }
                Ok(_) => {}
                Err(e) => error!("Stale job detection error: {}", e),
            }
        }
    }

    /// Run one sweep and return `(stale, recovered)` counts.
    pub async fn check_once(&self) -> anyhow::Result<(u32, u32)> {
        let threshold_secs = self.threshold.as_secs() as i64;
        let mut stale_count = 0u32;
        let mut recovered_count = 0u32;

        for job_id in self.jobs.list_active().await? {
            let Some(record) = self.jobs.get(&job_id).await? else {
                continue;
            };
            if !record.is_stale(threshold_secs) {
                continue;
            }

            stale_count += 1;
            warn!(
                job_id = %job_id,
                status = %record.status,
                last_transition_at = ?record.last_transition_at(),
                "Detected stale job"
            );

            match self.recover(&job_id, &record).await {
                Ok(()) => {
                    recovered_count += 1;
                    metrics::record_stale_job_recovered();
                    info!(job_id = %job_id, "Marked stale job as failed");
                }
                Err(e) => error!(job_id = %job_id, "Failed to recover stale job: {}", e),
            }
        }

        Ok((stale_count, recovered_count))
    }

    async fn recover(&self, job_id: &JobId, record: &JobRecord) -> anyhow::Result<()> {
        let failed = JobRecord::failed(record.owner.as_str(), record.repo.as_str(), STALE_JOB_ERROR);
        // A worker finishing in the meantime wins; the transition is refused.
        self.jobs.transition(job_id, &failed).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::Utc;
    use starvid_models::JobStatus;
    use starvid_store::MemoryStore;

    fn repo() -> JobRepository {
        JobRepository::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_old_jobs_are_failed() {
        let jobs = repo();
        let old = JobId::from_string("o-r-1");
        let mut record = JobRecord::processing("o", "r");
        record.updated_at = Some(Utc::now() - chrono::Duration::seconds(1000));
        jobs.put(&old, &record).await.unwrap();

        let fresh = JobId::from_string("o-r-2");
        jobs.put(&fresh, &JobRecord::rendering("o", "r")).await.unwrap();

        let detector = StaleJobDetector::new(jobs.clone(), Duration::from_secs(900), true);
        assert_eq!(detector.check_once().await.unwrap(), (1, 1));

        let failed = jobs.get(&old).await.unwrap().unwrap();
        assert_eq!(failed.status, JobStatus::Failed);
        assert_eq!(failed.error.as_deref(), Some(STALE_JOB_ERROR));
        assert_eq!(jobs.status(&fresh).await.unwrap(), Some(JobStatus::Rendering));
        assert_eq!(jobs.list_active().await.unwrap(), vec![fresh]);
    }

    #[tokio::test]
    async fn test_terminal_jobs_are_ignored() {
        let jobs = repo();
        let id = JobId::from_string("o-r-3");
        let mut record = JobRecord::failed("o", "r", "Not Found");
        record.failed_at = Some(Utc::now() - chrono::Duration::seconds(5000));
        jobs.put(&id, &record).await.unwrap();

        let detector = StaleJobDetector::new(jobs.clone(), Duration::from_secs(900), true);
        assert_eq!(detector.check_once().await.unwrap(), (0, 0));
        assert_eq!(
            jobs.get(&id).await.unwrap().unwrap().error.as_deref(),
            Some("Not Found")
        );
    }
}
