//! Typed repositories over a [`StateStore`].

use std::sync::Arc;

use starvid_models::{JobId, JobRecord, JobStatus, StarData};
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};
use crate::store::StateStore;

/// Namespace holding job records.
pub const JOB_NAMESPACE: &str = "job";
/// Namespace indexing jobs that have not reached a terminal status.
pub const ACTIVE_JOB_NAMESPACE: &str = "job-active";
/// Namespace holding cached star data.
pub const STARS_NAMESPACE: &str = "stars";

/// Job record repository.
#[derive(Clone)]
pub struct JobRepository {
    store: Arc<dyn StateStore>,
}

impl JobRepository {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self { store }
    }

    /// Fetch a job record. Returns `None` for unknown ids.
    pub async fn get(&self, job_id: &JobId) -> StoreResult<Option<JobRecord>> {
        match self.store.get(JOB_NAMESPACE, job_id.as_str()).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Overwrite the job record unconditionally.
    pub async fn put(&self, job_id: &JobId, record: &JobRecord) -> StoreResult<()> {
        let value = serde_json::to_value(record)?;
        self.store.set(JOB_NAMESPACE, job_id.as_str(), value).await?;

        if record.is_terminal() {
            self.store.delete(ACTIVE_JOB_NAMESPACE, job_id.as_str()).await?;
        } else {
            self.store
                .set(
                    ACTIVE_JOB_NAMESPACE,
                    job_id.as_str(),
                    serde_json::Value::Bool(true),
                )
                .await?;
        }

        debug!(job_id = %job_id, status = %record.status, "Wrote job record");
        Ok(())
    }

    /// Write `next` only if the current record may move to its status.
    ///
    /// Read-check-write is not atomic across processes. A stage message is
    /// only redelivered once its worker stops refreshing it, so the only
    /// racing writer is the stale sweep, whose `failed` write is terminal
    /// either way.
    pub async fn transition(&self, job_id: &JobId, next: &JobRecord) -> StoreResult<()> {
        if let Some(current) = self.get(job_id).await? {
            if !current.status.can_transition_to(next.status) {
                warn!(
                    job_id = %job_id,
                    from = %current.status,
                    to = %next.status,
                    "Refusing job status transition"
                );
                return Err(StoreError::InvalidTransition {
                    id: job_id.to_string(),
                    from: current.status.to_string(),
                    to: next.status.to_string(),
                });
            }
        }
        self.put(job_id, next).await
    }

    /// Current status of a job, if it exists.
    pub async fn status(&self, job_id: &JobId) -> StoreResult<Option<JobStatus>> {
        Ok(self.get(job_id).await?.map(|r| r.status))
    }

    /// Ids of jobs that have not reached `completed` or `failed`.
    pub async fn list_active(&self) -> StoreResult<Vec<JobId>> {
        let ids = self.store.keys(ACTIVE_JOB_NAMESPACE).await?;
        Ok(ids.into_iter().map(JobId::from).collect())
    }
}

/// Cached star data repository, keyed by `owner:repo`.
#[derive(Clone)]
pub struct StarsRepository {
    store: Arc<dyn StateStore>,
}

impl StarsRepository {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self { store }
    }

    pub async fn get(&self, owner: &str, repo: &str) -> StoreResult<Option<StarData>> {
        let key = StarData::cache_key(owner, repo);
        match self.store.get(STARS_NAMESPACE, &key).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Replace the cached entry. The latest successful fetch wins.
    pub async fn put(&self, owner: &str, repo: &str, data: &StarData) -> StoreResult<()> {
        let key = StarData::cache_key(owner, repo);
        self.store
            .set(STARS_NAMESPACE, &key, serde_json::to_value(data)?)
            .await
    }
}
