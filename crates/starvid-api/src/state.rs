//! Application state.

use std::sync::Arc;

use starvid_queue::JobQueue;
use starvid_storage::LocalArtifactStore;
use starvid_store::{JobRepository, StarsRepository, StateStore};
use starvid_worker::Backends;

use crate::config::ApiConfig;
use crate::services::JobService;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub store: Arc<dyn StateStore>,
    pub queue: Arc<dyn JobQueue>,
    pub jobs: JobRepository,
    pub stars: StarsRepository,
    pub artifacts: LocalArtifactStore,
    pub job_service: JobService,
}

impl AppState {
    /// Build state over already connected backends.
    pub fn new(config: ApiConfig, backends: &Backends) -> Self {
        let jobs = JobRepository::new(Arc::clone(&backends.store));
        let stars = StarsRepository::new(Arc::clone(&backends.store));
        let artifacts = LocalArtifactStore::new(config.videos_dir.clone());
        let job_service = JobService::new(jobs.clone(), Arc::clone(&backends.queue));

        Self {
            config,
            store: Arc::clone(&backends.store),
            queue: Arc::clone(&backends.queue),
            jobs,
            stars,
            artifacts,
            job_service,
        }
    }
}
