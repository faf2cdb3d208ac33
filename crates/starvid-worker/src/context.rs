//! Collaborators shared by all stage executions.

use std::sync::Arc;

use starvid_github::{GithubClient, StarHistorySource};
use starvid_media::{FfmpegRenderer, RenderConfig, VideoRenderer};
use starvid_queue::JobQueue;
use starvid_store::{JobRepository, StarsRepository};

use crate::backends::Backends;
use crate::error::WorkerResult;

/// Everything a stage needs, injected once at startup.
#[derive(Clone)]
pub struct ProcessingContext {
    pub jobs: JobRepository,
    pub stars: StarsRepository,
    pub queue: Arc<dyn JobQueue>,
    pub source: Arc<dyn StarHistorySource>,
    pub renderer: Arc<dyn VideoRenderer>,
}

impl ProcessingContext {
    pub fn new(
        backends: &Backends,
        source: Arc<dyn StarHistorySource>,
        renderer: Arc<dyn VideoRenderer>,
    ) -> Self {
        Self {
            jobs: JobRepository::new(Arc::clone(&backends.store)),
            stars: StarsRepository::new(Arc::clone(&backends.store)),
            queue: Arc::clone(&backends.queue),
            source,
            renderer,
        }
    }

    /// GitHub client and FFmpeg renderer configured from the environment.
    pub fn from_env(backends: &Backends) -> WorkerResult<Self> {
        let source = GithubClient::from_env()?;
        let renderer = FfmpegRenderer::new(RenderConfig::from_env());
        Ok(Self::new(backends, Arc::new(source), Arc::new(renderer)))
    }
}
