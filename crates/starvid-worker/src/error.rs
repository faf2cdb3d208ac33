//! Worker error types.

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

/// Errors raised by stages and the executor.
///
/// GitHub and media errors are transparent: their message is what a failed
/// job record shows.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Github(#[from] starvid_github::GithubError),

    #[error(transparent)]
    Media(#[from] starvid_media::MediaError),

    #[error("Store error: {0}")]
    Store(#[from] starvid_store::StoreError),

    #[error("Queue error: {0}")]
    Queue(#[from] starvid_queue::QueueError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
