//! GitHub client error types.

use thiserror::Error;

pub type GithubResult<T> = Result<T, GithubError>;

/// Errors raised while talking to GitHub.
///
/// `NotFound`, `RateLimited` and `Api` display the upstream message verbatim
/// so it can be stored on a failed job as-is.
#[derive(Debug, Error)]
pub enum GithubError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    RateLimited(String),

    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl GithubError {
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Map a non-success status and upstream message to an error.
    pub fn from_http_status(status: u16, rate_limit_exhausted: bool, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            404 => Self::NotFound(message),
            429 => Self::RateLimited(message),
            403 if rate_limit_exhausted => Self::RateLimited(message),
            _ => Self::Api { status, message },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, GithubError::NotFound(_))
    }
}
