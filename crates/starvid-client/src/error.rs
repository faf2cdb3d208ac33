//! Client error types.

use thiserror::Error;

pub type PollResult<T> = Result<T, PollError>;

/// Errors raised by the API client and the poller.
#[derive(Debug, Error)]
pub enum PollError {
    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),

    #[error("Job not found: {0}")]
    NotFound(String),

    /// Non-success status; `message` is the API's `error` field when present.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Undecodable response: {0}")]
    Decode(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Job did not finish after {0} polls")]
    MaxAttempts(u32),
}

impl PollError {
    /// Whether the next poll may succeed.
    ///
    /// Connection failures, timeouts, `5xx` and `429` are transient. A missing
    /// job, other `4xx` and undecodable bodies are not.
    pub fn is_transient(&self) -> bool {
        match self {
            PollError::Network(e) => !e.is_decode() && !e.is_builder(),
            PollError::Api { status, .. } => *status >= 500 || *status == 429,
            PollError::InvalidUrl(_)
            | PollError::NotFound(_)
            | PollError::Decode(_)
            | PollError::MaxAttempts(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        let api = |status| PollError::Api {
            status,
            message: "x".into(),
        };
        assert!(api(503).is_transient());
        assert!(api(500).is_transient());
        assert!(api(429).is_transient());
        assert!(!api(400).is_transient());
        assert!(!PollError::NotFound("j".into()).is_transient());
        assert!(!PollError::Decode("eof".into()).is_transient());
    }
}
