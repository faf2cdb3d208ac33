//! Job status state machine.
//!
//! Statuses advance strictly forward along
//! `pending -> processing -> rendering -> completed`, with `failed`
//! reachable from any non-terminal status.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Job processing status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Job accepted, waiting for the processing stage
    #[default]
    Pending,
    /// Star history is being fetched and aggregated
    Processing,
    /// Video is being rendered
    Rendering,
    /// Video is available
    Completed,
    /// Job failed with an error
    Failed,
}

impl JobStatus {
    /// Get string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Rendering => "rendering",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    /// Check if this is a terminal state (no more updates expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Position along the success path. `Failed` has no position.
    pub fn rank(&self) -> Option<u8> {
        match self {
            JobStatus::Pending => Some(0),
            JobStatus::Processing => Some(1),
            JobStatus::Rendering => Some(2),
            JobStatus::Completed => Some(3),
            JobStatus::Failed => None,
        }
    }

    /// Whether a record in this status may be overwritten with `next`.
    ///
    /// Re-entering the same non-terminal status is allowed so a redelivered
    /// stage message can re-run its stage.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        match (self.rank(), next.rank()) {
            (_, None) => true,
            (Some(current), Some(next)) => next >= current,
            (None, Some(_)) => false,
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_transitions() {
        assert!(JobStatus::Pending.can_transition_to(JobStatus::Processing));
        assert!(JobStatus::Processing.can_transition_to(JobStatus::Rendering));
        assert!(JobStatus::Rendering.can_transition_to(JobStatus::Completed));
        assert!(JobStatus::Processing.can_transition_to(JobStatus::Processing));
    }

    #[test]
    fn test_failed_reachable_from_non_terminal() {
        for status in [JobStatus::Pending, JobStatus::Processing, JobStatus::Rendering] {
            assert!(status.can_transition_to(JobStatus::Failed), "{status}");
        }
    }

    #[test]
    fn test_no_reverse_or_exit_from_terminal() {
        assert!(!JobStatus::Rendering.can_transition_to(JobStatus::Processing));
        assert!(!JobStatus::Processing.can_transition_to(JobStatus::Pending));
        assert!(!JobStatus::Completed.can_transition_to(JobStatus::Failed));
        assert!(!JobStatus::Failed.can_transition_to(JobStatus::Completed));
        assert!(!JobStatus::Failed.can_transition_to(JobStatus::Failed));
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(serde_json::to_string(&JobStatus::Rendering).unwrap(), "\"rendering\"");
        let parsed: JobStatus = serde_json::from_str("\"completed\"").unwrap();
        assert_eq!(parsed, JobStatus::Completed);
        assert!(parsed.is_terminal());
    }
}
