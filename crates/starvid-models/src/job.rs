//! Job identifiers and the job record stored for each lifecycle stage.

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{JobStatus, StarData};

/// Last millisecond component handed out by [`JobId::generate`].
static LAST_ISSUED_MILLIS: AtomicI64 = AtomicI64::new(0);

/// Unique identifier for a job, formatted `owner-repo-<unix millis>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Allocate a fresh job ID for a repository.
    ///
    /// The millisecond component never repeats within a process, even when
    /// two jobs are allocated in the same millisecond.
    pub fn generate(owner: &str, repo: &str) -> Self {
        let now = Utc::now().timestamp_millis();
        let mut last = LAST_ISSUED_MILLIS.load(Ordering::Relaxed);
        let millis = loop {
            let candidate = now.max(last + 1);
            match LAST_ISSUED_MILLIS.compare_exchange_weak(
                last,
                candidate,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => break candidate,
                Err(actual) => last = actual,
            }
        };
        Self(format!("{}-{}-{}", owner, repo, millis))
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Job record as stored in the `job` namespace and returned by the status endpoint.
///
/// Every stage writes a brand new record; only `owner` and `repo` are carried
/// from one stage to the next.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    pub status: JobStatus,
    pub owner: String,
    pub repo: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_at: Option<DateTime<Utc>>,

    /// Plain-text error message (failed jobs only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Public path of the rendered video (completed jobs only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,

    /// Star data the video was rendered from (completed jobs only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<StarData>,
}

impl JobRecord {
    fn bare(status: JobStatus, owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            status,
            owner: owner.into(),
            repo: repo.into(),
            created_at: None,
            updated_at: None,
            completed_at: None,
            failed_at: None,
            error: None,
            video_url: None,
            data: None,
        }
    }

    /// Record written when a job is accepted.
    pub fn pending(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            created_at: Some(Utc::now()),
            ..Self::bare(JobStatus::Pending, owner, repo)
        }
    }

    /// Record written when star history fetching starts.
    pub fn processing(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            updated_at: Some(Utc::now()),
            ..Self::bare(JobStatus::Processing, owner, repo)
        }
    }

    /// Record written when rendering starts.
    pub fn rendering(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            updated_at: Some(Utc::now()),
            ..Self::bare(JobStatus::Rendering, owner, repo)
        }
    }

    /// Record written when the video is available.
    pub fn completed(
        owner: impl Into<String>,
        repo: impl Into<String>,
        video_url: impl Into<String>,
        data: StarData,
    ) -> Self {
        Self {
            completed_at: Some(Utc::now()),
            video_url: Some(video_url.into()),
            data: Some(data),
            ..Self::bare(JobStatus::Completed, owner, repo)
        }
    }

    /// Record written when any stage fails.
    ///
    /// An empty message is replaced so failed records always carry an error.
    pub fn failed(owner: impl Into<String>, repo: impl Into<String>, error: impl Into<String>) -> Self {
        let error = error.into();
        let error = if error.trim().is_empty() {
            "Unknown error".to_string()
        } else {
            error
        };
        Self {
            failed_at: Some(Utc::now()),
            error: Some(error),
            ..Self::bare(JobStatus::Failed, owner, repo)
        }
    }

    /// Check if the job is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Timestamp of the write that produced this record.
    pub fn last_transition_at(&self) -> Option<DateTime<Utc>> {
        match self.status {
            JobStatus::Pending => self.created_at,
            JobStatus::Processing | JobStatus::Rendering => self.updated_at,
            JobStatus::Completed => self.completed_at,
            JobStatus::Failed => self.failed_at,
        }
    }

    /// Check whether a non-terminal job has not advanced for longer than `max_age_secs`.
    pub fn is_stale(&self, max_age_secs: i64) -> bool {
        if self.is_terminal() {
            return false;
        }
        match self.last_transition_at() {
            Some(at) => (Utc::now() - at).num_seconds() > max_age_secs,
            None => true,
        }
    }
}
