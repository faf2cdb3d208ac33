//! Stage messages carried by the queue.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use starvid_models::{JobId, StarData, Theme};

/// Fetch and aggregate the star history of a repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessStarsJob {
    pub job_id: JobId,
    pub owner: String,
    pub repo: String,
    #[serde(default)]
    pub theme: Theme,
    /// When the job was submitted
    pub created_at: DateTime<Utc>,
}

impl ProcessStarsJob {
    pub fn new(
        job_id: JobId,
        owner: impl Into<String>,
        repo: impl Into<String>,
        theme: Theme,
    ) -> Self {
        Self {
            job_id,
            owner: owner.into(),
            repo: repo.into(),
            theme,
            created_at: Utc::now(),
        }
    }

    pub fn idempotency_key(&self) -> String {
        format!("process_stars:{}", self.job_id)
    }
}

/// Render the video for aggregated star data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderVideoJob {
    pub job_id: JobId,
    pub owner: String,
    pub repo: String,
    #[serde(default)]
    pub theme: Theme,
    pub star_data: StarData,
}

impl RenderVideoJob {
    pub fn new(
        job_id: JobId,
        owner: impl Into<String>,
        repo: impl Into<String>,
        theme: Theme,
        star_data: StarData,
    ) -> Self {
        Self {
            job_id,
            owner: owner.into(),
            repo: repo.into(),
            theme,
            star_data,
        }
    }

    pub fn idempotency_key(&self) -> String {
        format!("render_video:{}", self.job_id)
    }
}

/// Generic job wrapper for queue storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QueueJob {
    ProcessStars(ProcessStarsJob),
    RenderVideo(RenderVideoJob),
}

impl QueueJob {
    pub fn job_id(&self) -> &JobId {
        match self {
            QueueJob::ProcessStars(j) => &j.job_id,
            QueueJob::RenderVideo(j) => &j.job_id,
        }
    }

    pub fn owner(&self) -> &str {
        match self {
            QueueJob::ProcessStars(j) => &j.owner,
            QueueJob::RenderVideo(j) => &j.owner,
        }
    }

    pub fn repo(&self) -> &str {
        match self {
            QueueJob::ProcessStars(j) => &j.repo,
            QueueJob::RenderVideo(j) => &j.repo,
        }
    }

    /// Stage name used in logs and metrics.
    pub fn stage(&self) -> &'static str {
        match self {
            QueueJob::ProcessStars(_) => "process_stars",
            QueueJob::RenderVideo(_) => "render_video",
        }
    }

    /// One message per stage per job.
    pub fn idempotency_key(&self) -> String {
        match self {
            QueueJob::ProcessStars(j) => j.idempotency_key(),
            QueueJob::RenderVideo(j) => j.idempotency_key(),
        }
    }
}

impl From<ProcessStarsJob> for QueueJob {
    fn from(job: ProcessStarsJob) -> Self {
        QueueJob::ProcessStars(job)
    }
}

impl From<RenderVideoJob> for QueueJob {
    fn from(job: RenderVideoJob) -> Self {
        QueueJob::RenderVideo(job)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tagged_payload() {
        let job = QueueJob::from(ProcessStarsJob::new(
            JobId::from_string("octocat-Hello-World-1"),
            "octocat",
            "Hello-World",
            Theme::Light,
        ));
        let json = serde_json::to_value(&job).unwrap();
        assert_eq!(json["type"], "process_stars");
        assert_eq!(json["theme"], "light");
        assert_eq!(json["job_id"], "octocat-Hello-World-1");

        let back: QueueJob = serde_json::from_value(json).unwrap();
        assert_eq!(back.stage(), "process_stars");
        assert_eq!(back.owner(), "octocat");
    }

    #[test]
    fn test_idempotency_key_per_stage() {
        let id = JobId::from_string("o-r-42");
        let data = StarData::new("o", "https://a/o", "r", 0, &[]);
        let process = QueueJob::from(ProcessStarsJob::new(id.clone(), "o", "r", Theme::Dark));
        let render = QueueJob::from(RenderVideoJob::new(id, "o", "r", Theme::Dark, data));

        assert_eq!(process.idempotency_key(), "process_stars:o-r-42");
        assert_eq!(render.idempotency_key(), "render_video:o-r-42");
    }
}
