//! Job status polling.

use std::time::Duration;

use starvid_models::JobRecord;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::client::ApiClient;
use crate::error::{PollError, PollResult};

/// Poller configuration.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    pub api_url: String,
    /// Delay between status requests
    pub interval: Duration,
    /// Give up after this many polls; unbounded when `None`
    pub max_attempts: Option<u32>,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000".to_string(),
            interval: Duration::from_millis(3000),
            max_attempts: None,
        }
    }
}

impl PollerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_url: std::env::var("STARVID_API_URL").unwrap_or(defaults.api_url),
            interval: std::env::var("STARVID_POLL_INTERVAL_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|ms: &u64| *ms > 0)
                .map(Duration::from_millis)
                .unwrap_or(defaults.interval),
            max_attempts: std::env::var("STARVID_POLL_MAX_ATTEMPTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n: &u32| *n > 0),
        }
    }
}

/// Polls one job until it reaches `completed` or `failed`.
pub struct StatusPoller {
    client: ApiClient,
    interval: Duration,
    max_attempts: Option<u32>,
}

impl StatusPoller {
    pub fn new(client: ApiClient, config: &PollerConfig) -> Self {
        Self {
            client,
            interval: config.interval,
            max_attempts: config.max_attempts,
        }
    }

    /// Poll until the job is terminal and return its final record.
    ///
    /// `on_update` sees every record observed, including the terminal one.
    /// Transient errors are logged and polling continues; any other error
    /// ends the loop and is returned.
    pub async fn poll<F>(&self, job_id: &str, mut on_update: F) -> PollResult<JobRecord>
    where
        F: FnMut(&JobRecord),
    {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut attempts = 0u32;

        loop {
            if let Some(max) = self.max_attempts {
                if attempts >= max {
                    warn!(job_id, attempts, "Giving up on job status");
                    return Err(PollError::MaxAttempts(max));
                }
            }

            ticker.tick().await;
            attempts += 1;

            match self.client.job_status(job_id).await {
                Ok(record) => {
                    debug!(job_id, status = %record.status, attempt = attempts, "Polled job status");
                    on_update(&record);
                    if record.is_terminal() {
                        info!(job_id, status = %record.status, "Job finished");
                        return Ok(record);
                    }
                }
                Err(e) if e.is_transient() => {
                    warn!(job_id, attempt = attempts, "Status poll failed, retrying: {}", e);
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use serial_test::serial;
    use starvid_models::JobStatus;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const JOB: &str = "octocat-Hello-World-1";

    fn record(status: &str) -> Value {
        let mut body = json!({"status": status, "owner": "octocat", "repo": "Hello-World"});
        match status {
            "completed" => {
                body["videoUrl"] = json!("/videos/octocat-Hello-World-1.mp4");
            }
            "failed" => {
                body["error"] = json!("Not Found");
            }
            _ => {}
        }
        body
    }

    async fn mount(server: &MockServer, template: ResponseTemplate, times: Option<u64>) {
        let mock = Mock::given(method("GET"))
            .and(path(format!("/api/github/jobs/{JOB}")))
            .respond_with(template);
        let mock = match times {
            Some(n) => mock.up_to_n_times(n),
            None => mock,
        };
        mock.mount(server).await;
    }

    fn poller(server: &MockServer, max_attempts: Option<u32>) -> StatusPoller {
        let config = PollerConfig {
            api_url: server.uri(),
            interval: Duration::from_millis(10),
            max_attempts,
        };
        StatusPoller::new(ApiClient::new(&config.api_url).unwrap(), &config)
    }

    async fn request_count(server: &MockServer) -> usize {
        server.received_requests().await.map(|r| r.len()).unwrap_or(0)
    }

    #[tokio::test]
    async fn test_polls_until_completed() {
        let server = MockServer::start().await;
        mount(&server, ResponseTemplate::new(200).set_body_json(record("pending")), Some(1)).await;
        mount(&server, ResponseTemplate::new(200).set_body_json(record("rendering")), Some(1)).await;
        mount(&server, ResponseTemplate::new(200).set_body_json(record("completed")), None).await;

        let mut seen = Vec::new();
        let last = poller(&server, None)
            .poll(JOB, |r| seen.push(r.status))
            .await
            .unwrap();

        assert_eq!(last.status, JobStatus::Completed);
        assert_eq!(
            seen,
            vec![JobStatus::Pending, JobStatus::Rendering, JobStatus::Completed]
        );
        assert_eq!(request_count(&server).await, 3);
    }

    #[tokio::test]
    async fn test_failed_job_stops_polling() {
        let server = MockServer::start().await;
        mount(&server, ResponseTemplate::new(200).set_body_json(record("failed")), None).await;

        let last = poller(&server, None).poll(JOB, |_| {}).await.unwrap();
        assert_eq!(last.status, JobStatus::Failed);
        assert_eq!(last.error.as_deref(), Some("Not Found"));
        assert_eq!(request_count(&server).await, 1);
    }

    #[tokio::test]
    async fn test_transient_errors_are_retried() {
        let server = MockServer::start().await;
        mount(&server, ResponseTemplate::new(503), Some(1)).await;
        mount(&server, ResponseTemplate::new(429), Some(1)).await;
        mount(&server, ResponseTemplate::new(200).set_body_json(record("completed")), None).await;

        let mut updates = 0;
        let last = poller(&server, None).poll(JOB, |_| updates += 1).await.unwrap();

        assert_eq!(last.status, JobStatus::Completed);
        assert_eq!(updates, 1);
        assert_eq!(request_count(&server).await, 3);
    }

    #[tokio::test]
    async fn test_unknown_job_is_surfaced_once() {
        let server = MockServer::start().await;
        mount(
            &server,
            ResponseTemplate::new(404).set_body_json(json!({"error": "Job not found"})),
            None,
        )
        .await;

        let err = poller(&server, None).poll(JOB, |_| {}).await.unwrap_err();
        assert!(matches!(err, PollError::NotFound(_)));
        assert_eq!(request_count(&server).await, 1);
    }

    #[tokio::test]
    async fn test_undecodable_body_stops_polling() {
        let server = MockServer::start().await;
        mount(&server, ResponseTemplate::new(200).set_body_string("<html>"), None).await;

        let err = poller(&server, None).poll(JOB, |_| {}).await.unwrap_err();
        assert!(matches!(err, PollError::Decode(_)));
        assert_eq!(request_count(&server).await, 1);
    }

    #[tokio::test]
    async fn test_max_attempts() {
        let server = MockServer::start().await;
        mount(&server, ResponseTemplate::new(200).set_body_json(record("processing")), None).await;

        let err = poller(&server, Some(3)).poll(JOB, |_| {}).await.unwrap_err();
        assert!(matches!(err, PollError::MaxAttempts(3)));
        assert_eq!(request_count(&server).await, 3);
    }

    #[test]
    #[serial]
    fn test_config_from_env() {
        std::env::set_var("STARVID_POLL_INTERVAL_MS", "250");
        std::env::set_var("STARVID_POLL_MAX_ATTEMPTS", "0");
        let config = PollerConfig::from_env();
        std::env::remove_var("STARVID_POLL_INTERVAL_MS");
        std::env::remove_var("STARVID_POLL_MAX_ATTEMPTS");

        assert_eq!(config.interval, Duration::from_millis(250));
        assert_eq!(config.max_attempts, None);
    }
}
