//! StarVid API client.

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use starvid_models::{JobRecord, SubmitStarsRequest, SubmitStarsResponse};
use tracing::debug;
use url::Url;

use crate::error::{PollError, PollResult};

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// HTTP client for the StarVid API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(base_url: &str) -> PollResult<Self> {
        Self::with_timeout(base_url, Duration::from_secs(10))
    }

    /// Client with a per-request timeout.
    pub fn with_timeout(base_url: &str, timeout: Duration) -> PollResult<Self> {
        let base_url =
            Url::parse(base_url).map_err(|e| PollError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(PollError::InvalidUrl(base_url.to_string()));
        }
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("starvid-client/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> PollResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| PollError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// `POST /api/github/stars`
    pub async fn submit(&self, request: &SubmitStarsRequest) -> PollResult<SubmitStarsResponse> {
        let url = self.endpoint(&["api", "github", "stars"])?;
        let response = self.http.post(url).json(request).send().await?;
        Self::decode(response).await
    }

    /// `GET /api/github/jobs/:job_id`
    pub async fn job_status(&self, job_id: &str) -> PollResult<JobRecord> {
        let url = self.endpoint(&["api", "github", "jobs", job_id])?;
        let response = self.http.get(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(PollError::NotFound(job_id.to_string()));
        }
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> PollResult<T> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|b| b.error)
                .unwrap_or_else(|_| status.canonical_reason().unwrap_or("request failed").to_string());
            return Err(PollError::Api {
                status: status.as_u16(),
                message,
            });
        }

        debug!(status = %status, bytes = body.len(), "API response");
        serde_json::from_str(&body).map_err(|e| PollError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use starvid_models::{JobStatus, Theme};
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_rejects_invalid_base_url() {
        assert!(matches!(
            ApiClient::new("not a url"),
            Err(PollError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let client = ApiClient::new("http://localhost:8000/starvid/").unwrap();
        let url = client.endpoint(&["api", "github", "jobs", "a b"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/starvid/api/github/jobs/a%20b");
    }

    #[tokio::test]
    async fn test_submit_and_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/github/stars"))
            .and(body_json(json!({"owner": "octocat", "repo": "Hello-World", "theme": "light"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "message": "Star fetch job initiated successfully",
                "jobId": "octocat-Hello-World-1"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/github/jobs/octocat-Hello-World-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "processing",
                "owner": "octocat",
                "repo": "Hello-World",
                "updatedAt": "2024-01-01T00:00:00Z"
            })))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri()).unwrap();
        let submitted = client
            .submit(&SubmitStarsRequest::new("octocat", "Hello-World", Theme::Light))
            .await
            .unwrap();
        assert_eq!(submitted.job_id, "octocat-Hello-World-1");

        let record = client.job_status(&submitted.job_id).await.unwrap();
        assert_eq!(record.status, JobStatus::Processing);
    }

    #[tokio::test]
    async fn test_error_bodies() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/github/stars"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({"error": "Invalid request body"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/github/jobs/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "Job not found"})))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri()).unwrap();
        let err = client
            .submit(&SubmitStarsRequest::new("", "x", Theme::Dark))
            .await
            .unwrap_err();
        assert!(
            matches!(err, PollError::Api { status: 400, ref message } if message == "Invalid request body")
        );

        let err = client.job_status("missing").await.unwrap_err();
        assert!(matches!(err, PollError::NotFound(_)));
    }
}
