//! GitHub REST API client.

use async_trait::async_trait;
use metrics::counter;
use reqwest::header::{HeaderMap, ACCEPT};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use starvid_models::Stargazer;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::config::GithubConfig;
use crate::error::{GithubError, GithubResult};
use crate::types::{ErrorResponse, RepositoryInfo, RepositoryResponse, StargazerResponse};

const JSON_MEDIA_TYPE: &str = "application/vnd.github+json";
const STAR_MEDIA_TYPE: &str = "application/vnd.github.v3.star+json";
const REQUESTS_TOTAL: &str = "starvid_github_requests_total";

/// Repository metadata plus its stargazers in starring order.
#[derive(Debug, Clone)]
pub struct StarHistory {
    pub repository: RepositoryInfo,
    pub stargazers: Vec<Stargazer>,
}

/// Source of repository star history.
#[async_trait]
pub trait StarHistorySource: Send + Sync {
    /// Fetch repository metadata and its stargazers.
    ///
    /// Errors on the metadata request fail the call; errors on a stargazer
    /// page end pagination with what was collected so far.
    async fn fetch_star_history(&self, owner: &str, repo: &str) -> GithubResult<StarHistory>;
}

/// GitHub REST API client.
#[derive(Clone)]
pub struct GithubClient {
    http: Client,
    config: GithubConfig,
}

impl GithubClient {
    pub fn new(config: GithubConfig) -> GithubResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("starvid-github/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, config })
    }

    pub fn from_env() -> GithubResult<Self> {
        Self::new(GithubConfig::from_env())
    }

    fn repo_url(&self, owner: &str, repo: &str) -> String {
        format!(
            "{}/repos/{}/{}",
            self.config.api_url,
            urlencoding::encode(owner),
            urlencoding::encode(repo)
        )
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        url: &str,
        accept: &str,
        query: &[(&str, String)],
    ) -> GithubResult<T> {
        let mut request = self.http.get(url).header(ACCEPT, accept).query(query);
        if let Some(token) = &self.config.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        counter!(REQUESTS_TOTAL, "endpoint" => endpoint, "status" => status.as_u16().to_string())
            .increment(1);

        if status != StatusCode::OK {
            return Err(Self::handle_error_response(status, response).await);
        }

        response
            .json::<T>()
            .await
            .map_err(|e| GithubError::invalid_response(format!("{}: {}", endpoint, e)))
    }

    async fn handle_error_response(status: StatusCode, response: Response) -> GithubError {
        let exhausted = rate_limit_exhausted(response.headers());
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorResponse>(&body)
            .map(|e| e.message)
            .ok()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("GitHub request failed")
                    .to_string()
            });
        GithubError::from_http_status(status.as_u16(), exhausted, message)
    }

    /// Fetch repository metadata.
    pub async fn get_repository(&self, owner: &str, repo: &str) -> GithubResult<RepositoryInfo> {
        let url = self.repo_url(owner, repo);
        let response: RepositoryResponse = self
            .get_json("repository", &url, JSON_MEDIA_TYPE, &[])
            .await?;
        Ok(response.into())
    }

    /// Fetch one page of stargazers (1-based).
    pub async fn list_stargazers_page(
        &self,
        owner: &str,
        repo: &str,
        page: u32,
    ) -> GithubResult<Vec<Stargazer>> {
        let url = format!("{}/stargazers", self.repo_url(owner, repo));
        let query = [
            ("per_page", self.config.per_page.to_string()),
            ("page", page.to_string()),
        ];
        let entries: Vec<StargazerResponse> = self
            .get_json("stargazers", &url, STAR_MEDIA_TYPE, &query)
            .await?;

        Ok(entries
            .into_iter()
            .filter_map(|entry| {
                entry.user.map(|user| Stargazer {
                    user: user.login,
                    avatar_url: user.avatar_url,
                    starred_at: entry.starred_at,
                })
            })
            .collect())
    }

    /// Fetch stargazers page by page until an empty page or the configured cap.
    pub async fn fetch_stargazers(&self, owner: &str, repo: &str) -> Vec<Stargazer> {
        let mut stargazers = Vec::new();
        let mut page = 1;

        loop {
            match self.list_stargazers_page(owner, repo, page).await {
                Ok(batch) if batch.is_empty() => break,
                Ok(batch) => {
                    debug!(page, count = batch.len(), "Fetched stargazer page");
                    stargazers.extend(batch);
                }
                Err(e) => {
                    warn!(page, error = %e, "Stargazer page failed, keeping partial results");
                    break;
                }
            }

            if stargazers.len() >= self.config.max_stargazers {
                stargazers.truncate(self.config.max_stargazers);
                break;
            }

            page += 1;
            tokio::time::sleep(self.config.page_delay).await;
        }

        stargazers
    }
}

fn rate_limit_exhausted(headers: &HeaderMap) -> bool {
    headers
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim() == "0")
        .unwrap_or(false)
}

#[async_trait]
impl StarHistorySource for GithubClient {
    async fn fetch_star_history(&self, owner: &str, repo: &str) -> GithubResult<StarHistory> {
        let span = info_span!("github_star_history", owner = %owner, repo = %repo);
        async {
            let repository = self.get_repository(owner, repo).await?;
            let stargazers = self.fetch_stargazers(owner, repo).await;
            info!(
                stars = repository.stargazers_count,
                fetched = stargazers.len(),
                "Fetched star history"
            );
            Ok(StarHistory {
                repository,
                stargazers,
            })
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, max_stargazers: usize) -> GithubClient {
        let config = GithubConfig {
            per_page: 2,
            max_stargazers,
            page_delay: Duration::from_millis(1),
            ..GithubConfig::default()
        }
        .with_api_url(server.uri())
        .with_token("test-token");
        GithubClient::new(config).unwrap()
    }

    fn stargazer(n: u32) -> serde_json::Value {
        json!({
            "starred_at": format!("2024-01-0{}T10:00:00Z", n),
            "user": {"login": format!("user{n}"), "avatar_url": format!("https://avatars.example/{n}")}
        })
    }

    async fn mount_repo(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/repos/octocat/Hello-World"))
            .and(header("authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "Hello-World",
                "stargazers_count": 3,
                "owner": {"login": "octocat", "avatar_url": "https://avatars.example/octocat"}
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_paginates_until_empty_page() {
        let server = MockServer::start().await;
        mount_repo(&server).await;

        Mock::given(method("GET"))
            .and(path("/repos/octocat/Hello-World/stargazers"))
            .and(query_param("page", "1"))
            .and(header("accept", STAR_MEDIA_TYPE))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([stargazer(1), stargazer(2)])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/octocat/Hello-World/stargazers"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([stargazer(3)])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/octocat/Hello-World/stargazers"))
            .and(query_param("page", "3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let client = client_for(&server, 1000);
        let history = client.fetch_star_history("octocat", "Hello-World").await.unwrap();

        assert_eq!(history.repository.owner_login, "octocat");
        assert_eq!(history.repository.stargazers_count, 3);
        let users: Vec<_> = history.stargazers.iter().map(|s| s.user.as_str()).collect();
        assert_eq!(users, vec!["user1", "user2", "user3"]);
    }

    #[tokio::test]
    async fn test_stops_at_cap() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/octocat/Hello-World/stargazers"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([stargazer(1), stargazer(2)])))
            .expect(2)
            .mount(&server)
            .await;

        let client = client_for(&server, 3);
        let stargazers = client.fetch_stargazers("octocat", "Hello-World").await;
        assert_eq!(stargazers.len(), 3);
    }

    #[tokio::test]
    async fn test_page_error_keeps_partial_results() {
        let server = MockServer::start().await;
        mount_repo(&server).await;
        Mock::given(method("GET"))
            .and(path("/repos/octocat/Hello-World/stargazers"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([stargazer(1), stargazer(2)])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/octocat/Hello-World/stargazers"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let client = client_for(&server, 1000);
        let history = client.fetch_star_history("octocat", "Hello-World").await.unwrap();
        assert_eq!(history.stargazers.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_repository_surfaces_upstream_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/octocat/gone"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "message": "Not Found",
                "documentation_url": "https://docs.github.com/rest"
            })))
            .mount(&server)
            .await;

        let client = client_for(&server, 1000);
        let err = client.fetch_star_history("octocat", "gone").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Not Found");
    }

    #[tokio::test]
    async fn test_rate_limit_detected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/octocat/Hello-World"))
            .respond_with(
                ResponseTemplate::new(403)
                    .insert_header("x-ratelimit-remaining", "0")
                    .set_body_json(json!({"message": "API rate limit exceeded"})),
            )
            .mount(&server)
            .await;

        let client = client_for(&server, 1000);
        let err = client.get_repository("octocat", "Hello-World").await.unwrap_err();
        assert!(matches!(err, GithubError::RateLimited(_)));
        assert_eq!(err.to_string(), "API rate limit exceeded");
    }

    #[tokio::test]
    async fn test_deleted_accounts_skipped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/octocat/Hello-World/stargazers"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"starred_at": "2024-01-01T00:00:00Z", "user": null},
                stargazer(2)
            ])))
            .mount(&server)
            .await;

        let client = client_for(&server, 1000);
        let page = client.list_stargazers_page("octocat", "Hello-World", 1).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].user, "user2");
    }
}
