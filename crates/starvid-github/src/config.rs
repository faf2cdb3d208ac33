//! GitHub client configuration.

use std::time::Duration;

/// GitHub client configuration.
#[derive(Debug, Clone)]
pub struct GithubConfig {
    /// API base URL, without trailing slash
    pub api_url: String,
    /// Personal access token. Unauthenticated requests get a much lower rate limit.
    pub token: Option<String>,
    /// Per-request timeout
    pub timeout: Duration,
    /// Stargazers requested per page
    pub per_page: u32,
    /// Stop paginating once this many stargazers are collected
    pub max_stargazers: usize,
    /// Pause between stargazer pages
    pub page_delay: Duration,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com".to_string(),
            token: None,
            timeout: Duration::from_secs(30),
            per_page: 100,
            max_stargazers: 1000,
            page_delay: Duration::from_millis(100),
        }
    }
}

impl GithubConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_url: std::env::var("GITHUB_API_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_url),
            token: std::env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty()),
            timeout: std::env::var("GITHUB_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            ..defaults
        }
    }

    /// Point the client at another base URL.
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}
