//! Wire types for the consumed GitHub endpoints.

use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Account {
    pub login: String,
    pub avatar_url: String,
}

/// `GET /repos/{owner}/{repo}` (subset)
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RepositoryResponse {
    pub name: String,
    pub owner: Account,
    pub stargazers_count: u64,
}

/// Element of `GET /repos/{owner}/{repo}/stargazers` with the `star+json` media type.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct StargazerResponse {
    pub starred_at: DateTime<Utc>,
    /// `null` for deleted accounts
    pub user: Option<Account>,
}

/// Error body returned by the GitHub API.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorResponse {
    pub message: String,
}

/// Repository metadata needed for the video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryInfo {
    pub owner_login: String,
    pub owner_avatar_url: String,
    pub name: String,
    pub stargazers_count: u64,
}

impl From<RepositoryResponse> for RepositoryInfo {
    fn from(r: RepositoryResponse) -> Self {
        Self {
            owner_login: r.owner.login,
            owner_avatar_url: r.owner.avatar_url,
            name: r.name,
            stargazers_count: r.stargazers_count,
        }
    }
}
