//! GitHub REST client for star history.
//!
//! Only two endpoints are consumed: repository metadata and the paginated
//! stargazer list with starring timestamps.

pub mod client;
pub mod config;
pub mod error;
pub mod types;

pub use client::{GithubClient, StarHistory, StarHistorySource};
pub use config::GithubConfig;
pub use error::{GithubError, GithubResult};
pub use types::RepositoryInfo;
