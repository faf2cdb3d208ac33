//! Fakes for stage and executor tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use starvid_github::{GithubError, GithubResult, RepositoryInfo, StarHistory, StarHistorySource};
use starvid_media::{MediaError, MediaResult, RenderRequest, RenderedVideo, VideoRenderer};
use starvid_models::Stargazer;

use crate::backends::Backends;
use crate::context::ProcessingContext;

pub fn history(stargazers: u32) -> StarHistory {
    StarHistory {
        repository: RepositoryInfo {
            owner_login: "octocat".to_string(),
            owner_avatar_url: "https://avatars.example/octocat".to_string(),
            name: "Hello-World".to_string(),
            stargazers_count: stargazers as u64,
        },
        stargazers: (1..=stargazers)
            .map(|n| Stargazer {
                user: format!("user{n}"),
                avatar_url: format!("https://avatars.example/{n}"),
                starred_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, n).unwrap(),
            })
            .collect(),
    }
}

pub struct FakeSource {
    history: Option<StarHistory>,
}

impl FakeSource {
    pub fn ok(history: StarHistory) -> Self {
        Self { history: Some(history) }
    }

    pub fn not_found() -> Self {
        Self { history: None }
    }
}

#[async_trait]
impl StarHistorySource for FakeSource {
    async fn fetch_star_history(&self, _owner: &str, _repo: &str) -> GithubResult<StarHistory> {
        self.history
            .clone()
            .ok_or_else(|| GithubError::from_http_status(404, false, "Not Found"))
    }
}

#[derive(Default)]
pub struct FakeRenderer {
    fail: bool,
    delay: Duration,
    calls: Arc<AtomicUsize>,
}

impl FakeRenderer {
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Renderer that takes `delay` per call; the returned counter tracks calls.
    pub fn slow(delay: Duration) -> (Self, Arc<AtomicUsize>) {
        let renderer = Self {
            delay,
            ..Self::default()
        };
        let calls = Arc::clone(&renderer.calls);
        (renderer, calls)
    }
}

#[async_trait]
impl VideoRenderer for FakeRenderer {
    async fn render(&self, request: &RenderRequest) -> MediaResult<RenderedVideo> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail {
            return Err(MediaError::Timeout(300));
        }
        let file_name = format!("{}-{}-1.mp4", request.owner, request.repo);
        Ok(RenderedVideo {
            path: std::env::temp_dir().join(&file_name),
            file_name,
        })
    }
}

pub fn context(source: FakeSource, renderer: FakeRenderer) -> ProcessingContext {
    ProcessingContext::new(&Backends::in_memory(), Arc::new(source), Arc::new(renderer))
}
