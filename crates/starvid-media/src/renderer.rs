//! Video rendering for star data.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use metrics::histogram;
use starvid_models::{StarData, Theme};
use tracing::{info, warn};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::composition::Composition;
use crate::error::MediaResult;

const RENDER_DURATION_SECONDS: &str = "starvid_render_duration_seconds";

/// Renderer configuration.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Directory rendered videos are written to
    pub output_dir: PathBuf,
    /// Kill the encoder after this many seconds
    pub timeout_secs: u64,
    /// Font for drawtext; fontconfig's default when unset
    pub font_file: Option<PathBuf>,
    pub crf: u8,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("public/videos"),
            timeout_secs: 300,
            font_file: None,
            crf: 18,
        }
    }
}

impl RenderConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            output_dir: std::env::var("VIDEOS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            timeout_secs: std::env::var("RENDER_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.timeout_secs),
            font_file: std::env::var("RENDER_FONT_FILE")
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
            crf: defaults.crf,
        }
    }
}

/// Input of a render.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub owner: String,
    pub repo: String,
    pub theme: Theme,
    pub star_data: StarData,
}

/// A video written to the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedVideo {
    pub path: PathBuf,
    /// File name within the output directory
    pub file_name: String,
}

/// Turns star data into a video file.
#[async_trait]
pub trait VideoRenderer: Send + Sync {
    async fn render(&self, request: &RenderRequest) -> MediaResult<RenderedVideo>;
}

/// Renders with the FFmpeg CLI.
#[derive(Debug, Clone)]
pub struct FfmpegRenderer {
    config: RenderConfig,
}

impl FfmpegRenderer {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// `<owner>-<repo>-<unix millis>.mp4`
    pub fn output_file_name(owner: &str, repo: &str) -> String {
        format!("{}-{}-{}.mp4", owner, repo, Utc::now().timestamp_millis())
    }

    /// Build the FFmpeg invocation for a request.
    pub fn build_command(&self, request: &RenderRequest, output: impl Into<PathBuf>) -> FfmpegCommand {
        let composition = Composition::new(&request.star_data, request.theme)
            .with_font_file(self.config.font_file.clone());

        FfmpegCommand::new(output.into())
            .lavfi_input(composition.background_source())
            .video_filter(composition.filter_graph())
            .video_codec("libx264")
            .crf(self.config.crf)
            .pixel_format("yuv420p")
            .output_args(["-movflags", "+faststart"])
            .format("mp4")
    }
}

#[async_trait]
impl VideoRenderer for FfmpegRenderer {
    async fn render(&self, request: &RenderRequest) -> MediaResult<RenderedVideo> {
        tokio::fs::create_dir_all(&self.config.output_dir).await?;

        let file_name = Self::output_file_name(&request.owner, &request.repo);
        let path = self.config.output_dir.join(&file_name);
        let partial = self.config.output_dir.join(format!("{}.partial", file_name));

        let cmd = self.build_command(request, &partial);
        let runner = FfmpegRunner::new().with_timeout(self.config.timeout_secs);

        let owner = request.owner.clone();
        let repo = request.repo.clone();
        let last_decile = AtomicU8::new(0);
        let total_ms = Composition::duration_ms();

        info!(owner = %owner, repo = %repo, file = %file_name, "Starting render");
        let started = Instant::now();

        let result = runner
            .run_with_progress(&cmd, move |progress| {
                let decile = progress.decile(total_ms);
                if decile > last_decile.fetch_max(decile, Ordering::Relaxed) {
                    info!(owner = %owner, repo = %repo, "Render progress: {}%", decile as u32 * 10);
                }
            })
            .await;

        if let Err(e) = result {
            if let Err(cleanup) = tokio::fs::remove_file(&partial).await {
                if cleanup.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %partial.display(), error = %cleanup, "Failed to remove partial render");
                }
            }
            return Err(e);
        }

        tokio::fs::rename(&partial, &path).await?;

        let elapsed = started.elapsed().as_secs_f64();
        histogram!(RENDER_DURATION_SECONDS).record(elapsed);
        info!(
            owner = %request.owner,
            repo = %request.repo,
            file = %file_name,
            elapsed_secs = elapsed,
            "Render finished"
        );

        Ok(RenderedVideo { path, file_name })
    }
}
