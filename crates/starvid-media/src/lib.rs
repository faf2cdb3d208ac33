//! FFmpeg CLI wrapper and star-history video renderer.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building with lavfi sources
//! - Progress parsing from `-progress pipe:2`
//! - Timeout handling via tokio
//! - The star counter composition and a `VideoRenderer` trait

pub mod command;
pub mod composition;
pub mod error;
pub mod progress;
pub mod renderer;

pub use command::{check_ffmpeg, FfmpegCommand, FfmpegRunner};
pub use composition::Composition;
pub use error::{MediaError, MediaResult};
pub use progress::FfmpegProgress;
pub use renderer::{FfmpegRenderer, RenderConfig, RenderRequest, RenderedVideo, VideoRenderer};
