//! Job lifecycle worker.
//!
//! This crate provides:
//! - The `process_stars` and `render_video` stages
//! - A queue executor with bounded concurrency and graceful shutdown
//! - Backend wiring shared with the API's embedded worker

pub mod backends;
pub mod config;
pub mod context;
pub mod error;
pub mod executor;
pub mod failure_tracker;
pub mod logging;
pub mod metrics;
pub mod stages;

pub use backends::{BackendConfig, Backends, StateBackend};
pub use config::WorkerConfig;
pub use context::ProcessingContext;
pub use error::{WorkerError, WorkerResult};
pub use executor::JobExecutor;
pub use logging::JobLogger;
pub use stages::{process_stars, render_video, StageOutcome};

#[cfg(test)]
mod test_support;
