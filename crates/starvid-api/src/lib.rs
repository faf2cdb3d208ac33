//! Axum HTTP API server.
//!
//! This crate provides:
//! - Job submission, status and cached star data endpoints
//! - Video artifact serving with byte ranges
//! - Rate limiting, security headers and Prometheus metrics
//! - The stale job sweep

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use services::{JobService, StaleJobDetector};
pub use state::AppState;
