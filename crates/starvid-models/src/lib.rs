//! Shared data models for the StarVid pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Job records and the job status state machine
//! - Job identifiers
//! - Submission requests and video themes
//! - Star-history aggregation for the video composition

pub mod job;
pub mod job_status;
pub mod request;
pub mod star_data;
pub mod theme;

// Re-export common types
pub use job::{JobId, JobRecord};
pub use job_status::JobStatus;
pub use request::{SubmitStarsRequest, SubmitStarsResponse};
pub use star_data::{sample_avatars, star_timeline, StarData, Stargazer, TimelinePoint, MAX_AVATARS};
pub use theme::Theme;
