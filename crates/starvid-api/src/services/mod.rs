//! Business logic services.

pub mod jobs;
pub mod stale_job_detector;

pub use jobs::JobService;
pub use stale_job_detector::{StaleJobDetector, STALE_JOB_ERROR};
