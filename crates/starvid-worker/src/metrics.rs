//! Worker metrics.

use metrics::{counter, histogram};

pub mod names {
    pub const JOBS_COMPLETED_TOTAL: &str = "starvid_jobs_completed_total";
    pub const JOBS_FAILED_TOTAL: &str = "starvid_jobs_failed_total";
    pub const STAGES_SKIPPED_TOTAL: &str = "starvid_stages_skipped_total";
    pub const STAGE_DURATION_SECONDS: &str = "starvid_stage_duration_seconds";
}

pub fn record_job_completed() {
    counter!(names::JOBS_COMPLETED_TOTAL).increment(1);
}

pub fn record_job_failed(stage: &'static str) {
    counter!(names::JOBS_FAILED_TOTAL, "stage" => stage).increment(1);
}

pub fn record_stage_skipped(stage: &'static str) {
    counter!(names::STAGES_SKIPPED_TOTAL, "stage" => stage).increment(1);
}

pub fn record_stage_duration(stage: &'static str, seconds: f64) {
    histogram!(names::STAGE_DURATION_SECONDS, "stage" => stage).record(seconds);
}
