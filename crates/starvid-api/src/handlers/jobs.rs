//! Job status handler.

use axum::extract::{Path, State};
use axum::Json;
use tracing::info;

use starvid_models::{JobId, JobRecord};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// `GET /api/github/jobs/:job_id`
pub async fn get_job_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<JobRecord>> {
    info!(job_id = %job_id, "Fetching job status");

    let job_id = JobId::from_string(job_id);
    match state.jobs.get(&job_id).await? {
        Some(record) => Ok(Json(record)),
        None => Err(ApiError::not_found("Job not found")),
    }
}
