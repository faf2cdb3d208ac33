//! Star history submission and cached data handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use tracing::{info, warn};

use starvid_models::{StarData, SubmitStarsRequest, SubmitStarsResponse};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// `POST /api/github/stars`
pub async fn submit_stars(
    State(state): State<AppState>,
    payload: Result<Json<SubmitStarsRequest>, JsonRejection>,
) -> ApiResult<Json<SubmitStarsResponse>> {
    let Json(request) = payload.map_err(|rejection| {
        warn!("Rejected submission body: {}", rejection.body_text());
        ApiError::bad_request("Invalid request body")
    })?;

    let job_id = state.job_service.submit(request).await?;

    Ok(Json(SubmitStarsResponse {
        success: true,
        message: "Star fetch job initiated successfully".to_string(),
        job_id: job_id.to_string(),
    }))
}

/// `GET /api/github/stars/:owner/:repo`
pub async fn get_stars_data(
    State(state): State<AppState>,
    Path((owner, repo)): Path<(String, String)>,
) -> ApiResult<Json<StarData>> {
    info!(owner = %owner, repo = %repo, "Fetching cached stars data");

    match state.stars.get(&owner, &repo).await? {
        Some(data) => Ok(Json(data)),
        None => Err(ApiError::not_found("No data found for this repository")),
    }
}
