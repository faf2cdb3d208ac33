//! Rendered video delivery.

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::Response;
use tracing::{info, warn};

use starvid_storage::StorageError;

use crate::error::ApiError;
use crate::state::AppState;

/// `GET /videos/:filename`
///
/// Serves the whole file, or a single byte range when `Range` is sent.
pub async fn serve_video(
    State(state): State<AppState>,
    Path(filename): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let range_header = headers.get(header::RANGE).and_then(|v| v.to_str().ok());

    let artifact = match state.artifacts.read_range(&filename, range_header).await {
        Ok(artifact) => artifact,
        Err(StorageError::InvalidFilename(_)) => {
            warn!(filename = %filename, "Rejected video filename");
            return Err(ApiError::not_found("Invalid filename"));
        }
        Err(StorageError::NotFound(_)) => {
            warn!(filename = %filename, "Video file not found");
            return Err(ApiError::not_found("Video not found"));
        }
        Err(StorageError::RangeNotSatisfiable(total_len)) => {
            return Response::builder()
                .status(StatusCode::RANGE_NOT_SATISFIABLE)
                .header(header::CONTENT_RANGE, format!("bytes */{}", total_len))
                .body(Body::empty())
                .map_err(|e| ApiError::internal(format!("Failed to build response: {}", e)));
        }
        Err(e) => return Err(e.into()),
    };

    info!(filename = %filename, size = artifact.bytes.len(), "Serving video");

    let mut builder = Response::builder()
        .header(header::CONTENT_TYPE, "video/mp4")
        .header(header::CONTENT_LENGTH, artifact.bytes.len())
        .header(header::ACCEPT_RANGES, "bytes")
        .header(header::CACHE_CONTROL, "public, max-age=31536000")
        .header("Cross-Origin-Resource-Policy", "cross-origin");

    builder = match artifact.range {
        Some(range) => builder
            .status(StatusCode::PARTIAL_CONTENT)
            .header(header::CONTENT_RANGE, range.content_range(artifact.total_len)),
        None => builder.status(StatusCode::OK),
    };

    builder
        .body(Body::from(artifact.bytes))
        .map_err(|e| ApiError::internal(format!("Failed to build response: {}", e)))
}
