//! Prometheus metrics for the API server.

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::time::Instant;

/// Install the Prometheus recorder and return a handle for `/metrics`.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "starvid_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "starvid_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "starvid_http_requests_in_flight";

    // Job metrics
    pub const JOBS_SUBMITTED_TOTAL: &str = "starvid_jobs_submitted_total";
    pub const STALE_JOBS_RECOVERED_TOTAL: &str = "starvid_stale_jobs_recovered_total";
    pub const QUEUE_LENGTH: &str = "starvid_queue_length";

    pub const RATE_LIMIT_HITS_TOTAL: &str = "starvid_rate_limit_hits_total";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

pub fn record_job_submitted() {
    counter!(names::JOBS_SUBMITTED_TOTAL).increment(1);
}

pub fn record_stale_job_recovered() {
    counter!(names::STALE_JOBS_RECOVERED_TOTAL).increment(1);
}

/// Update queue length gauge.
pub fn set_queue_length(length: u64) {
    gauge!(names::QUEUE_LENGTH).set(length as f64);
}

/// Record rate limit hit.
pub fn record_rate_limit_hit(endpoint: &str) {
    let labels = [("endpoint", endpoint.to_string())];
    counter!(names::RATE_LIMIT_HITS_TOTAL, &labels).increment(1);
}

fn replace(path: &str, pattern: &str, replacement: &str) -> String {
    match regex_lite::Regex::new(pattern) {
        Ok(re) => re.replace_all(path, replacement).into_owned(),
        Err(_) => path.to_string(),
    }
}

/// Collapse path parameters so labels stay low-cardinality.
fn sanitize_path(path: &str) -> String {
    let path = replace(path, r"^/api/github/jobs/[^/]+$", "/api/github/jobs/:job_id");
    let path = replace(
        &path,
        r"^/api/github/stars/[^/]+/[^/]+$",
        "/api/github/stars/:owner/:repo",
    );
    replace(&path, r"^/videos/[^/]+$", "/videos/:filename")
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);

    let response = next.run(request).await;

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    let duration = start.elapsed().as_secs_f64();

    record_http_request(&method, &path, status, duration);

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_path() {
        assert_eq!(
            sanitize_path("/api/github/jobs/octocat-Hello-World-1700000000000"),
            "/api/github/jobs/:job_id"
        );
        assert_eq!(
            sanitize_path("/api/github/stars/octocat/Hello-World"),
            "/api/github/stars/:owner/:repo"
        );
        assert_eq!(sanitize_path("/videos/a-b-1.mp4"), "/videos/:filename");
        assert_eq!(sanitize_path("/api/github/stars"), "/api/github/stars");
        assert_eq!(sanitize_path("/health"), "/health");
    }
}
