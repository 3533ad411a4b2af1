//! Handlers every service mounts unchanged.

use crate::error::AppError;
use crate::observability::render_metrics;
use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;

/// Liveness body `{status, service, version}`, or 503 when the dependency probe failed.
pub fn health_response(
    service: &'static str,
    version: &'static str,
    probe: Result<(), AppError>,
) -> impl IntoResponse {
    match probe {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "service": service,
                "version": version
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "unhealthy",
                "service": service,
                "error": e.to_string()
            })),
        ),
    }
}

/// Prometheus metrics endpoint.
pub async fn metrics_endpoint() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        render_metrics(),
    )
}

pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" })))
}
