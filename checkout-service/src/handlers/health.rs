use crate::startup::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse};
use service_core::routes::health_response;

pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    health_response(
        "checkout-service",
        env!("CARGO_PKG_VERSION"),
        state.db.health_check().await,
    )
}

pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.db.health_check().await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}
