use crate::services::DashboardStats;
use crate::startup::AppState;
use axum::{extract::State, Json};
use chrono::Utc;
use service_core::error::AppError;

pub async fn dashboard_stats(
    State(state): State<AppState>,
) -> Result<Json<DashboardStats>, AppError> {
    let stats = state.db.dashboard_stats(Utc::now()).await?;
    Ok(Json(stats))
}
