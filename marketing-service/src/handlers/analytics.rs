use crate::services::analytics::{self, CollectionSummary};
use crate::startup::AppState;
use axum::{extract::State, Json};
use chrono::Utc;
use serde::Deserialize;
use service_core::error::AppError;

const DEFAULT_COLLECTION_DAYS: i64 = 30;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectRequest {
    pub days: Option<i64>,
}

/// Pulls Facebook insights for recently published content. The body is optional.
pub async fn collect_analytics(
    State(state): State<AppState>,
    payload: Option<Json<CollectRequest>>,
) -> Result<Json<CollectionSummary>, AppError> {
    let days = payload
        .and_then(|Json(request)| request.days)
        .filter(|days| *days > 0)
        .unwrap_or(DEFAULT_COLLECTION_DAYS);

    let summary = analytics::collect(&state.db, &state.graph, days, Utc::now()).await?;
    Ok(Json(summary))
}
