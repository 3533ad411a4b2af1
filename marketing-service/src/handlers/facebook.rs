//! Facebook publishing, scheduling and social target management.

use super::{bad_request, not_found, parse_timestamp, present, take_id};
use crate::middleware::CurrentApiKey;
use crate::models::social_target::{TargetAudience as SocialAudience, DEFAULT_TOKEN_MARKER};
use crate::models::{
    ContentStatus, PostingSchedule, SocialTarget, TargetCredentials, TargetPerformance,
    TargetStatus, TargetType,
};
use crate::services::{audit, publishing};
use crate::startup::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::{Duration, Utc};
use mongodb::bson::doc;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use service_core::error::AppError;
use service_core::extract::AppJson;
use service_core::{store, time_format};

/// Lifetime assumed for a freshly stored access token.
const TOKEN_LIFETIME_DAYS: i64 = 60;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishRequest {
    pub content_id: Option<String>,
    pub target_ids: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRequest {
    pub content_id: Option<String>,
    pub scheduled_at: Option<String>,
    pub target_group_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsQuery {
    pub content_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTargetsQuery {
    pub platform: Option<String>,
    #[serde(rename = "type")]
    pub target_type: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddTargetRequest {
    pub platform: Option<String>,
    #[serde(rename = "type")]
    pub target_type: Option<String>,
    pub name: Option<String>,
    pub external_id: Option<String>,
    pub url: Option<String>,
    pub access_token: Option<String>,
    pub audience: Option<SocialAudience>,
    pub posting_schedule: Option<PostingSchedule>,
}

pub async fn publish_content(
    State(state): State<AppState>,
    AppJson(payload): AppJson<PublishRequest>,
) -> Result<Json<publishing::PublishOutcome>, AppError> {
    let content_id = present(payload.content_id).ok_or_else(|| bad_request("Missing contentId"))?;
    let content = state
        .db
        .find_content(&content_id)
        .await?
        .ok_or_else(|| not_found("Content not found"))?;

    let outcome = publishing::publish(
        &state.db,
        &state.graph,
        &content,
        payload.target_ids.as_deref(),
        Utc::now(),
    )
    .await?;
    metrics::counter!("marketing_posts_published_total").increment(outcome.success_count as u64);

    Ok(Json(outcome))
}

pub async fn schedule_content(
    State(state): State<AppState>,
    CurrentApiKey(caller): CurrentApiKey,
    AppJson(payload): AppJson<ScheduleRequest>,
) -> Result<Json<Value>, AppError> {
    let (content_id, raw_scheduled_at) =
        match (present(payload.content_id), present(payload.scheduled_at)) {
            (Some(content_id), Some(raw)) => (content_id, raw),
            _ => return Err(bad_request("Missing required fields: contentId, scheduledAt")),
        };
    let scheduled_at = time_format::format(&parse_timestamp(&raw_scheduled_at, "scheduledAt")?);

    let mut set = doc! {
        "status": ContentStatus::Scheduled.as_str(),
        "scheduledAt": scheduled_at.as_str(),
        "updatedAt": time_format::now(),
    };
    if let Some(group) = present(payload.target_group_id) {
        set.insert("targetGroupId", group);
    }

    if !state.db.set_content_fields(&content_id, set).await? {
        return Err(not_found("Content not found"));
    }

    audit::record(
        &state.db,
        "content_scheduled",
        &caller.key_id,
        &content_id,
        json!({ "scheduledAt": scheduled_at }),
        audit::AUDIT_RETENTION_DAYS,
    )
    .await;

    Ok(Json(json!({
        "success": true,
        "contentId": content_id,
        "scheduledAt": scheduled_at
    })))
}

/// Current totals for a content item plus its daily snapshots and
/// publishing history.
pub async fn content_analytics(
    State(state): State<AppState>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<Value>, AppError> {
    let content_id = present(query.content_id).ok_or_else(|| bad_request("Missing contentId"))?;
    let content = state
        .db
        .find_content(&content_id)
        .await?
        .ok_or_else(|| not_found("Content not found"))?;

    let daily = state.db.analytics_for_content(&content_id).await?;
    let history = state.db.publish_history(&content_id).await?;

    Ok(Json(json!({
        "contentId": content_id,
        "analytics": content.analytics,
        "daily": daily,
        "history": history,
        "count": history.len()
    })))
}

pub async fn list_targets(
    State(state): State<AppState>,
    Query(query): Query<ListTargetsQuery>,
) -> Result<Json<Value>, AppError> {
    let platform = present(query.platform).unwrap_or_else(|| "facebook".to_string());
    let status = present(query.status).unwrap_or_else(|| "active".to_string());
    let targets = state
        .db
        .list_targets(&platform, &status, present(query.target_type).as_deref())
        .await?;

    let items = targets
        .iter()
        .map(SocialTarget::redacted)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(json!({ "count": items.len(), "items": items })))
}

fn parse_target_type(raw: &str) -> Result<TargetType, AppError> {
    serde_json::from_value(Value::String(raw.to_string()))
        .map_err(|_| bad_request(format!("Invalid target type: {}", raw)))
}

fn new_target_id(platform: &str, target_type: TargetType) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("target_{}_{}_{}", platform, target_type.as_str(), &suffix[..8])
}

pub async fn add_target(
    State(state): State<AppState>,
    CurrentApiKey(caller): CurrentApiKey,
    AppJson(payload): AppJson<AddTargetRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let (platform, raw_type, name, external_id) = match (
        present(payload.platform),
        present(payload.target_type),
        present(payload.name),
        present(payload.external_id),
    ) {
        (Some(platform), Some(raw_type), Some(name), Some(external_id)) => {
            (platform, raw_type, name, external_id)
        }
        _ => {
            return Err(bad_request(
                "Missing required fields: platform, type, name, externalId",
            ))
        }
    };
    let target_type = parse_target_type(&raw_type)?;

    let now = Utc::now();
    let target = SocialTarget {
        target_id: new_target_id(&platform, target_type),
        platform,
        target_type,
        name,
        external_id,
        url: present(payload.url),
        status: TargetStatus::Active,
        credentials: TargetCredentials {
            access_token: present(payload.access_token)
                .unwrap_or_else(|| DEFAULT_TOKEN_MARKER.to_string()),
            token_expiry: now + Duration::days(TOKEN_LIFETIME_DAYS),
            permissions: vec!["publish_to_groups".to_string(), "read_insights".to_string()],
        },
        posting_schedule: payload.posting_schedule.unwrap_or_default(),
        audience: payload.audience.unwrap_or_default(),
        performance: TargetPerformance::default(),
        last_posted_at: None,
        created_at: now,
        updated_at: now,
    };

    state.db.insert_target(&target).await?;
    tracing::info!(target_id = %target.target_id, "Social target added");

    audit::record(
        &state.db,
        "target_added",
        &caller.key_id,
        &target.target_id,
        json!({ "platform": target.platform, "type": target_type.as_str() }),
        audit::AUDIT_RETENTION_DAYS,
    )
    .await;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "target": target.redacted()? })),
    ))
}

pub async fn update_target(
    State(state): State<AppState>,
    CurrentApiKey(caller): CurrentApiKey,
    AppJson(body): AppJson<Map<String, Value>>,
) -> Result<Json<Value>, AppError> {
    let (target_id, mut fields) = take_id(body, "targetId")?;
    let current = state
        .db
        .find_target(&target_id)
        .await?
        .ok_or_else(|| not_found("Target not found"))?;

    fields.insert("updatedAt".to_string(), Value::String(time_format::now()));
    let update = store::merge_fields(&current, &fields, &SocialTarget::IMMUTABLE_FIELDS)?;
    if !state.db.set_target_fields(&target_id, update.set).await? {
        return Err(not_found("Target not found"));
    }

    audit::record(
        &state.db,
        "target_updated",
        &caller.key_id,
        &target_id,
        json!({}),
        audit::AUDIT_RETENTION_DAYS,
    )
    .await;

    Ok(Json(json!({ "success": true, "targetId": target_id })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_ids_embed_platform_and_type() {
        let id = new_target_id("facebook", TargetType::Group);
        assert!(id.starts_with("target_facebook_group_"));
        assert_eq!(id.len(), "target_facebook_group_".len() + 8);
    }

    #[test]
    fn target_type_rejects_unknown_values() {
        assert_eq!(parse_target_type("page").unwrap(), TargetType::Page);
        assert!(parse_target_type("channel").is_err());
    }
}
