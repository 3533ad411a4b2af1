//! AI content generation and the review workflow around it.

use super::{bad_request, not_found, parse_timestamp, present, take_id};
use crate::middleware::CurrentApiKey;
use crate::models::{
    Content, ContentAnalytics, ContentMetadata, ContentStatus, ContentType,
};
use crate::services::{audit, content_builder, ContentFilter, GenerationParams};
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

/// Generated content is reaped by the TTL index after this many days.
pub const CONTENT_RETENTION_DAYS: i64 = 180;

const DEFAULT_LIST_LIMIT: i64 = 50;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub campaign_id: Option<String>,
    #[serde(rename = "type")]
    pub content_type: Option<String>,
    pub template_id: Option<String>,
    pub custom_prompt: Option<String>,
    #[serde(default)]
    pub variables: Map<String, Value>,
    pub platform: Option<String>,
    pub scheduled_at: Option<String>,
    #[serde(default)]
    pub auto_publish: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListContentQuery {
    pub campaign_id: Option<String>,
    #[serde(rename = "type")]
    pub content_type: Option<String>,
    pub status: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentIdQuery {
    pub content_id: Option<String>,
}

/// Generates copy for a campaign with the configured model and stores it.
pub async fn generate_content(
    State(state): State<AppState>,
    CurrentApiKey(caller): CurrentApiKey,
    AppJson(payload): AppJson<GenerateContentRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let (campaign_id, raw_type) =
        match (present(payload.campaign_id), present(payload.content_type)) {
            (Some(campaign_id), Some(raw_type)) => (campaign_id, raw_type),
            _ => return Err(bad_request("Missing required fields: campaignId, type")),
        };
    let content_type = ContentType::parse(&raw_type)
        .ok_or_else(|| bad_request(format!("Invalid content type: {}", raw_type)))?;

    let scheduled_at = payload
        .scheduled_at
        .as_deref()
        .map(|raw| parse_timestamp(raw, "scheduledAt"))
        .transpose()?;

    let campaign = state
        .db
        .find_campaign(&campaign_id)
        .await?
        .ok_or_else(|| not_found("Campaign not found"))?;

    let template_id = present(payload.template_id);
    let template = match template_id.as_deref() {
        Some(id) => Some(
            state
                .db
                .find_template(id)
                .await?
                .ok_or_else(|| not_found("Template not found"))?,
        ),
        None => None,
    };

    let prompt = content_builder::build_prompt(
        &campaign,
        template.as_ref(),
        payload.custom_prompt.as_deref(),
        &payload.variables,
        content_type,
    );

    tracing::info!(
        campaign_id = %campaign_id,
        content_type = content_type.as_str(),
        model = state.provider.model(),
        "Generating content"
    );
    let params = GenerationParams {
        max_tokens: state.config.ai.max_tokens,
        ..GenerationParams::default()
    };
    let response = state.provider.generate(&prompt, &params).await.map_err(|e| {
        tracing::error!(campaign_id = %campaign_id, "Content generation failed: {}", e);
        AppError::from(e)
    })?;
    metrics::counter!("marketing_content_generated_total", "type" => content_type.as_str())
        .increment(1);

    let parsed = content_builder::parse_generated(&response.text, content_type);
    let platform = present(payload.platform).unwrap_or_else(|| "facebook".to_string());
    let cta_url = payload
        .variables
        .get("ctaUrl")
        .and_then(Value::as_str)
        .map(|url| content_builder::with_utm(url, &platform, content_type, &campaign_id));

    let status = if payload.auto_publish {
        ContentStatus::Published
    } else if scheduled_at.is_some() {
        ContentStatus::Scheduled
    } else {
        ContentStatus::Draft
    };

    let now = Utc::now();
    let content = Content {
        content_id: format!("content_{}", uuid::Uuid::new_v4()),
        content_type,
        campaign_id: campaign_id.clone(),
        title: parsed
            .title
            .unwrap_or_else(|| format!("{} for {}", content_type.as_str(), campaign.name)),
        body: parsed.body,
        status,
        platform,
        scheduled_at,
        published_at: None,
        published_posts: Vec::new(),
        target_group_id: None,
        metadata: ContentMetadata {
            word_count: parsed.word_count,
            has_images: false,
            hashtags: parsed.hashtags,
            tone: "professional".to_string(),
            template_id,
            ai_model: state.provider.model().to_string(),
            prompt_tokens: response.input_tokens,
            completion_tokens: response.output_tokens,
            variables: payload.variables,
            cta_url,
        },
        analytics: ContentAnalytics::default(),
        rejection_reason: None,
        reviewed_by: None,
        reviewed_at: None,
        archived_at: None,
        created_by: caller.key_id.clone(),
        created_at: now,
        updated_at: now,
    };

    state
        .db
        .insert_content(&content, now + Duration::days(CONTENT_RETENTION_DAYS))
        .await?;
    tracing::info!(content_id = %content.content_id, status = status.as_str(), "Content stored");

    audit::record(
        &state.db,
        "content_generated",
        &caller.key_id,
        &content.content_id,
        json!({
            "campaignId": campaign_id,
            "type": content_type.as_str(),
            "promptTokens": content.metadata.prompt_tokens,
            "completionTokens": content.metadata.completion_tokens
        }),
        audit::AUDIT_RETENTION_DAYS,
    )
    .await;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "contentId": content.content_id,
            "content": content
        })),
    ))
}

pub async fn list_content(
    State(state): State<AppState>,
    Query(query): Query<ListContentQuery>,
) -> Result<Json<Value>, AppError> {
    let filter = if let Some(id) = present(query.campaign_id) {
        ContentFilter::Campaign(id)
    } else if let Some(content_type) = present(query.content_type) {
        ContentFilter::Type(content_type)
    } else if let Some(status) = present(query.status) {
        ContentFilter::Status(status)
    } else {
        return Err(bad_request(
            "At least one filter required: campaignId, type, or status",
        ));
    };

    let limit = query.limit.filter(|l| *l > 0).unwrap_or(DEFAULT_LIST_LIMIT);
    let items = state.db.list_content(&filter, limit).await?;
    Ok(Json(json!({ "count": items.len(), "items": items })))
}

/// Every scheduled item whose time has come, oldest first and unpaged, so a
/// backlog of future posts never hides an overdue one.
pub async fn list_due_content(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let items = state.db.due_content(Utc::now()).await?;
    Ok(Json(json!({ "count": items.len(), "items": items })))
}

pub async fn get_content(
    State(state): State<AppState>,
    Query(query): Query<ContentIdQuery>,
) -> Result<Json<Content>, AppError> {
    let content_id = present(query.content_id).ok_or_else(|| bad_request("Missing contentId"))?;
    let content = state
        .db
        .find_content(&content_id)
        .await?
        .ok_or_else(|| not_found("Content not found"))?;
    Ok(Json(content))
}

/// Applies review decisions and edits. Approving or rejecting stamps
/// `reviewedAt` unless the caller supplies it.
pub async fn update_content(
    State(state): State<AppState>,
    CurrentApiKey(caller): CurrentApiKey,
    AppJson(body): AppJson<Map<String, Value>>,
) -> Result<Json<Value>, AppError> {
    let (content_id, mut fields) = take_id(body, "contentId")?;
    let current = state
        .db
        .find_content(&content_id)
        .await?
        .ok_or_else(|| not_found("Content not found"))?;

    let now = time_format::now();
    let reviewed = matches!(
        fields.get("status").and_then(Value::as_str),
        Some("approved") | Some("rejected")
    );
    if reviewed && !fields.contains_key("reviewedAt") {
        fields.insert("reviewedAt".to_string(), Value::String(now.clone()));
    }
    fields.insert("updatedAt".to_string(), Value::String(now));

    let update = store::merge_fields(&current, &fields, &Content::IMMUTABLE_FIELDS)?;
    if !state.db.set_content_fields(&content_id, update.set).await? {
        return Err(not_found("Content not found"));
    }

    audit::record(
        &state.db,
        "content_updated",
        &caller.key_id,
        &content_id,
        json!({ "status": update.record.status.as_str() }),
        audit::AUDIT_RETENTION_DAYS,
    )
    .await;

    Ok(Json(json!({
        "success": true,
        "contentId": content_id,
        "status": update.record.status.as_str()
    })))
}

/// Soft delete: the record stays until its TTL expires.
pub async fn delete_content(
    State(state): State<AppState>,
    CurrentApiKey(caller): CurrentApiKey,
    Query(query): Query<ContentIdQuery>,
) -> Result<Json<Value>, AppError> {
    let content_id = present(query.content_id).ok_or_else(|| bad_request("Missing contentId"))?;

    let now = time_format::now();
    let set = doc! {
        "status": ContentStatus::Archived.as_str(),
        "archivedAt": now.as_str(),
        "updatedAt": now.as_str(),
    };
    if !state.db.set_content_fields(&content_id, set).await? {
        return Err(not_found("Content not found"));
    }

    audit::record(
        &state.db,
        "content_archived",
        &caller.key_id,
        &content_id,
        json!({}),
        audit::AUDIT_RETENTION_DAYS,
    )
    .await;

    Ok(Json(json!({
        "success": true,
        "contentId": content_id,
        "status": ContentStatus::Archived.as_str()
    })))
}
