//! Campaign CRUD.

use super::{bad_request, not_found, parse_timestamp, present, take_id};
use crate::middleware::CurrentApiKey;
use crate::models::{
    campaign_id_for, Assets, Budget, Campaign, CampaignAnalytics, CampaignStatus, CampaignType,
    ContentSchedule, Goals, TargetAudience,
};
use crate::services::audit;
use crate::startup::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use mongodb::bson::doc;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use service_core::error::AppError;
use service_core::extract::AppJson;
use service_core::{store, time_format};

const DEFAULT_LIST_LIMIT: i64 = 50;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCampaignRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub campaign_type: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub landing_page_url: Option<String>,
    pub target_audience: Option<TargetAudience>,
    pub budget: Option<Budget>,
    pub goals: Option<Goals>,
    pub content_schedule: Option<ContentSchedule>,
    pub assets: Option<Assets>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCampaignsQuery {
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub campaign_type: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignIdQuery {
    pub campaign_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignIdRequest {
    pub campaign_id: Option<String>,
}

fn parse_campaign_type(raw: &str) -> Result<CampaignType, AppError> {
    serde_json::from_value(Value::String(raw.to_string()))
        .map_err(|_| bad_request(format!("Invalid campaign type: {}", raw)))
}

pub async fn create_campaign(
    State(state): State<AppState>,
    CurrentApiKey(caller): CurrentApiKey,
    AppJson(payload): AppJson<CreateCampaignRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let (name, description, raw_type) = match (
        present(payload.name),
        present(payload.description),
        present(payload.campaign_type),
    ) {
        (Some(name), Some(description), Some(raw_type)) => (name, description, raw_type),
        _ => return Err(bad_request("Missing required fields: name, description, type")),
    };
    let campaign_type = parse_campaign_type(&raw_type)?;

    let now = Utc::now();
    let start_date = match payload.start_date.as_deref() {
        Some(raw) => parse_timestamp(raw, "startDate")?,
        None => now,
    };
    let end_date = payload
        .end_date
        .as_deref()
        .map(|raw| parse_timestamp(raw, "endDate"))
        .transpose()?;

    let campaign_id = campaign_id_for(&name);
    let landing_page_url = present(payload.landing_page_url).unwrap_or_else(|| {
        format!(
            "{}/{}/",
            state.config.landing_base_url.trim_end_matches('/'),
            campaign_id
        )
    });

    let campaign = Campaign {
        campaign_id: campaign_id.clone(),
        name,
        description,
        campaign_type,
        status: CampaignStatus::Draft,
        start_date,
        end_date,
        landing_page_url,
        target_audience: payload.target_audience.unwrap_or_default(),
        budget: payload.budget.unwrap_or_default(),
        goals: payload.goals.unwrap_or_default(),
        assets: payload.assets.unwrap_or_default(),
        content_schedule: payload.content_schedule.unwrap_or_default(),
        analytics: CampaignAnalytics::default(),
        created_by: caller.key_id.clone(),
        created_at: now,
        updated_at: now,
        archived_at: None,
        activated_at: None,
    };

    state.db.insert_campaign(&campaign).await?;
    tracing::info!(campaign_id = %campaign_id, "Campaign created");

    audit::record(
        &state.db,
        "campaign_created",
        &caller.key_id,
        &campaign_id,
        json!({ "name": campaign.name, "type": raw_type }),
        audit::AUDIT_RETENTION_DAYS,
    )
    .await;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "campaign": campaign })),
    ))
}

pub async fn list_campaigns(
    State(state): State<AppState>,
    Query(query): Query<ListCampaignsQuery>,
) -> Result<Json<Value>, AppError> {
    let limit = query.limit.filter(|l| *l > 0).unwrap_or(DEFAULT_LIST_LIMIT);
    let items = state
        .db
        .list_campaigns(
            present(query.status).as_deref(),
            present(query.campaign_type).as_deref(),
            limit,
        )
        .await?;

    Ok(Json(json!({ "count": items.len(), "items": items })))
}

pub async fn get_campaign(
    State(state): State<AppState>,
    Query(query): Query<CampaignIdQuery>,
) -> Result<Json<Campaign>, AppError> {
    let campaign_id = present(query.campaign_id).ok_or_else(|| bad_request("Missing campaignId"))?;
    let campaign = state
        .db
        .find_campaign(&campaign_id)
        .await?
        .ok_or_else(|| not_found("Campaign not found"))?;
    Ok(Json(campaign))
}

pub async fn update_campaign(
    State(state): State<AppState>,
    CurrentApiKey(caller): CurrentApiKey,
    AppJson(body): AppJson<Map<String, Value>>,
) -> Result<Json<Value>, AppError> {
    let (campaign_id, fields) = take_id(body, "campaignId")?;
    let current = state
        .db
        .find_campaign(&campaign_id)
        .await?
        .ok_or_else(|| not_found("Campaign not found"))?;

    let mut fields = fields;
    fields.insert(
        "updatedAt".to_string(),
        Value::String(time_format::format(&Utc::now())),
    );
    let update = store::merge_fields(&current, &fields, &Campaign::IMMUTABLE_FIELDS)?;

    if !state.db.set_campaign_fields(&campaign_id, update.set).await? {
        return Err(not_found("Campaign not found"));
    }

    let updated: Vec<&String> = fields.keys().filter(|k| *k != "updatedAt").collect();
    audit::record(
        &state.db,
        "campaign_updated",
        &caller.key_id,
        &campaign_id,
        json!({ "fields": updated }),
        audit::AUDIT_RETENTION_DAYS,
    )
    .await;

    Ok(Json(json!({ "success": true, "campaignId": campaign_id })))
}

pub async fn archive_campaign(
    state: State<AppState>,
    caller: CurrentApiKey,
    AppJson(payload): AppJson<CampaignIdRequest>,
) -> Result<Json<Value>, AppError> {
    set_status(state, caller, payload, CampaignStatus::Archived).await
}

pub async fn activate_campaign(
    state: State<AppState>,
    caller: CurrentApiKey,
    AppJson(payload): AppJson<CampaignIdRequest>,
) -> Result<Json<Value>, AppError> {
    set_status(state, caller, payload, CampaignStatus::Active).await
}

async fn set_status(
    State(state): State<AppState>,
    CurrentApiKey(caller): CurrentApiKey,
    payload: CampaignIdRequest,
    status: CampaignStatus,
) -> Result<Json<Value>, AppError> {
    let campaign_id =
        present(payload.campaign_id).ok_or_else(|| bad_request("Missing campaignId"))?;

    let now = time_format::now();
    let mut set = doc! { "status": status.as_str(), "updatedAt": now.as_str() };
    let action = match status {
        CampaignStatus::Archived => {
            set.insert("archivedAt", now.as_str());
            "campaign_archived"
        }
        _ => {
            set.insert("activatedAt", now.as_str());
            "campaign_activated"
        }
    };

    if !state.db.set_campaign_fields(&campaign_id, set).await? {
        return Err(not_found("Campaign not found"));
    }
    tracing::info!(campaign_id = %campaign_id, status = status.as_str(), "Campaign status changed");

    audit::record(
        &state.db,
        action,
        &caller.key_id,
        &campaign_id,
        json!({}),
        audit::AUDIT_RETENTION_DAYS,
    )
    .await;

    Ok(Json(json!({
        "success": true,
        "campaignId": campaign_id,
        "status": status.as_str()
    })))
}
