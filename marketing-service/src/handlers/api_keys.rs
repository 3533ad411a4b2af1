//! API key administration, guarded by the master key.

use super::{bad_request, not_found, present, take_id};
use crate::models::{ApiKey, ApiKeyStatus, RateLimit};
use crate::services::{api_keys, audit};
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
use validator::Validate;

const ADMIN_ACTOR: &str = "admin";
const DEFAULT_EXPIRY_DAYS: i64 = 365;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateKeyRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub permissions: Option<Vec<String>>,
    #[validate(range(min = 1, max = 3650))]
    pub expires_in_days: Option<i64>,
    pub rate_limit: Option<RateLimit>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListKeysQuery {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevokeKeyRequest {
    pub key_id: Option<String>,
    pub reason: Option<String>,
}

/// Mints a key. The secret is only ever returned from here.
pub async fn create_key(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateKeyRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    payload.validate()?;
    let name = present(payload.name).ok_or_else(|| bad_request("Missing required field: name"))?;

    let now = Utc::now();
    let secret = api_keys::generate_secret();
    let key = ApiKey {
        key_id: api_keys::new_key_id(),
        key_hash: api_keys::hash_secret(&secret),
        name,
        description: payload.description.unwrap_or_default(),
        status: ApiKeyStatus::Active,
        permissions: payload
            .permissions
            .unwrap_or_else(|| vec!["content:read".to_string()]),
        rate_limit: payload.rate_limit.unwrap_or_default(),
        ip_whitelist: Vec::new(),
        created_by: ADMIN_ACTOR.to_string(),
        created_at: now,
        updated_at: None,
        last_used_at: None,
        expires_at: now + Duration::days(payload.expires_in_days.unwrap_or(DEFAULT_EXPIRY_DAYS)),
        revoked_at: None,
        revoke_reason: None,
    };

    state.db.insert_api_key(&key).await?;
    tracing::info!(key_id = %key.key_id, name = %key.name, "API key created");

    audit::record(
        &state.db,
        "api_key_created",
        ADMIN_ACTOR,
        &key.key_id,
        json!({ "name": key.name, "permissions": key.permissions }),
        audit::AUDIT_RETENTION_DAYS,
    )
    .await;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "keyId": key.key_id,
            "apiKey": secret,
            "expiresAt": time_format::format(&key.expires_at),
            "key": key.redacted()?,
            "warning": "Store this API key securely. It will not be shown again."
        })),
    ))
}

pub async fn list_keys(
    State(state): State<AppState>,
    Query(query): Query<ListKeysQuery>,
) -> Result<Json<Value>, AppError> {
    let status = present(query.status).unwrap_or_else(|| ApiKeyStatus::Active.as_str().to_string());
    let keys = state.db.list_api_keys(&status).await?;
    let items = keys
        .iter()
        .map(ApiKey::redacted)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(json!({ "count": items.len(), "items": items })))
}

pub async fn revoke_key(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RevokeKeyRequest>,
) -> Result<Json<Value>, AppError> {
    let key_id = present(payload.key_id).ok_or_else(|| bad_request("Missing keyId"))?;
    let reason = present(payload.reason).unwrap_or_else(|| "Revoked by administrator".to_string());

    let now = time_format::now();
    let set = doc! {
        "status": ApiKeyStatus::Revoked.as_str(),
        "revokedAt": now.as_str(),
        "revokeReason": reason.as_str(),
        "updatedAt": now.as_str(),
    };
    if !state.db.set_api_key_fields(&key_id, set).await? {
        return Err(not_found("API key not found"));
    }
    tracing::info!(key_id = %key_id, "API key revoked");

    audit::record(
        &state.db,
        "api_key_revoked",
        ADMIN_ACTOR,
        &key_id,
        json!({ "reason": reason }),
        audit::AUDIT_RETENTION_DAYS,
    )
    .await;

    Ok(Json(json!({ "success": true, "keyId": key_id, "status": "revoked" })))
}

pub async fn update_key(
    State(state): State<AppState>,
    AppJson(body): AppJson<Map<String, Value>>,
) -> Result<Json<Value>, AppError> {
    let (key_id, mut fields) = take_id(body, "keyId")?;
    let current = state
        .db
        .find_api_key(&key_id)
        .await?
        .ok_or_else(|| not_found("API key not found"))?;

    fields.insert("updatedAt".to_string(), Value::String(time_format::now()));
    let update = store::merge_fields(&current, &fields, &ApiKey::IMMUTABLE_FIELDS)?;
    if !state.db.set_api_key_fields(&key_id, update.set).await? {
        return Err(not_found("API key not found"));
    }

    let changed: Vec<&String> = fields.keys().filter(|k| *k != "updatedAt").collect();
    audit::record(
        &state.db,
        "api_key_updated",
        ADMIN_ACTOR,
        &key_id,
        json!({ "fields": changed }),
        audit::AUDIT_RETENTION_DAYS,
    )
    .await;

    Ok(Json(json!({ "success": true, "keyId": key_id })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expiry_outside_range_is_rejected() {
        let request: CreateKeyRequest =
            serde_json::from_value(json!({ "name": "agent", "expiresInDays": 0 })).unwrap();
        assert!(request.validate().is_err());

        let request: CreateKeyRequest =
            serde_json::from_value(json!({ "name": "agent", "expiresInDays": 90 })).unwrap();
        assert!(request.validate().is_ok());
    }
}
