use crate::models::{ApiKeyContext, ApiKeyStatus};
use crate::services::{api_keys, audit};
use crate::startup::AppState;
use chrono::Utc;
use mongodb::bson::doc;
use serde_json::json;
use service_core::{
    axum::{
        async_trait,
        extract::{FromRequestParts, Request, State},
        http::request::Parts,
        middleware::Next,
        response::Response,
    },
    error::AppError,
    time_format,
};

pub const API_KEY_HEADER: &str = "x-api-key";

/// Requires a valid `x-api-key` and attaches an [`ApiKeyContext`].
pub async fn api_key_auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let secret = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("Missing API key")))?;

    let key = state
        .db
        .find_api_key_by_hash(&api_keys::hash_secret(secret))
        .await?
        .ok_or_else(|| {
            tracing::warn!("Rejected unknown API key");
            AppError::Forbidden(anyhow::anyhow!("Invalid API key"))
        })?;

    let now = Utc::now();
    if key.status != ApiKeyStatus::Active {
        tracing::warn!(key_id = %key.key_id, "Rejected revoked API key");
        return Err(AppError::Forbidden(anyhow::anyhow!("API key revoked")));
    }
    if !key.is_usable(now) {
        tracing::warn!(key_id = %key.key_id, "Rejected expired API key");
        return Err(AppError::Forbidden(anyhow::anyhow!("API key expired")));
    }

    state
        .db
        .set_api_key_fields(&key.key_id, doc! { "lastUsedAt": time_format::format(&now) })
        .await?;

    state
        .rate_limiter
        .check(&key.key_id, key.rate_limit.requests_per_minute)?;

    audit::record(
        &state.db,
        "api_key_used",
        &key.key_id,
        &key.key_id,
        json!({ "method": req.method().as_str(), "path": req.uri().path() }),
        audit::KEY_USAGE_RETENTION_DAYS,
    )
    .await;

    req.extensions_mut().insert(ApiKeyContext {
        key_id: key.key_id,
        name: key.name,
        permissions: key.permissions,
    });

    Ok(next.run(req).await)
}

/// Extractor for the authenticated key.
pub struct CurrentApiKey(pub ApiKeyContext);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentApiKey
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let context = parts.extensions.get::<ApiKeyContext>().ok_or_else(|| {
            AppError::InternalError(anyhow::anyhow!(
                "API key context missing from request extensions"
            ))
        })?;

        Ok(CurrentApiKey(context.clone()))
    }
}
