//! Stripe Checkout session creation and verification.

use super::{bad_request, present};
use crate::models::CheckoutCampaign;
use crate::services::fulfilment;
use crate::services::stripe::SessionRequest;
use crate::startup::AppState;
use axum::{extract::State, Json};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use service_core::error::AppError;
use service_core::extract::AppJson;
use validator::Validate;

const DEFAULT_CURRENCY: &str = "AUD";

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCheckoutRequest {
    pub campaign_id: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub amount: Option<f64>,
    pub currency: Option<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    pub success_url: Option<String>,
    pub cancel_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    pub session_id: Option<String>,
}

/// Major units to cents, rounding half away from zero.
pub fn to_minor_units(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

pub async fn create_checkout(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateCheckoutRequest>,
) -> Result<Json<Value>, AppError> {
    payload.validate()?;
    let (campaign_id, email, amount) = match (
        present(payload.campaign_id),
        present(payload.email),
        payload.amount,
    ) {
        (Some(campaign_id), Some(email), Some(amount)) => (campaign_id, email, amount),
        _ => return Err(bad_request("Missing required fields: campaignId, email, amount")),
    };
    if !amount.is_finite() || amount <= 0.0 {
        return Err(bad_request("Amount must be greater than zero"));
    }
    let currency = present(payload.currency).unwrap_or_else(|| DEFAULT_CURRENCY.to_string());

    let mut metadata = payload.metadata;
    metadata.insert("campaignId".to_string(), Value::String(campaign_id.clone()));
    fulfilment::create_pending_record(
        &state.db,
        &campaign_id,
        &email,
        amount,
        &mut metadata,
        Utc::now(),
    )
    .await?;

    let frontend = state.config.frontend_url.trim_end_matches('/');
    let request = SessionRequest {
        product_name: CheckoutCampaign::product_name(&campaign_id).to_string(),
        product_description: CheckoutCampaign::product_description(&campaign_id).to_string(),
        campaign_id: campaign_id.clone(),
        unit_amount: to_minor_units(amount),
        currency: currency.to_lowercase(),
        customer_email: email,
        metadata,
        success_url: present(payload.success_url).unwrap_or_else(|| {
            format!(
                "{}/{}/thank-you.html?session_id={{CHECKOUT_SESSION_ID}}",
                frontend, campaign_id
            )
        }),
        cancel_url: present(payload.cancel_url)
            .unwrap_or_else(|| format!("{}/{}/", frontend, campaign_id)),
    };

    let session = state.stripe.create_session(&request).await.map_err(|e| {
        tracing::error!(campaign_id = %campaign_id, "Checkout session creation failed: {}", e);
        AppError::InternalError(e)
    })?;
    metrics::counter!("checkout_sessions_created_total", "campaign" => campaign_id).increment(1);

    Ok(Json(json!({
        "sessionId": session.id,
        "checkoutUrl": session.url
    })))
}

pub async fn verify_checkout(
    State(state): State<AppState>,
    AppJson(payload): AppJson<VerifyRequest>,
) -> Result<Json<Value>, AppError> {
    let session_id = present(payload.session_id).ok_or_else(|| bad_request("Missing sessionId"))?;
    let session = state
        .stripe
        .retrieve_session(&session_id)
        .await
        .map_err(AppError::InternalError)?;

    Ok(Json(json!({
        "status": session.status,
        "paymentStatus": session.payment_status,
        "customerEmail": session.customer_email,
        "amountTotal": session.amount_total.map(|cents| cents as f64 / 100.0),
        "currency": session.currency.as_deref().map(str::to_uppercase),
        "metadata": session.metadata
    })))
}
