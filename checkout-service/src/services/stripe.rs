//! Stripe client.
//!
//! Creates and retrieves Checkout Sessions over the form-encoded REST API and
//! verifies `Stripe-Signature` headers on webhooks.

use crate::config::StripeConfig;
use anyhow::{anyhow, Result};
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::{Map, Value};
use service_core::utils::verify_hex_signature;
use std::time::Duration;
use thiserror::Error;

#[derive(Clone)]
pub struct StripeClient {
    client: Client,
    config: StripeConfig,
}

/// What to sell in a single-item checkout.
#[derive(Debug, Clone)]
pub struct SessionRequest {
    pub product_name: String,
    pub product_description: String,
    pub campaign_id: String,
    /// Smallest currency unit.
    pub unit_amount: i64,
    /// Lower-case ISO code.
    pub currency: String,
    pub customer_email: String,
    pub metadata: Map<String, Value>,
    pub success_url: String,
    pub cancel_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub payment_status: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub amount_total: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl CheckoutSession {
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata
            .get(key)
            .and_then(Value::as_str)
            .filter(|v| !v.is_empty())
    }
}

#[derive(Debug, Deserialize)]
pub struct StripeEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: EventData,
}

#[derive(Debug, Deserialize)]
pub struct EventData {
    pub object: Value,
}

#[derive(Debug, Deserialize)]
struct StripeError {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    message: String,
    #[serde(default, rename = "type")]
    kind: Option<String>,
}

#[derive(Debug, Error, PartialEq)]
pub enum SignatureError {
    #[error("Malformed signature header")]
    Malformed,
    #[error("Timestamp outside the tolerance zone")]
    Expired,
    #[error("No signatures found matching the expected signature for payload")]
    Mismatch,
}

impl StripeClient {
    pub fn new(config: StripeConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self { client, config }
    }

    pub async fn create_session(&self, request: &SessionRequest) -> Result<CheckoutSession> {
        let url = format!("{}/v1/checkout/sessions", self.config.api_base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(self.config.secret_key.expose_secret())
            .form(&session_form(request))
            .send()
            .await?;

        let session = parse_response(response, "create checkout session").await?;
        tracing::info!(
            session_id = %session.id,
            campaign_id = %request.campaign_id,
            amount = request.unit_amount,
            "Stripe checkout session created"
        );
        Ok(session)
    }

    pub async fn retrieve_session(&self, session_id: &str) -> Result<CheckoutSession> {
        let url = format!(
            "{}/v1/checkout/sessions/{}",
            self.config.api_base_url, session_id
        );
        let response = self
            .client
            .get(&url)
            .bearer_auth(self.config.secret_key.expose_secret())
            .send()
            .await?;

        parse_response(response, "retrieve checkout session").await
    }

    /// Checks the header against the configured webhook secret at the
    /// current time.
    pub fn verify_webhook(&self, payload: &str, header: &str) -> Result<(), SignatureError> {
        verify_signature(
            self.config.webhook_secret.expose_secret(),
            payload,
            header,
            self.config.webhook_tolerance_secs,
            chrono::Utc::now().timestamp(),
        )
    }
}

async fn parse_response(response: reqwest::Response, operation: &str) -> Result<CheckoutSession> {
    let status = response.status();
    let body = response.text().await?;

    if status.is_success() {
        return Ok(serde_json::from_str(&body)?);
    }

    let message = serde_json::from_str::<StripeError>(&body)
        .map(|e| match e.error.kind {
            Some(kind) => format!("{} ({})", e.error.message, kind),
            None => e.error.message,
        })
        .unwrap_or(body);
    tracing::error!(status = %status, operation, "Stripe request failed: {}", message);
    Err(anyhow!("Stripe error: {}", message))
}

/// Flattens a session request into Stripe's bracketed form keys.
pub fn session_form(request: &SessionRequest) -> Vec<(String, String)> {
    let mut form = vec![
        ("payment_method_types[0]".to_string(), "card".to_string()),
        ("mode".to_string(), "payment".to_string()),
        ("success_url".to_string(), request.success_url.clone()),
        ("cancel_url".to_string(), request.cancel_url.clone()),
        ("customer_email".to_string(), request.customer_email.clone()),
        ("billing_address_collection".to_string(), "required".to_string()),
        ("line_items[0][quantity]".to_string(), "1".to_string()),
        (
            "line_items[0][price_data][currency]".to_string(),
            request.currency.clone(),
        ),
        (
            "line_items[0][price_data][unit_amount]".to_string(),
            request.unit_amount.to_string(),
        ),
        (
            "line_items[0][price_data][product_data][name]".to_string(),
            request.product_name.clone(),
        ),
        (
            "line_items[0][price_data][product_data][description]".to_string(),
            request.product_description.clone(),
        ),
        (
            "line_items[0][price_data][product_data][metadata][campaignId]".to_string(),
            request.campaign_id.clone(),
        ),
    ];

    for (key, value) in &request.metadata {
        let value = metadata_value(value);
        form.push((format!("metadata[{}]", key), value.clone()));
        form.push((format!("payment_intent_data[metadata][{}]", key), value));
    }
    form
}

/// Stripe metadata values are strings; anything else is sent as JSON text.
fn metadata_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Verifies a `t=...,v1=...` header: HMAC-SHA256 of `{t}.{payload}` must
/// match one of the `v1` signatures and `t` must be within `tolerance_secs`
/// of `now`.
pub fn verify_signature(
    secret: &str,
    payload: &str,
    header: &str,
    tolerance_secs: i64,
    now: i64,
) -> Result<(), SignatureError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse::<i64>().ok(),
            Some(("v1", value)) => signatures.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(SignatureError::Malformed)?;
    if signatures.is_empty() {
        return Err(SignatureError::Malformed);
    }

    let signed_payload = format!("{}.{}", timestamp, payload);
    let matched = signatures.iter().any(|signature| {
        verify_hex_signature(secret, &signed_payload, signature).unwrap_or(false)
    });
    if !matched {
        return Err(SignatureError::Mismatch);
    }
    if now.abs_diff(timestamp) > tolerance_secs.unsigned_abs() {
        return Err(SignatureError::Expired);
    }
    Ok(())
}
