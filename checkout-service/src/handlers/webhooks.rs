//! Stripe webhook receiver.

use super::bad_request;
use crate::services::fulfilment;
use crate::services::stripe::{CheckoutSession, StripeEvent};
use crate::startup::AppState;
use axum::{extract::State, http::HeaderMap, Json};
use chrono::Utc;
use serde_json::{json, Value};
use service_core::error::AppError;

pub const SIGNATURE_HEADER: &str = "stripe-signature";

/// Verifies the signature over the raw body, then dispatches on event type.
/// Any failure after verification is a 500 so Stripe retries.
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<Value>, AppError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| {
            tracing::error!("No Stripe signature found");
            bad_request("No signature")
        })?;

    state.stripe.verify_webhook(&body, signature).map_err(|e| {
        tracing::error!("Webhook signature verification failed: {}", e);
        bad_request("Invalid signature")
    })?;

    let event: StripeEvent = serde_json::from_str(&body).map_err(|e| {
        tracing::error!("Webhook payload is not a Stripe event: {}", e);
        bad_request("Invalid payload")
    })?;
    tracing::info!(event_id = %event.id, event_type = %event.event_type, "Webhook event received");
    metrics::counter!("checkout_webhook_events_total", "type" => event.event_type.clone())
        .increment(1);

    match event.event_type.as_str() {
        "checkout.session.completed" => {
            let session: CheckoutSession = serde_json::from_value(event.data.object)
                .map_err(|e| AppError::InternalError(anyhow::anyhow!("Invalid session: {}", e)))?;
            tracing::info!(session_id = %session.id, "Checkout completed");
            fulfilment::settle(&state.db, &session, Utc::now()).await?;
            fulfilment::send_confirmation(state.email.as_ref(), &session).await;
        }
        "payment_intent.succeeded" => {
            tracing::info!(object_id = ?event.data.object.get("id"), "Payment succeeded");
        }
        "payment_intent.payment_failed" => {
            tracing::warn!(object_id = ?event.data.object.get("id"), "Payment failed");
        }
        "charge.refunded" => {
            tracing::info!(object_id = ?event.data.object.get("id"), "Refund processed");
        }
        other => tracing::info!(event_type = other, "Unhandled event type"),
    }

    Ok(Json(json!({ "received": true })))
}
