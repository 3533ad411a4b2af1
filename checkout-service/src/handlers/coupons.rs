//! Coupon validation for checkout and coupon administration.

use super::{bad_request, present};
use crate::models::{Coupon, DiscountType};
use crate::services::pricing;
use crate::startup::AppState;
use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use service_core::error::AppError;
use service_core::extract::AppJson;
use service_core::time_format;
use validator::Validate;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateCouponRequest {
    pub coupon_code: Option<String>,
    pub original_amount: Option<f64>,
    pub plan_type: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCouponRequest {
    #[validate(length(min = 3, max = 32))]
    pub code: String,
    pub discount_type: DiscountType,
    #[validate(range(min = 0.0))]
    pub discount_value: f64,
    #[validate(range(min = 0.0))]
    pub max_discount: Option<f64>,
    #[validate(range(min = 0.0))]
    pub min_purchase: Option<f64>,
    pub applicable_plans: Option<Vec<String>>,
    #[validate(range(min = 1))]
    pub max_redemptions: Option<u32>,
    pub expires_at: Option<String>,
}

fn invalid(message: &str) -> Json<Value> {
    Json(json!({ "valid": false, "message": message }))
}

/// Quotes a coupon against an amount. Unusable coupons are a 200 with
/// `valid: false`, not an error.
pub async fn validate_coupon(
    State(state): State<AppState>,
    AppJson(payload): AppJson<ValidateCouponRequest>,
) -> Result<Json<Value>, AppError> {
    let (code, original_amount) = match (present(payload.coupon_code), payload.original_amount) {
        (Some(code), Some(amount)) => (code.trim().to_uppercase(), amount),
        _ => return Err(bad_request("Missing required fields: couponCode, originalAmount")),
    };
    let plan_type = present(payload.plan_type);

    let Some(coupon) = state.db.find_coupon(&code).await? else {
        tracing::info!(coupon = %code, "Unknown coupon code");
        return Ok(invalid("Invalid coupon code"));
    };
    if let Some(reason) = coupon.rejection(plan_type.as_deref(), Utc::now()) {
        tracing::info!(coupon = %code, reason, "Coupon rejected");
        return Ok(invalid(reason));
    }

    let quote = match pricing::discount(
        original_amount,
        coupon.discount_type,
        coupon.discount_value,
        coupon.max_discount,
        coupon.min_purchase,
    ) {
        Ok(quote) => quote,
        Err(e) => return Ok(invalid(&e.to_string())),
    };

    let message = match coupon.discount_type {
        DiscountType::Percentage => format!("Coupon applied: {}% off", coupon.discount_value),
        DiscountType::FixedAmount => format!("Coupon applied: ${:.2} off", quote.discount_amount),
    };

    Ok(Json(json!({
        "valid": true,
        "code": coupon.code,
        "discountType": quote.discount_type,
        "discountValue": quote.discount_value,
        "discountAmount": quote.discount_amount,
        "originalPrice": quote.original_price,
        "finalPrice": quote.final_price,
        "savingsPercent": quote.savings_percent,
        "message": message
    })))
}

pub async fn create_coupon(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateCouponRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    payload.validate()?;
    if payload.discount_type == DiscountType::Percentage && payload.discount_value > 100.0 {
        return Err(bad_request("Percentage discounts cannot exceed 100"));
    }
    let expires_at = payload
        .expires_at
        .as_deref()
        .map(|raw| {
            time_format::parse(raw).map_err(|_| bad_request(format!("Invalid expiresAt: {}", raw)))
        })
        .transpose()?;

    let coupon = Coupon {
        code: payload.code.trim().to_uppercase(),
        discount_type: payload.discount_type,
        discount_value: payload.discount_value,
        max_discount: payload.max_discount,
        min_purchase: payload.min_purchase.unwrap_or_default(),
        applicable_plans: payload.applicable_plans.unwrap_or_default(),
        max_redemptions: payload.max_redemptions,
        redemptions: 0,
        active: true,
        expires_at,
        created_at: Utc::now(),
    };

    state.db.insert_coupon(&coupon).await?;
    tracing::info!(
        coupon = %coupon.code,
        discount_type = coupon.discount_type.as_str(),
        "Coupon created"
    );

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "coupon": coupon })),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coupon_requests_are_validated() {
        let request: CreateCouponRequest = serde_json::from_value(json!({
            "code": "SAVE20",
            "discountType": "percentage",
            "discountValue": 20
        }))
        .unwrap();
        assert!(request.validate().is_ok());

        let request: CreateCouponRequest = serde_json::from_value(json!({
            "code": "X",
            "discountType": "fixed_amount",
            "discountValue": -5
        }))
        .unwrap();
        assert!(request.validate().is_err());
    }
}
