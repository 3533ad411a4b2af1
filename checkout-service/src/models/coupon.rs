use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use service_core::time_format;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    Percentage,
    FixedAmount,
}

impl DiscountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscountType::Percentage => "percentage",
            DiscountType::FixedAmount => "fixed_amount",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    /// Always stored upper-cased.
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: f64,
    #[serde(default)]
    pub max_discount: Option<f64>,
    #[serde(default)]
    pub min_purchase: f64,
    /// Empty means every plan.
    #[serde(default)]
    pub applicable_plans: Vec<String>,
    #[serde(default)]
    pub max_redemptions: Option<u32>,
    #[serde(default)]
    pub redemptions: u32,
    pub active: bool,
    #[serde(default, with = "time_format::iso_opt")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(with = "time_format::iso")]
    pub created_at: DateTime<Utc>,
}

impl Coupon {
    /// Why the coupon cannot be applied, if it cannot.
    pub fn rejection(&self, plan_type: Option<&str>, now: DateTime<Utc>) -> Option<&'static str> {
        if !self.active {
            return Some("Coupon is no longer active");
        }
        if self.expires_at.is_some_and(|expires_at| expires_at <= now) {
            return Some("Coupon has expired");
        }
        if self.max_redemptions.is_some_and(|max| self.redemptions >= max) {
            return Some("Coupon has reached its redemption limit");
        }
        if let Some(plan) = plan_type {
            if !self.applicable_plans.is_empty() && !self.applicable_plans.iter().any(|p| p == plan)
            {
                return Some("Coupon is not valid for this plan");
            }
        }
        None
    }
}
