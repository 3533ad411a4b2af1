//! Pending purchase records created at checkout and settled by the Stripe
//! webhook.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use service_core::time_format;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Pending,
    Paid,
    Active,
    Confirmed,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Pending => "pending",
            RecordStatus::Paid => "paid",
            RecordStatus::Active => "active",
            RecordStatus::Confirmed => "confirmed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationType {
    Free,
    Premium,
}

impl RegistrationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationType::Free => "free",
            RegistrationType::Premium => "premium",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MockExamRegistration {
    pub registration_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
    pub mock_exam_id: String,
    #[serde(default)]
    pub exam_type: Option<String>,
    pub registration_type: RegistrationType,
    pub status: RecordStatus,
    #[serde(default)]
    pub stripe_checkout_session_id: Option<String>,
    #[serde(with = "time_format::iso")]
    pub created_at: DateTime<Utc>,
    #[serde(default, with = "time_format::iso_opt")]
    pub confirmed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScholarshipApplication {
    pub scholarship_id: String,
    pub email: String,
    pub scholarship_percent: f64,
    pub scholarship_amount: f64,
    pub final_price: f64,
    /// Application form answers as submitted.
    #[serde(default)]
    pub details: Map<String, Value>,
    pub status: RecordStatus,
    #[serde(default)]
    pub stripe_checkout_session_id: Option<String>,
    #[serde(with = "time_format::iso")]
    pub created_at: DateTime<Utc>,
    #[serde(default, with = "time_format::iso_opt")]
    pub approved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountPurchase {
    pub purchase_id: String,
    pub email: String,
    #[serde(default)]
    pub plan_type: Option<String>,
    #[serde(default)]
    pub original_price: Option<f64>,
    #[serde(default)]
    pub coupon_code: Option<String>,
    #[serde(default)]
    pub discount_amount: f64,
    pub final_price: f64,
    pub status: RecordStatus,
    #[serde(default)]
    pub stripe_checkout_session_id: Option<String>,
    #[serde(with = "time_format::iso")]
    pub created_at: DateTime<Utc>,
    #[serde(default, with = "time_format::iso_opt")]
    pub activated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalizedPlan {
    pub plan_id: String,
    pub email: String,
    #[serde(default)]
    pub cluster: Option<u8>,
    #[serde(default)]
    pub cluster_name: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
    pub price: f64,
    /// Self-assessment scores as submitted.
    #[serde(default)]
    pub scores: Map<String, Value>,
    pub status: RecordStatus,
    #[serde(default)]
    pub stripe_checkout_session_id: Option<String>,
    #[serde(with = "time_format::iso")]
    pub created_at: DateTime<Utc>,
    #[serde(default, with = "time_format::iso_opt")]
    pub activated_at: Option<DateTime<Utc>>,
}
