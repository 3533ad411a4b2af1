//! Purchase records on both sides of a Stripe payment: created pending when a
//! checkout session is opened and settled when Stripe reports it paid.

use super::database::settlement_fields;
use super::email::{confirmation_email, EmailProvider, PaymentReceipt};
use super::stripe::CheckoutSession;
use super::CheckoutDb;
use crate::models::{
    CheckoutCampaign, DiscountPurchase, MockExamRegistration, PersonalizedPlan, RecordStatus,
    RegistrationType, ScholarshipApplication, TeamStatus,
};
use chrono::{DateTime, Duration, Utc};
use mongodb::bson::doc;
use serde_json::{Map, Value};
use service_core::error::AppError;
use service_core::{store, time_format};

/// Access bought by a team runs this long from payment.
pub const TEAM_ACCESS_DAYS: i64 = 180;

const DEFAULT_MOCK_EXAM_ID: &str = "universal-mock-exam";

/// Keys describing the checkout itself rather than the applicant.
const CHECKOUT_KEYS: [&str; 5] = ["campaignId", "email", "amount", "currency", "planType"];

pub fn meta_str(metadata: &Map<String, Value>, key: &str) -> Option<String> {
    match metadata.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Numbers arrive as JSON numbers from the browser and as strings from Stripe.
pub fn meta_f64(metadata: &Map<String, Value>, key: &str) -> Option<f64> {
    match metadata.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn applicant_details(metadata: &Map<String, Value>, drop: &[&str]) -> Map<String, Value> {
    metadata
        .iter()
        .filter(|(k, _)| !CHECKOUT_KEYS.contains(&k.as_str()) && !drop.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

fn new_id(prefix: &str) -> String {
    format!("{}_{}", prefix, uuid::Uuid::new_v4())
}

/// Creates the pending record a checkout will settle and stores its id in
/// `metadata` under the campaign's record key. Unknown campaigns are passed
/// through untouched.
pub async fn create_pending_record(
    db: &CheckoutDb,
    campaign_id: &str,
    email: &str,
    amount: f64,
    metadata: &mut Map<String, Value>,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    let Some(campaign) = CheckoutCampaign::from_id(campaign_id) else {
        tracing::debug!(campaign_id, "No purchase record for campaign");
        return Ok(());
    };

    let record_id = match campaign {
        CheckoutCampaign::TeamCreation => {
            let team_id = meta_str(metadata, "teamId").ok_or_else(|| {
                AppError::BadRequest(anyhow::anyhow!("Missing metadata.teamId"))
            })?;
            db.find_team(&team_id)
                .await?
                .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Team not found")))?;
            team_id
        }
        CheckoutCampaign::ScholarshipApplication => {
            let application = ScholarshipApplication {
                scholarship_id: new_id("scholarship"),
                email: email.to_string(),
                scholarship_percent: meta_f64(metadata, "scholarshipPercent").unwrap_or_default(),
                scholarship_amount: meta_f64(metadata, "scholarshipAmount").unwrap_or_default(),
                final_price: amount,
                details: applicant_details(metadata, &["scholarshipPercent", "scholarshipAmount"]),
                status: RecordStatus::Pending,
                stripe_checkout_session_id: None,
                created_at: now,
                approved_at: None,
            };
            db.insert_scholarship(&application).await?;
            application.scholarship_id
        }
        CheckoutCampaign::DiscountPurchase => {
            let purchase = DiscountPurchase {
                purchase_id: new_id("purchase"),
                email: email.to_string(),
                plan_type: meta_str(metadata, "planType"),
                original_price: meta_f64(metadata, "originalPrice"),
                coupon_code: meta_str(metadata, "couponCode").map(|c| c.to_uppercase()),
                discount_amount: meta_f64(metadata, "discountAmount").unwrap_or_default(),
                final_price: amount,
                status: RecordStatus::Pending,
                stripe_checkout_session_id: None,
                created_at: now,
                activated_at: None,
            };
            db.insert_purchase(&purchase).await?;
            purchase.purchase_id
        }
        CheckoutCampaign::PersonalizedPlan => {
            let plan = PersonalizedPlan {
                plan_id: new_id("plan"),
                email: email.to_string(),
                cluster: meta_f64(metadata, "cluster").map(|c| c as u8),
                cluster_name: meta_str(metadata, "clusterName"),
                duration: meta_str(metadata, "duration"),
                price: amount,
                scores: applicant_details(metadata, &["cluster", "clusterName", "duration"]),
                status: RecordStatus::Pending,
                stripe_checkout_session_id: None,
                created_at: now,
                activated_at: None,
            };
            db.insert_plan(&plan).await?;
            plan.plan_id
        }
        CheckoutCampaign::MockExamRegistration => match meta_str(metadata, "registrationId") {
            Some(registration_id) => {
                db.find_registration(&registration_id).await?.ok_or_else(|| {
                    AppError::NotFound(anyhow::anyhow!("Registration not found"))
                })?;
                registration_id
            }
            None => {
                let registration = MockExamRegistration {
                    registration_id: new_id("registration"),
                    first_name: meta_str(metadata, "firstName").unwrap_or_default(),
                    last_name: meta_str(metadata, "lastName").unwrap_or_default(),
                    email: email.to_string(),
                    country: meta_str(metadata, "country"),
                    timezone: meta_str(metadata, "timezone"),
                    mock_exam_id: meta_str(metadata, "mockExamId")
                        .unwrap_or_else(|| DEFAULT_MOCK_EXAM_ID.to_string()),
                    exam_type: meta_str(metadata, "examType"),
                    registration_type: RegistrationType::Premium,
                    status: RecordStatus::Pending,
                    stripe_checkout_session_id: None,
                    created_at: now,
                    confirmed_at: None,
                };
                db.insert_registration(&registration).await?;
                registration.registration_id
            }
        },
    };

    tracing::info!(
        campaign_id,
        record_key = campaign.record_key(),
        record_id = %record_id,
        "Pending purchase record ready"
    );
    metadata.insert(campaign.record_key().to_string(), Value::String(record_id));
    Ok(())
}

/// Marks the purchase behind a completed checkout as paid. Returns false when
/// the session carries no usable record id.
pub async fn settle(
    db: &CheckoutDb,
    session: &CheckoutSession,
    now: DateTime<Utc>,
) -> Result<bool, AppError> {
    let campaign_id = session.metadata_str("campaignId").unwrap_or_default();
    let Some(campaign) = CheckoutCampaign::from_id(campaign_id) else {
        tracing::warn!(session_id = %session.id, campaign_id, "Unknown campaign on completed checkout");
        return Ok(false);
    };
    let Some(record_id) = session.metadata_str(campaign.record_key()) else {
        tracing::error!(
            session_id = %session.id,
            campaign_id,
            key = campaign.record_key(),
            "Completed checkout is missing its record id"
        );
        return Ok(false);
    };

    let matched = match campaign {
        CheckoutCampaign::TeamCreation => {
            let expires_at = now + Duration::days(TEAM_ACCESS_DAYS);
            let mut set =
                settlement_fields(TeamStatus::FullyPaid.as_str(), "activatedAt", &session.id, now);
            set.insert("expiresAt", time_format::format(&expires_at));
            set.insert(store::EXPIRE_AT_FIELD, store::bson_date(expires_at));
            db.set_team_fields(record_id, set).await?
        }
        CheckoutCampaign::ScholarshipApplication => {
            let set = settlement_fields(RecordStatus::Paid.as_str(), "approvedAt", &session.id, now);
            db.set_scholarship_fields(record_id, set).await?
        }
        CheckoutCampaign::DiscountPurchase => {
            let set = settlement_fields(RecordStatus::Paid.as_str(), "activatedAt", &session.id, now);
            let Some(purchase) = db.settle_purchase(record_id, set).await? else {
                // Redelivered events must not count the coupon twice.
                if db.find_purchase(record_id).await?.is_some() {
                    tracing::info!(record_id, "Purchase already settled");
                    return Ok(true);
                }
                tracing::warn!(campaign_id, record_id, "No purchase record matched completed checkout");
                return Ok(false);
            };
            let coupon = purchase
                .coupon_code
                .or_else(|| session.metadata_str("couponCode").map(str::to_uppercase));
            if let Some(code) = coupon {
                db.record_coupon_redemption(&code).await?;
                tracing::info!(coupon = %code, "Coupon redemption recorded");
            }
            true
        }
        CheckoutCampaign::PersonalizedPlan => {
            let set = settlement_fields(RecordStatus::Active.as_str(), "activatedAt", &session.id, now);
            db.set_plan_fields(record_id, set).await?
        }
        CheckoutCampaign::MockExamRegistration => {
            let mut set =
                settlement_fields(RecordStatus::Confirmed.as_str(), "confirmedAt", &session.id, now);
            set.insert("registrationType", RegistrationType::Premium.as_str());
            db.set_registration_fields(record_id, set).await?
        }
    };

    if matched {
        tracing::info!(campaign_id, record_id, "Purchase settled");
    } else {
        tracing::warn!(campaign_id, record_id, "No purchase record matched completed checkout");
    }
    Ok(matched)
}

/// Sends the payment confirmation. Failures are logged, never returned.
pub async fn send_confirmation(email: &dyn EmailProvider, session: &CheckoutSession) {
    let Some(customer_email) = session
        .customer_email
        .as_deref()
        .or_else(|| session.metadata_str("email"))
    else {
        tracing::warn!(session_id = %session.id, "Completed checkout has no customer email");
        return;
    };

    let message = confirmation_email(&PaymentReceipt {
        campaign_id: session.metadata_str("campaignId").unwrap_or_default(),
        customer_email,
        order_id: &session.id,
        amount_total: session.amount_total.unwrap_or_default(),
        currency: session.currency.as_deref().unwrap_or("aud"),
    });

    match email.send(&message).await {
        Ok(()) => {
            metrics::counter!("checkout_confirmation_emails_total", "outcome" => "sent").increment(1);
            tracing::info!(session_id = %session.id, to = %customer_email, "Confirmation email sent");
        }
        Err(e) => {
            metrics::counter!("checkout_confirmation_emails_total", "outcome" => "failed").increment(1);
            tracing::error!(session_id = %session.id, provider = email.name(), "Failed to send confirmation email: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn metadata_numbers_parse_from_either_representation() {
        let metadata = json!({ "a": 12.5, "b": "40", "c": "", "d": true });
        let metadata = metadata.as_object().unwrap();
        assert_eq!(meta_f64(metadata, "a"), Some(12.5));
        assert_eq!(meta_f64(metadata, "b"), Some(40.0));
        assert_eq!(meta_f64(metadata, "d"), None);
        assert_eq!(meta_str(metadata, "c"), None);
        assert_eq!(meta_str(metadata, "a").as_deref(), Some("12.5"));
    }

    #[test]
    fn applicant_details_drop_checkout_keys() {
        let metadata = json!({
            "campaignId": "scholarship-application",
            "email": "a@example.com",
            "attempts": 3,
            "scholarshipPercent": 55
        });
        let details = applicant_details(metadata.as_object().unwrap(), &["scholarshipPercent"]);
        assert_eq!(details.len(), 1);
        assert_eq!(details["attempts"], json!(3));
    }
}
