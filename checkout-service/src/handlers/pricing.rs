//! Read-only price quotes for the landing pages.

use super::bad_request;
use crate::models::RegistrationType;
use crate::services::pricing::{self, ClusterPlan, FinancialNeed, ScholarshipQuote, TeamPrice};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use service_core::error::AppError;
use service_core::extract::AppJson;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamPriceRequest {
    pub member_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScholarshipRequest {
    pub attempts: Option<u32>,
    pub last_score: Option<f64>,
    pub financial_need: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalizedPlanRequest {
    pub clinical_score: Option<f64>,
    pub theory_score: Option<f64>,
    pub time_score: Option<f64>,
    pub exam_score: Option<f64>,
}

pub async fn list_plans() -> Json<Value> {
    Json(json!({
        "plans": pricing::PLANS,
        "team": { "totalPrice": pricing::TEAM_PLAN_PRICE, "duration": "6months" },
        "mockExam": {
            "free": pricing::mock_exam_price(RegistrationType::Free),
            "premium": pricing::mock_exam_price(RegistrationType::Premium)
        },
        "currency": "AUD"
    }))
}

pub async fn team_price(AppJson(payload): AppJson<TeamPriceRequest>) -> Result<Json<TeamPrice>, AppError> {
    let count = payload
        .member_count
        .ok_or_else(|| bad_request("Missing memberCount"))?;
    Ok(Json(pricing::team_price(count)?))
}

pub async fn scholarship(
    AppJson(payload): AppJson<ScholarshipRequest>,
) -> Result<Json<ScholarshipQuote>, AppError> {
    let (attempts, last_score, need) =
        match (payload.attempts, payload.last_score, payload.financial_need) {
            (Some(attempts), Some(score), Some(need)) => (attempts, score, need),
            _ => {
                return Err(bad_request(
                    "Missing required fields: attempts, lastScore, financialNeed",
                ))
            }
        };
    let need: FinancialNeed = need.parse()?;
    Ok(Json(pricing::scholarship(attempts, last_score, need)?))
}

pub async fn personalized_plan(
    AppJson(payload): AppJson<PersonalizedPlanRequest>,
) -> Result<Json<ClusterPlan>, AppError> {
    let (clinical, theory, time) =
        match (payload.clinical_score, payload.theory_score, payload.time_score) {
            (Some(clinical), Some(theory), Some(time)) => (clinical, theory, time),
            _ => {
                return Err(bad_request(
                    "Missing required fields: clinicalScore, theoryScore, timeScore",
                ))
            }
        };
    Ok(Json(pricing::personalized_plan(
        clinical,
        theory,
        time,
        payload.exam_score,
    )?))
}
