//! Universal mock exam registrations.

use super::{bad_request, present};
use crate::models::{MockExamRegistration, RecordStatus, RegistrationType};
use crate::services::pricing;
use crate::startup::AppState;
use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use service_core::error::AppError;
use service_core::extract::AppJson;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub country: Option<String>,
    pub timezone: Option<String>,
    pub mock_exam_id: Option<String>,
    pub exam_type: Option<String>,
    pub registration_type: Option<String>,
}

fn parse_registration_type(raw: Option<String>) -> Result<RegistrationType, AppError> {
    match present(raw) {
        None => Ok(RegistrationType::Free),
        Some(raw) => serde_json::from_value(Value::String(raw.clone()))
            .map_err(|_| bad_request(format!("Invalid registration type: {}", raw))),
    }
}

/// Free registrations are confirmed on the spot; premium ones stay pending
/// until their checkout is paid.
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    payload.validate()?;
    let registration_type = parse_registration_type(payload.registration_type)?;
    let (first_name, last_name, email, mock_exam_id) = match (
        present(payload.first_name),
        present(payload.last_name),
        present(payload.email),
        present(payload.mock_exam_id),
    ) {
        (Some(first), Some(last), Some(email), Some(exam)) => (first, last, email, exam),
        _ => {
            return Err(bad_request(
                "Missing required fields: firstName, lastName, email, mockExamId",
            ))
        }
    };

    let now = Utc::now();
    let (status, confirmed_at) = match registration_type {
        RegistrationType::Free => (RecordStatus::Confirmed, Some(now)),
        RegistrationType::Premium => (RecordStatus::Pending, None),
    };

    let registration = MockExamRegistration {
        registration_id: format!("registration_{}", uuid::Uuid::new_v4()),
        first_name,
        last_name,
        email,
        country: present(payload.country),
        timezone: present(payload.timezone),
        mock_exam_id,
        exam_type: present(payload.exam_type),
        registration_type,
        status,
        stripe_checkout_session_id: None,
        created_at: now,
        confirmed_at,
    };

    state.db.insert_registration(&registration).await?;
    metrics::counter!(
        "checkout_mock_exam_registrations_total",
        "type" => registration_type.as_str()
    )
    .increment(1);
    tracing::info!(
        registration_id = %registration.registration_id,
        registration_type = registration_type.as_str(),
        "Mock exam registration created"
    );

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "registrationId": registration.registration_id,
            "status": status.as_str(),
            "registrationType": registration_type.as_str(),
            "price": pricing::mock_exam_price(registration_type)
        })),
    ))
}
