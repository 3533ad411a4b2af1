pub mod analytics;
pub mod api_keys;
pub mod campaigns;
pub mod content;
pub mod dashboard;
pub mod facebook;
pub mod health;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use service_core::error::AppError;
use service_core::time_format;

pub(crate) fn bad_request(message: impl Into<String>) -> AppError {
    AppError::BadRequest(anyhow::anyhow!(message.into()))
}

pub(crate) fn not_found(message: &str) -> AppError {
    AppError::NotFound(anyhow::anyhow!(message.to_string()))
}

/// Treats empty strings as absent.
pub(crate) fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

pub(crate) fn parse_timestamp(raw: &str, field: &str) -> Result<DateTime<Utc>, AppError> {
    time_format::parse(raw).map_err(|_| bad_request(format!("Invalid {}: {}", field, raw)))
}

/// Splits `{idField: "...", ...rest}` bodies used by the update routes.
pub(crate) fn take_id(
    mut body: Map<String, Value>,
    id_field: &str,
) -> Result<(String, Map<String, Value>), AppError> {
    match body.remove(id_field) {
        Some(Value::String(id)) if !id.is_empty() => Ok((id, body)),
        _ => Err(bad_request(format!("Missing {}", id_field))),
    }
}
