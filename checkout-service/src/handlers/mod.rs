pub mod checkout;
pub mod coupons;
pub mod health;
pub mod pricing;
pub mod registrations;
pub mod teams;
pub mod webhooks;

use service_core::error::AppError;

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
