use crate::startup::AppState;
use secrecy::ExposeSecret;
use service_core::{
    axum::{
        extract::{Request, State},
        middleware::Next,
        response::Response,
    },
    error::AppError,
};
use subtle::ConstantTimeEq;

pub const ADMIN_KEY_HEADER: &str = "x-admin-key";

/// Guards coupon administration.
pub async fn admin_key_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let provided = req
        .headers()
        .get(ADMIN_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    let expected = state.config.admin_key.expose_secret();

    if provided.is_empty() || !bool::from(provided.as_bytes().ct_eq(expected.as_bytes())) {
        tracing::warn!(path = %req.uri().path(), "Rejected admin request without valid admin key");
        return Err(AppError::Unauthorized(anyhow::anyhow!("Unauthorized")));
    }

    Ok(next.run(req).await)
}
