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

pub const MASTER_KEY_HEADER: &str = "x-master-key";

/// Guards the API key administration routes.
pub async fn master_key_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let provided = req
        .headers()
        .get(MASTER_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    let expected = state.config.auth.master_key.expose_secret();

    let matches = !provided.is_empty()
        && provided.len() == expected.len()
        && bool::from(provided.as_bytes().ct_eq(expected.as_bytes()));

    if !matches {
        tracing::warn!(path = %req.uri().path(), "Rejected admin request without valid master key");
        return Err(AppError::Unauthorized(anyhow::anyhow!("Unauthorized")));
    }

    Ok(next.run(req).await)
}
