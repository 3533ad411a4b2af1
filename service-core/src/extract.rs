//! Request extractors whose rejections go through [`AppError`].

use crate::error::AppError;
use axum::{
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;

/// `axum::Json` that answers a malformed or mistyped body with a JSON 400
/// instead of axum's plain-text 400/415/422.
#[derive(Debug)]
pub struct AppJson<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for AppJson<T>
where
    T: DeserializeOwned + 'static,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|rejection| {
            tracing::debug!(status = rejection.status().as_u16(), "Rejected request body");
            AppError::BadRequest(anyhow::anyhow!(rejection.body_text()))
        })?;
        Ok(AppJson(value))
    }
}
