//! LLM completion providers.
//!
//! Content generation only needs "prompt in, text out"; each backend adapts
//! its own wire format behind [`TextProvider`].

pub mod anthropic;
pub mod mock;
pub mod openai;

use crate::config::{AiConfig, AiProviderKind};
use async_trait::async_trait;
use service_core::error::AppError;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub use anthropic::AnthropicProvider;
pub use mock::MockTextProvider;
pub use openai::OpenAiProvider;

/// Upstream calls give up after this long.
pub const PROVIDER_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Empty completion")]
    EmptyCompletion,

    #[error("Network error: {0}")]
    NetworkError(String),
}

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        AppError::BadGateway(format!("AI generation failed: {}", err))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Complete,
    Length,
    Other,
}

#[derive(Debug, Clone)]
pub struct ProviderResponse {
    pub text: String,
    pub input_tokens: i64,
    pub output_tokens: i64,
    pub finish_reason: FinishReason,
}

#[derive(Debug, Clone)]
pub struct GenerationParams {
    pub max_tokens: u32,
    pub temperature: Option<f32>,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_tokens: 2000,
            temperature: None,
        }
    }
}

#[async_trait]
pub trait TextProvider: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<ProviderResponse, ProviderError>;

    /// Model identifier recorded on generated content.
    fn model(&self) -> &str;
}

/// Builds the provider selected by `AI_PROVIDER`.
pub fn build_provider(config: &AiConfig) -> Arc<dyn TextProvider> {
    match config.provider {
        AiProviderKind::Anthropic => Arc::new(AnthropicProvider::new(
            config.anthropic_api_key.clone(),
            &config.anthropic_base_url,
            &config.model,
        )),
        AiProviderKind::OpenAi => Arc::new(OpenAiProvider::new(
            config.openai_api_key.clone(),
            &config.openai_base_url,
            &config.model,
        )),
        AiProviderKind::Mock => Arc::new(MockTextProvider::new(true)),
    }
}

pub(crate) fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(PROVIDER_TIMEOUT)
        .build()
        .unwrap_or_default()
}

/// Shared handling of non-2xx provider responses.
pub(crate) async fn error_from_response(provider: &str, response: reqwest::Response) -> ProviderError {
    let status = response.status();
    if status.as_u16() == 429 {
        return ProviderError::RateLimited;
    }
    let body = response.text().await.unwrap_or_default();
    ProviderError::ApiError(format!("{} API error {}: {}", provider, status, body))
}
