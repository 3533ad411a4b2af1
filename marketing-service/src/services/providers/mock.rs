//! Deterministic provider for tests and local runs without API keys.

use super::{FinishReason, GenerationParams, ProviderError, ProviderResponse, TextProvider};
use async_trait::async_trait;

pub struct MockTextProvider {
    enabled: bool,
}

impl MockTextProvider {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

#[async_trait]
impl TextProvider for MockTextProvider {
    async fn generate(
        &self,
        prompt: &str,
        _params: &GenerationParams,
    ) -> Result<ProviderResponse, ProviderError> {
        if !self.enabled {
            return Err(ProviderError::NotConfigured(
                "Mock text provider not enabled".to_string(),
            ));
        }

        let headline = prompt.lines().next().unwrap_or_default();
        let text = format!(
            "# Study smarter for the ADC\n{}\nJoin ProDentHub today. #ADCExam #DentalStudy",
            headline
        );

        Ok(ProviderResponse {
            output_tokens: text.split_whitespace().count() as i64,
            input_tokens: prompt.split_whitespace().count() as i64,
            text,
            finish_reason: FinishReason::Complete,
        })
    }

    fn model(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn echoes_the_prompt_headline() {
        let provider = MockTextProvider::new(true);
        let response = tokio_test::block_on(
            provider.generate("Promote the spring intake\nmore", &GenerationParams::default()),
        )
        .unwrap();
        assert!(response.text.starts_with("# Study smarter"));
        assert!(response.text.contains("Promote the spring intake"));
        assert_eq!(response.finish_reason, FinishReason::Complete);
    }

    #[test]
    fn disabled_provider_refuses() {
        let provider = MockTextProvider::new(false);
        let result = tokio_test::block_on(provider.generate("x", &GenerationParams::default()));
        assert!(matches!(result, Err(ProviderError::NotConfigured(_))));
    }
}
