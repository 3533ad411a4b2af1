use super::{EmailError, EmailMessage, EmailProvider};
use async_trait::async_trait;
use std::sync::Mutex;

/// Keeps every message instead of sending it.
#[derive(Default)]
pub struct MockEmailProvider {
    sent: Mutex<Vec<EmailMessage>>,
}

impl MockEmailProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl EmailProvider for MockEmailProvider {
    async fn send(&self, email: &EmailMessage) -> Result<(), EmailError> {
        tracing::info!(to = %email.to, subject = %email.subject, "[MOCK] Email would be sent");
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(email.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_sent_messages() {
        let provider = MockEmailProvider::new();
        let message = EmailMessage {
            to: "dentist@example.com".to_string(),
            subject: "Hello".to_string(),
            body_text: "text".to_string(),
            body_html: "<p>html</p>".to_string(),
        };
        tokio_test::block_on(provider.send(&message)).unwrap();
        assert_eq!(provider.sent(), vec![message]);
    }
}
