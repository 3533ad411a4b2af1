//! Outbound email: provider trait, SMTP and mock providers, and the
//! payment confirmation template.

pub mod mock;
pub mod smtp;

use crate::config::{EmailConfig, EmailProviderKind};
use crate::models::CheckoutCampaign;
use async_trait::async_trait;
use service_core::error::AppError;
use std::sync::Arc;
use thiserror::Error;

pub use mock::MockEmailProvider;
pub use smtp::SmtpEmailProvider;

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),

    #[error("Send error: {0}")]
    SendFailed(String),
}

impl From<EmailError> for AppError {
    fn from(err: EmailError) -> Self {
        AppError::EmailError(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body_text: String,
    pub body_html: String,
}

#[async_trait]
pub trait EmailProvider: Send + Sync {
    async fn send(&self, email: &EmailMessage) -> Result<(), EmailError>;
    fn name(&self) -> &'static str;
}

pub fn build_provider(config: &EmailConfig) -> Result<Arc<dyn EmailProvider>, EmailError> {
    match config.provider {
        EmailProviderKind::Smtp => Ok(Arc::new(SmtpEmailProvider::new(config.clone())?)),
        EmailProviderKind::Mock => Ok(Arc::new(MockEmailProvider::new())),
    }
}

/// Order details shown in the confirmation email.
#[derive(Debug, Clone)]
pub struct PaymentReceipt<'a> {
    pub campaign_id: &'a str,
    pub customer_email: &'a str,
    pub order_id: &'a str,
    /// Smallest currency unit.
    pub amount_total: i64,
    pub currency: &'a str,
}

impl PaymentReceipt<'_> {
    fn amount_paid(&self) -> String {
        format!(
            "${:.2} {}",
            self.amount_total as f64 / 100.0,
            self.currency.to_uppercase()
        )
    }
}

pub fn confirmation_email(receipt: &PaymentReceipt<'_>) -> EmailMessage {
    let amount = receipt.amount_paid();

    let body_html = format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="UTF-8"></head>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
  <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
    <h1 style="color: #cf4520;">Payment Successful!</h1>
    <p>Your payment has been processed successfully.</p>
    <div style="background: #f5f5f5; padding: 15px; border-radius: 5px; margin: 20px 0;">
      <h3 style="margin-top: 0;">Order Details</h3>
      <p><strong>Amount Paid:</strong> {amount}</p>
      <p><strong>Email:</strong> {email}</p>
      <p><strong>Order ID:</strong> {order_id}</p>
    </div>
    <p>You can access your account at: <a href="https://app.prodenthub.com.au">app.prodenthub.com.au</a></p>
    <p>If you have any questions, please contact us at support@prodenthub.com.au</p>
    <hr style="border: none; border-top: 1px solid #ddd; margin: 30px 0;">
    <p style="font-size: 12px; color: #666;">ProDentHub - Helping dentists ace the ADC exam</p>
  </div>
</body>
</html>"#,
        amount = amount,
        email = receipt.customer_email,
        order_id = receipt.order_id,
    );

    let body_text = format!(
        "Payment Successful!\n\n\
         Your payment has been processed successfully.\n\n\
         Amount Paid: {}\nEmail: {}\nOrder ID: {}\n\n\
         You can access your account at https://app.prodenthub.com.au\n\
         If you have any questions, please contact us at support@prodenthub.com.au\n\n\
         ProDentHub - Helping dentists ace the ADC exam\n",
        amount, receipt.customer_email, receipt.order_id
    );

    EmailMessage {
        to: receipt.customer_email.to_string(),
        subject: CheckoutCampaign::email_subject(receipt.campaign_id).to_string(),
        body_text,
        body_html,
    }
}
