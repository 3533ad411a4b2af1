use secrecy::Secret;
use service_core::config::{self as core_config, env_or, env_parse_or, get_env, get_secret};
use service_core::error::AppError;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    pub common: core_config::Config,
    pub mongodb: MongoConfig,
    pub stripe: StripeConfig,
    /// Required as `x-admin-key` on coupon administration.
    pub admin_key: Secret<String>,
    /// Landing pages live under `{frontend_url}/{campaignId}/`.
    pub frontend_url: String,
    pub email: EmailConfig,
}

#[derive(Debug, Clone)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

#[derive(Debug, Clone)]
pub struct StripeConfig {
    pub secret_key: Secret<String>,
    pub webhook_secret: Secret<String>,
    pub api_base_url: String,
    /// Maximum age of a webhook signature timestamp, in seconds.
    pub webhook_tolerance_secs: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailProviderKind {
    Smtp,
    Mock,
}

impl FromStr for EmailProviderKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "smtp" => Ok(EmailProviderKind::Smtp),
            "mock" => Ok(EmailProviderKind::Mock),
            other => Err(AppError::ConfigError(anyhow::anyhow!(
                "Unknown EMAIL_PROVIDER: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub provider: EmailProviderKind,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_user: String,
    pub smtp_password: Secret<String>,
    pub from_email: String,
    pub from_name: String,
}

impl CheckoutConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = core_config::is_production();

        let provider: EmailProviderKind = env_or("EMAIL_PROVIDER", "smtp").parse()?;

        Ok(CheckoutConfig {
            common: common_config,
            mongodb: MongoConfig {
                uri: get_env("MONGODB_URI", Some("mongodb://localhost:27017"), is_prod)?,
                database: get_env("MONGODB_DATABASE", Some("prodenthub_checkout"), is_prod)?,
            },
            stripe: StripeConfig {
                secret_key: get_secret("STRIPE_SECRET_KEY", Some("sk_test_dev"), is_prod)?,
                webhook_secret: get_secret("STRIPE_WEBHOOK_SECRET", Some("whsec_dev"), is_prod)?,
                api_base_url: env_or("STRIPE_API_BASE_URL", "https://api.stripe.com"),
                webhook_tolerance_secs: env_parse_or("STRIPE_WEBHOOK_TOLERANCE_SECS", 300)?,
            },
            admin_key: get_secret("ADMIN_KEY", Some("dev-admin-key"), is_prod)?,
            frontend_url: env_or("FRONTEND_URL", "https://prodenthub.com.au"),
            email: EmailConfig {
                provider,
                smtp_host: get_env("SMTP_HOST", Some("localhost"), is_prod)?,
                smtp_port: env_parse_or("SMTP_PORT", 587)?,
                smtp_user: env_or("SMTP_USER", ""),
                smtp_password: get_secret("SMTP_PASSWORD", Some(""), is_prod)?,
                from_email: env_or("FROM_EMAIL", "noreply@prodenthub.com.au"),
                from_name: env_or("FROM_NAME", "ProDentHub"),
            },
        })
    }
}
