use secrecy::Secret;
use service_core::config::{self as core_config, env_or, env_parse_or, get_env, get_secret};
use service_core::error::AppError;
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct MarketingConfig {
    pub common: core_config::Config,
    pub mongodb: MongoConfig,
    pub auth: AuthConfig,
    pub ai: AiConfig,
    pub facebook: FacebookConfig,
    /// Campaign landing pages live under `{landing_base_url}/{campaignId}/`.
    pub landing_base_url: String,
}

#[derive(Debug, Clone)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Required as `x-master-key` on `/api-keys/*`.
    pub master_key: Secret<String>,
    /// Per-key quotas are only enforced when set.
    pub rate_limit_enforce: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiProviderKind {
    Anthropic,
    OpenAi,
    Mock,
}

impl AiProviderKind {
    pub fn default_model(&self) -> &'static str {
        match self {
            AiProviderKind::Anthropic => "claude-3-5-sonnet-20241022",
            AiProviderKind::OpenAi => "gpt-4-turbo-preview",
            AiProviderKind::Mock => "mock",
        }
    }
}

impl FromStr for AiProviderKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "anthropic" => Ok(AiProviderKind::Anthropic),
            "openai" => Ok(AiProviderKind::OpenAi),
            "mock" => Ok(AiProviderKind::Mock),
            other => Err(AppError::ConfigError(anyhow::anyhow!(
                "Unknown AI_PROVIDER: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AiConfig {
    pub provider: AiProviderKind,
    pub model: String,
    pub max_tokens: u32,
    pub anthropic_api_key: Option<Secret<String>>,
    pub anthropic_base_url: String,
    pub openai_api_key: Option<Secret<String>>,
    pub openai_base_url: String,
}

#[derive(Debug, Clone)]
pub struct FacebookConfig {
    pub graph_base_url: String,
    pub api_version: String,
    /// Used for targets stored without their own token.
    pub page_access_token: Option<Secret<String>>,
}

impl MarketingConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = core_config::is_production();

        let provider: AiProviderKind = env_or("AI_PROVIDER", "anthropic").parse()?;
        let model = env::var("AI_MODEL").unwrap_or_else(|_| provider.default_model().to_string());

        let anthropic_api_key = optional_secret("ANTHROPIC_API_KEY");
        let openai_api_key = optional_secret("OPENAI_API_KEY");
        if is_prod {
            match provider {
                AiProviderKind::Anthropic if anthropic_api_key.is_none() => {
                    return Err(AppError::ConfigError(anyhow::anyhow!(
                        "ANTHROPIC_API_KEY is required in production but not set"
                    )));
                }
                AiProviderKind::OpenAi if openai_api_key.is_none() => {
                    return Err(AppError::ConfigError(anyhow::anyhow!(
                        "OPENAI_API_KEY is required in production but not set"
                    )));
                }
                _ => {}
            }
        }

        Ok(MarketingConfig {
            common: common_config,
            mongodb: MongoConfig {
                uri: get_env("MONGODB_URI", Some("mongodb://localhost:27017"), is_prod)?,
                database: get_env("MONGODB_DATABASE", Some("prodenthub_marketing"), is_prod)?,
            },
            auth: AuthConfig {
                master_key: get_secret("MASTER_KEY", Some("dev-master-key"), is_prod)?,
                rate_limit_enforce: env_parse_or("RATE_LIMIT_ENFORCE", false)?,
            },
            ai: AiConfig {
                provider,
                model,
                max_tokens: env_parse_or("AI_MAX_TOKENS", 2000)?,
                anthropic_api_key,
                anthropic_base_url: env_or("ANTHROPIC_BASE_URL", "https://api.anthropic.com"),
                openai_api_key,
                openai_base_url: env_or("OPENAI_BASE_URL", "https://api.openai.com"),
            },
            facebook: FacebookConfig {
                graph_base_url: env_or("FACEBOOK_GRAPH_URL", "https://graph.facebook.com"),
                api_version: env_or("FACEBOOK_API_VERSION", "v18.0"),
                page_access_token: optional_secret("FACEBOOK_PAGE_ACCESS_TOKEN"),
            },
            landing_base_url: env_or("LANDING_BASE_URL", "https://prodenthub.com.au"),
        })
    }
}

fn optional_secret(key: &str) -> Option<Secret<String>> {
    env::var(key).ok().filter(|v| !v.is_empty()).map(Secret::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_names_are_case_insensitive() {
        assert_eq!(
            "OpenAI".parse::<AiProviderKind>().unwrap(),
            AiProviderKind::OpenAi
        );
        assert_eq!(
            "anthropic".parse::<AiProviderKind>().unwrap().default_model(),
            "claude-3-5-sonnet-20241022"
        );
        assert!("bard".parse::<AiProviderKind>().is_err());
    }
}
