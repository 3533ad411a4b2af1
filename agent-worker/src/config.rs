use secrecy::Secret;
use service_core::config::{self as core_config, env_parse_or, get_env, get_secret};
use service_core::error::AppError;

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub common: core_config::Config,
    pub api: ApiConfig,
    /// Window handed to the analytics collection job.
    pub analytics_days: i64,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL of marketing-service, without a trailing slash.
    pub base_url: String,
    /// Sent as `x-api-key`.
    pub api_key: Secret<String>,
    pub timeout_secs: u64,
}

impl WorkerConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = core_config::is_production();

        Ok(WorkerConfig {
            common: common_config,
            api: ApiConfig {
                base_url: get_env("MARKETING_API_URL", Some("http://localhost:8080"), is_prod)?
                    .trim_end_matches('/')
                    .to_string(),
                api_key: get_secret("MARKETING_API_KEY", None, is_prod)?,
                timeout_secs: env_parse_or("MARKETING_API_TIMEOUT_SECS", 60)?,
            },
            analytics_days: env_parse_or("ANALYTICS_DAYS", 7)?,
        })
    }
}
