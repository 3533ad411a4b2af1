use crate::error::AppError;
use config::{Config as Cfg, File};
use secrecy::Secret;
use serde::Deserialize;
use std::env;
use std::str::FromStr;

/// Settings shared by every service, read from `configuration.*` and `APP__*`.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// OTLP collector endpoint; tracing export is disabled when unset.
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
    /// Value for `Access-Control-Allow-Origin`; `*` when unset.
    #[serde(default)]
    pub allowed_origin: Option<String>,
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let config = Cfg::builder()
            .add_source(File::with_name("configuration").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

pub fn is_production() -> bool {
    env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod"
}

/// Reads a required variable. `dev_default` is only honoured outside production.
pub fn get_env(key: &str, dev_default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = dev_default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

/// Same as [`get_env`] but wraps the value so it never reaches logs.
pub fn get_secret(
    key: &str,
    dev_default: Option<&str>,
    is_prod: bool,
) -> Result<Secret<String>, AppError> {
    get_env(key, dev_default, is_prod).map(Secret::new)
}

/// Reads a variable that has a safe default in every environment.
pub fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Reads and parses a variable, falling back to `default` when unset.
pub fn env_parse_or<T: FromStr>(key: &str, default: T) -> Result<T, AppError> {
    match env::var(key) {
        Ok(raw) => raw.parse().map_err(|_| {
            AppError::ConfigError(anyhow::anyhow!("{} has an invalid value: {}", key, raw))
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn dev_default_is_used_outside_production() {
        unsafe { env::remove_var("SERVICE_CORE_TEST_KEY") };
        let value = get_env("SERVICE_CORE_TEST_KEY", Some("fallback"), false).unwrap();
        assert_eq!(value, "fallback");
    }

    #[test]
    #[serial]
    fn missing_key_fails_in_production() {
        unsafe { env::remove_var("SERVICE_CORE_TEST_KEY") };
        let err = get_env("SERVICE_CORE_TEST_KEY", Some("fallback"), true).unwrap_err();
        assert!(err.to_string().contains("required in production"));
    }

    #[test]
    #[serial]
    fn parse_rejects_garbage() {
        unsafe { env::set_var("SERVICE_CORE_TEST_NUM", "sixty") };
        assert!(env_parse_or::<u32>("SERVICE_CORE_TEST_NUM", 60).is_err());
        unsafe { env::set_var("SERVICE_CORE_TEST_NUM", "120") };
        assert_eq!(env_parse_or::<u32>("SERVICE_CORE_TEST_NUM", 60).unwrap(), 120);
        unsafe { env::remove_var("SERVICE_CORE_TEST_NUM") };
        assert_eq!(env_parse_or::<u32>("SERVICE_CORE_TEST_NUM", 60).unwrap(), 60);
    }
}
