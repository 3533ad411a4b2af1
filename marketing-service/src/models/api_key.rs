use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use service_core::time_format;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiKeyStatus {
    Active,
    Revoked,
}

impl ApiKeyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiKeyStatus::Active => "active",
            ApiKeyStatus::Revoked => "revoked",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimit {
    #[serde(default = "default_per_minute")]
    pub requests_per_minute: u32,
    #[serde(default = "default_per_day")]
    pub requests_per_day: u32,
}

fn default_per_minute() -> u32 {
    60
}

fn default_per_day() -> u32 {
    10_000
}

impl Default for RateLimit {
    fn default() -> Self {
        Self {
            requests_per_minute: default_per_minute(),
            requests_per_day: default_per_day(),
        }
    }
}

/// Stored API key. Only the SHA-256 of the secret is persisted; the secret
/// itself is returned once, from `/api-keys/create`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKey {
    pub key_id: String,
    pub key_hash: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub status: ApiKeyStatus,
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default)]
    pub rate_limit: RateLimit,
    #[serde(default)]
    pub ip_whitelist: Vec<String>,
    #[serde(default)]
    pub created_by: String,
    #[serde(with = "time_format::iso")]
    pub created_at: DateTime<Utc>,
    #[serde(default, with = "time_format::iso_opt")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, with = "time_format::iso_opt")]
    pub last_used_at: Option<DateTime<Utc>>,
    #[serde(with = "time_format::iso")]
    pub expires_at: DateTime<Utc>,
    #[serde(default, with = "time_format::iso_opt")]
    pub revoked_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub revoke_reason: Option<String>,
}

impl ApiKey {
    pub const IMMUTABLE_FIELDS: [&'static str; 4] = ["keyId", "apiKey", "keyHash", "createdAt"];

    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        self.status == ApiKeyStatus::Active && self.expires_at > now
    }

    /// JSON view safe to list: no secret material.
    pub fn redacted(&self) -> Result<Value, serde_json::Error> {
        let mut value = serde_json::to_value(self)?;
        if let Some(object) = value.as_object_mut() {
            object.remove("keyHash");
        }
        Ok(value)
    }
}

/// Identity of the caller, attached to authenticated requests.
#[derive(Debug, Clone)]
pub struct ApiKeyContext {
    pub key_id: String,
    pub name: String,
    pub permissions: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn key(status: ApiKeyStatus, expires_in_days: i64) -> ApiKey {
        let now = Utc::now();
        ApiKey {
            key_id: "key_1".to_string(),
            key_hash: "ab".repeat(32),
            name: "agent".to_string(),
            description: String::new(),
            status,
            permissions: vec!["content:read".to_string()],
            rate_limit: RateLimit::default(),
            ip_whitelist: Vec::new(),
            created_by: "admin".to_string(),
            created_at: now,
            updated_at: None,
            last_used_at: None,
            expires_at: now + Duration::days(expires_in_days),
            revoked_at: None,
            revoke_reason: None,
        }
    }

    #[test]
    fn revoked_and_expired_keys_are_unusable() {
        let now = Utc::now();
        assert!(key(ApiKeyStatus::Active, 30).is_usable(now));
        assert!(!key(ApiKeyStatus::Revoked, 30).is_usable(now));
        assert!(!key(ApiKeyStatus::Active, -1).is_usable(now));
    }

    #[test]
    fn redacted_view_hides_hash() {
        let view = key(ApiKeyStatus::Active, 30).redacted().unwrap();
        assert!(view.get("keyHash").is_none());
        assert_eq!(view["rateLimit"]["requestsPerMinute"], 60);
    }
}
