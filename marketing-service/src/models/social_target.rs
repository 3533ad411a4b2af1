use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use service_core::time_format;

/// Stored in place of a per-target token when the page token from
/// configuration should be used.
pub const DEFAULT_TOKEN_MARKER: &str = "use_default";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetType {
    Group,
    Page,
    AdAccount,
}

impl TargetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetType::Group => "group",
            TargetType::Page => "page",
            TargetType::AdAccount => "ad_account",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetStatus {
    Active,
    Paused,
    Inactive,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetCredentials {
    pub access_token: String,
    #[serde(with = "time_format::iso")]
    pub token_expiry: DateTime<Utc>,
    #[serde(default)]
    pub permissions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostingSchedule {
    #[serde(default = "default_frequency")]
    pub frequency: String,
    #[serde(default = "default_times")]
    pub preferred_times: Vec<String>,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default = "default_days")]
    pub days_of_week: Vec<String>,
}

fn default_frequency() -> String {
    "3_times_per_week".to_string()
}

fn default_times() -> Vec<String> {
    vec!["10:00".into(), "14:00".into(), "19:00".into()]
}

fn default_timezone() -> String {
    "Australia/Sydney".to_string()
}

fn default_days() -> Vec<String> {
    vec!["Monday".into(), "Wednesday".into(), "Friday".into()]
}

impl Default for PostingSchedule {
    fn default() -> Self {
        Self {
            frequency: default_frequency(),
            preferred_times: default_times(),
            timezone: default_timezone(),
            days_of_week: default_days(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetAudience {
    #[serde(default)]
    pub size: i64,
    #[serde(default = "default_location")]
    pub location: String,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub demographics: Map<String, Value>,
}

fn default_location() -> String {
    "Australia".to_string()
}

impl Default for TargetAudience {
    fn default() -> Self {
        Self {
            size: 0,
            location: default_location(),
            interests: Vec::new(),
            demographics: Map::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetPerformance {
    #[serde(default)]
    pub avg_engagement_rate: f64,
    #[serde(default)]
    pub avg_reach: f64,
    #[serde(default)]
    pub total_posts: i64,
    #[serde(default)]
    pub total_conversions: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialTarget {
    pub target_id: String,
    pub platform: String,
    #[serde(rename = "type")]
    pub target_type: TargetType,
    pub name: String,
    pub external_id: String,
    #[serde(default)]
    pub url: Option<String>,
    pub status: TargetStatus,
    pub credentials: TargetCredentials,
    #[serde(default)]
    pub posting_schedule: PostingSchedule,
    #[serde(default)]
    pub audience: TargetAudience,
    #[serde(default)]
    pub performance: TargetPerformance,
    #[serde(default, with = "time_format::iso_opt")]
    pub last_posted_at: Option<DateTime<Utc>>,
    #[serde(with = "time_format::iso")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "time_format::iso")]
    pub updated_at: DateTime<Utc>,
}

impl SocialTarget {
    pub const IMMUTABLE_FIELDS: [&'static str; 2] = ["targetId", "createdAt"];

    /// JSON view with the access token removed.
    pub fn redacted(&self) -> Result<Value, serde_json::Error> {
        let mut value = serde_json::to_value(self)?;
        if let Some(credentials) = value
            .get_mut("credentials")
            .and_then(Value::as_object_mut)
        {
            credentials.remove("accessToken");
        }
        Ok(value)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishedTarget {
    #[serde(rename = "type")]
    pub target_type: TargetType,
    pub id: String,
    pub name: String,
}

/// One row of the `publishing_history` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishRecord {
    pub publish_id: String,
    pub content_id: String,
    pub target_id: String,
    pub platform: String,
    #[serde(with = "time_format::iso")]
    pub published_at: DateTime<Utc>,
    pub published_by: String,
    pub target: PublishedTarget,
    pub external_id: String,
    pub url: String,
    pub status: String,
    pub api_version: String,
}
