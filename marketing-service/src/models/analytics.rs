use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use service_core::time_format;

/// Counters reported by the Graph API insights endpoint for one post.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostMetrics {
    #[serde(default)]
    pub impressions: i64,
    #[serde(default)]
    pub engagement: i64,
    #[serde(default)]
    pub clicks: i64,
    #[serde(default)]
    pub reactions: i64,
}

impl PostMetrics {
    pub fn add(&mut self, other: &PostMetrics) {
        self.impressions += other.impressions;
        self.engagement += other.engagement;
        self.clicks += other.clicks;
        self.reactions += other.reactions;
    }
}

/// Daily snapshot, keyed `{contentId}_{YYYY-MM-DD}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsRecord {
    pub analytics_id: String,
    pub content_id: String,
    pub campaign_id: String,
    pub platform: String,
    pub date: String,
    pub metrics: PostMetrics,
    #[serde(with = "time_format::iso")]
    pub collected_at: DateTime<Utc>,
}

impl AnalyticsRecord {
    pub fn daily_id(content_id: &str, day: &DateTime<Utc>) -> String {
        format!("{}_{}", content_id, day.format("%Y-%m-%d"))
    }
}
