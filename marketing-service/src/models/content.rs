use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use service_core::time_format;

/// Lifecycle: draft -> scheduled | approved -> published -> archived, with
/// `rejected` reachable from review. Transitions are not enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentStatus {
    Draft,
    Scheduled,
    Approved,
    Rejected,
    Published,
    Archived,
}

impl ContentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentStatus::Draft => "draft",
            ContentStatus::Scheduled => "scheduled",
            ContentStatus::Approved => "approved",
            ContentStatus::Rejected => "rejected",
            ContentStatus::Published => "published",
            ContentStatus::Archived => "archived",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    FacebookPost,
    BlogPost,
    AdCopy,
    Email,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::FacebookPost => "facebook_post",
            ContentType::BlogPost => "blog_post",
            ContentType::AdCopy => "ad_copy",
            ContentType::Email => "email",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "facebook_post" => Some(ContentType::FacebookPost),
            "blog_post" => Some(ContentType::BlogPost),
            "ad_copy" => Some(ContentType::AdCopy),
            "email" => Some(ContentType::Email),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentMetadata {
    #[serde(default)]
    pub word_count: usize,
    #[serde(default)]
    pub has_images: bool,
    #[serde(default)]
    pub hashtags: Vec<String>,
    #[serde(default)]
    pub tone: String,
    #[serde(default)]
    pub template_id: Option<String>,
    #[serde(default)]
    pub ai_model: String,
    #[serde(default)]
    pub prompt_tokens: i64,
    #[serde(default)]
    pub completion_tokens: i64,
    #[serde(default)]
    pub variables: Map<String, Value>,
    #[serde(default)]
    pub cta_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentAnalytics {
    #[serde(default)]
    pub impressions: i64,
    #[serde(default)]
    pub clicks: i64,
    #[serde(default)]
    pub engagement: i64,
    #[serde(default)]
    pub conversions: i64,
}

/// A successful post of this content to one social target.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishedPost {
    pub target_id: String,
    pub post_id: String,
    pub post_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    pub content_id: String,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub campaign_id: String,
    pub title: String,
    pub body: String,
    pub status: ContentStatus,
    pub platform: String,
    #[serde(default, with = "time_format::iso_opt")]
    pub scheduled_at: Option<DateTime<Utc>>,
    #[serde(default, with = "time_format::iso_opt")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub published_posts: Vec<PublishedPost>,
    #[serde(default)]
    pub target_group_id: Option<String>,
    #[serde(default)]
    pub metadata: ContentMetadata,
    #[serde(default)]
    pub analytics: ContentAnalytics,
    #[serde(default)]
    pub rejection_reason: Option<String>,
    #[serde(default)]
    pub reviewed_by: Option<String>,
    #[serde(default, with = "time_format::iso_opt")]
    pub reviewed_at: Option<DateTime<Utc>>,
    #[serde(default, with = "time_format::iso_opt")]
    pub archived_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_by: String,
    #[serde(with = "time_format::iso")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "time_format::iso")]
    pub updated_at: DateTime<Utc>,
}

impl Content {
    pub const IMMUTABLE_FIELDS: [&'static str; 2] = ["contentId", "createdAt"];
}

/// Reusable prompt stored in the `templates` collection. `{name}` placeholders
/// are filled from request variables and campaign fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub template_id: String,
    #[serde(default)]
    pub name: String,
    pub prompt: String,
    #[serde(default, rename = "type")]
    pub content_type: Option<ContentType>,
}
