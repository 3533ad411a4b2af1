use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use service_core::time_format;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    Draft,
    Active,
    Paused,
    Completed,
    Archived,
}

impl CampaignStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignStatus::Draft => "draft",
            CampaignStatus::Active => "active",
            CampaignStatus::Paused => "paused",
            CampaignStatus::Completed => "completed",
            CampaignStatus::Archived => "archived",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignType {
    Paid,
    Free,
    Hybrid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetAudience {
    #[serde(default = "default_locations")]
    pub location: Vec<String>,
    #[serde(default = "default_professions")]
    pub profession: Vec<String>,
    #[serde(default = "default_exam_status")]
    pub exam_status: Vec<String>,
    #[serde(default)]
    pub demographics: Map<String, Value>,
}

fn default_locations() -> Vec<String> {
    vec!["Australia".to_string()]
}

fn default_professions() -> Vec<String> {
    vec!["Dentist".to_string()]
}

fn default_exam_status() -> Vec<String> {
    vec!["Preparing".to_string()]
}

impl Default for TargetAudience {
    fn default() -> Self {
        Self {
            location: default_locations(),
            profession: default_professions(),
            exam_status: default_exam_status(),
            demographics: Map::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    #[serde(default)]
    pub total: f64,
    #[serde(default)]
    pub spent: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_currency() -> String {
    "AUD".to_string()
}

impl Default for Budget {
    fn default() -> Self {
        Self {
            total: 0.0,
            spent: 0.0,
            currency: default_currency(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goals {
    #[serde(default)]
    pub leads: i64,
    #[serde(default)]
    pub conversions: i64,
    #[serde(default)]
    pub revenue: f64,
}

impl Default for Goals {
    fn default() -> Self {
        Self {
            leads: 100,
            conversions: 20,
            revenue: 5000.0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assets {
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub videos: Vec<String>,
    #[serde(default)]
    pub documents: Vec<String>,
}

/// Drives the automated content run; see [`crate::services::scheduling`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentSchedule {
    #[serde(default = "default_frequency")]
    pub frequency: String,
    #[serde(default)]
    pub days_of_week: Vec<String>,
    #[serde(default = "default_platforms")]
    pub platforms: Vec<String>,
    #[serde(default = "default_true")]
    pub auto_generate: bool,
    #[serde(default)]
    pub auto_publish: bool,
    #[serde(default, with = "time_format::iso_opt")]
    pub last_content_generated: Option<DateTime<Utc>>,
}

fn default_frequency() -> String {
    "weekly".to_string()
}

fn default_platforms() -> Vec<String> {
    vec!["facebook".to_string()]
}

fn default_true() -> bool {
    true
}

impl Default for ContentSchedule {
    fn default() -> Self {
        Self {
            frequency: default_frequency(),
            days_of_week: Vec::new(),
            platforms: default_platforms(),
            auto_generate: true,
            auto_publish: false,
            last_content_generated: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignAnalytics {
    #[serde(default)]
    pub impressions: i64,
    #[serde(default)]
    pub clicks: i64,
    #[serde(default)]
    pub conversions: i64,
    #[serde(default)]
    pub revenue: f64,
    #[serde(default)]
    pub ctr: f64,
    #[serde(default)]
    pub conversion_rate: f64,
    #[serde(default)]
    pub roas: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    pub campaign_id: String,
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub campaign_type: CampaignType,
    pub status: CampaignStatus,
    #[serde(with = "time_format::iso")]
    pub start_date: DateTime<Utc>,
    #[serde(default, with = "time_format::iso_opt")]
    pub end_date: Option<DateTime<Utc>>,
    pub landing_page_url: String,
    #[serde(default)]
    pub target_audience: TargetAudience,
    #[serde(default)]
    pub budget: Budget,
    #[serde(default)]
    pub goals: Goals,
    #[serde(default)]
    pub assets: Assets,
    #[serde(default)]
    pub content_schedule: ContentSchedule,
    #[serde(default)]
    pub analytics: CampaignAnalytics,
    #[serde(default)]
    pub created_by: String,
    #[serde(with = "time_format::iso")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "time_format::iso")]
    pub updated_at: DateTime<Utc>,
    #[serde(default, with = "time_format::iso_opt")]
    pub archived_at: Option<DateTime<Utc>>,
    #[serde(default, with = "time_format::iso_opt")]
    pub activated_at: Option<DateTime<Utc>>,
}

impl Campaign {
    /// Fields a client may never overwrite through `/campaigns/update`.
    pub const IMMUTABLE_FIELDS: [&'static str; 2] = ["campaignId", "createdAt"];
}

/// Derives the campaign id from its display name:
/// `"ADC Part 1 - 2025"` becomes `campaign-adc-part-1-2025`.
pub fn campaign_id_for(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut in_gap = false;
    for ch in name.to_lowercase().chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            slug.push(ch);
            in_gap = false;
        } else if !in_gap {
            slug.push('-');
            in_gap = true;
        }
    }
    format!("campaign-{}", slug)
}
