use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use service_core::time_format;

pub const TEAM_CAMPAIGN_ID: &str = "team-creation";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamStatus {
    Created,
    FullyPaid,
}

impl TeamStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TeamStatus::Created => "created",
            TeamStatus::FullyPaid => "fully_paid",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    pub name: String,
    pub email: String,
    pub status: String,
    pub share_amount: f64,
}

/// A study team buying one shared plan. The leader pays for everyone.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub team_id: String,
    pub campaign_id: String,
    pub leader_email: String,
    pub leader_first_name: String,
    pub leader_last_name: String,
    #[serde(default)]
    pub country: Option<String>,
    pub members: Vec<TeamMember>,
    /// Members plus the leader.
    pub total_members: u32,
    pub plan_type: String,
    pub total_amount: f64,
    pub price_per_member: f64,
    pub status: TeamStatus,
    #[serde(default)]
    pub stripe_checkout_session_id: Option<String>,
    #[serde(with = "time_format::iso")]
    pub created_at: DateTime<Utc>,
    #[serde(default, with = "time_format::iso_opt")]
    pub activated_at: Option<DateTime<Utc>>,
    #[serde(with = "time_format::iso")]
    pub expires_at: DateTime<Utc>,
}
