//! Study teams that share one full plan.

use super::{bad_request, not_found, present};
use crate::models::{Team, TeamMember, TeamStatus, TEAM_CAMPAIGN_ID};
use crate::services::pricing;
use crate::startup::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{Months, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use service_core::error::AppError;
use service_core::extract::AppJson;
use std::collections::HashSet;
use validator::ValidateEmail;

pub const MAX_MEMBERS: usize = 4;
const DEFAULT_PLAN_TYPE: &str = "full-6months";
const INVALID_TEAM: &str = "Invalid team data. Must have 1-4 members plus leader.";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderInput {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MemberInput {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTeamRequest {
    pub leader: Option<LeaderInput>,
    #[serde(default)]
    pub members: Vec<MemberInput>,
    pub plan_type: Option<String>,
}

type ValidTeam = (Leader, Vec<(String, String)>, Option<String>);

struct Leader {
    first_name: String,
    last_name: String,
    email: String,
    country: Option<String>,
}

/// Checks shape, email syntax and that no address appears twice, leader
/// included. Returns the leader and `(name, email)` per member.
fn validate_team(request: CreateTeamRequest) -> Result<ValidTeam, AppError> {
    let leader = request.leader.ok_or_else(|| bad_request(INVALID_TEAM))?;
    let leader = match (
        present(leader.first_name),
        present(leader.last_name),
        present(leader.email),
    ) {
        (Some(first_name), Some(last_name), Some(email)) => Leader {
            first_name,
            last_name,
            email: email.trim().to_string(),
            country: present(leader.country),
        },
        _ => return Err(bad_request(INVALID_TEAM)),
    };
    if request.members.is_empty() || request.members.len() > MAX_MEMBERS {
        return Err(bad_request(INVALID_TEAM));
    }

    let members = request
        .members
        .into_iter()
        .map(|m| match (present(m.name), present(m.email)) {
            (Some(name), Some(email)) => Ok((name, email.trim().to_string())),
            _ => Err(bad_request(INVALID_TEAM)),
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut seen = HashSet::new();
    for email in std::iter::once(&leader.email).chain(members.iter().map(|(_, e)| e)) {
        if !email.validate_email() {
            return Err(bad_request(format!("Invalid email address: {}", email)));
        }
        if !seen.insert(email.to_lowercase()) {
            return Err(bad_request("Team member emails must be unique"));
        }
    }

    Ok((leader, members, present(request.plan_type)))
}

pub async fn create_team(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateTeamRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let (leader, members, plan_type) = validate_team(payload)?;

    let total_members = members.len() as u32 + 1;
    let price = pricing::team_price(total_members)?;

    let now = Utc::now();
    let expires_at = now
        .checked_add_months(Months::new(6))
        .ok_or_else(|| AppError::InternalError(anyhow::anyhow!("Team expiry out of range")))?;

    let team = Team {
        team_id: format!("team_{}", uuid::Uuid::new_v4()),
        campaign_id: TEAM_CAMPAIGN_ID.to_string(),
        leader_email: leader.email,
        leader_first_name: leader.first_name,
        leader_last_name: leader.last_name,
        country: leader.country,
        members: members
            .into_iter()
            .map(|(name, email)| TeamMember {
                name,
                email,
                status: "pending".to_string(),
                share_amount: price.price_per_member,
            })
            .collect(),
        total_members,
        plan_type: plan_type.unwrap_or_else(|| DEFAULT_PLAN_TYPE.to_string()),
        total_amount: price.total_price,
        price_per_member: price.price_per_member,
        status: TeamStatus::Created,
        stripe_checkout_session_id: None,
        created_at: now,
        activated_at: None,
        expires_at,
    };

    state.db.insert_team(&team).await?;
    tracing::info!(team_id = %team.team_id, members = total_members, "Team created");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "teamId": team.team_id,
            "message": "Team created successfully",
            "team": team
        })),
    ))
}

pub async fn get_team(
    State(state): State<AppState>,
    Path(team_id): Path<String>,
) -> Result<Json<Team>, AppError> {
    let team = state
        .db
        .find_team(&team_id)
        .await?
        .ok_or_else(|| not_found("Team not found"))?;
    Ok(Json(team))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(members: Value) -> CreateTeamRequest {
        serde_json::from_value(json!({
            "leader": { "firstName": "Ana", "lastName": "Lee", "email": "ana@example.com" },
            "members": members
        }))
        .unwrap()
    }

    fn message(err: AppError) -> String {
        err.to_string()
    }

    #[test]
    fn accepts_one_to_four_members() {
        let (leader, members, plan) = validate_team(request(json!([
            { "name": "Ben", "email": "ben@example.com" }
        ])))
        .unwrap();
        assert_eq!(leader.email, "ana@example.com");
        assert_eq!(members.len(), 1);
        assert!(plan.is_none());
    }

    #[test]
    fn rejects_empty_and_oversized_teams() {
        let err = validate_team(request(json!([]))).err().unwrap();
        assert_eq!(message(err), INVALID_TEAM);

        let five: Vec<Value> = (0..5)
            .map(|i| json!({ "name": format!("M{}", i), "email": format!("m{}@example.com", i) }))
            .collect();
        assert!(validate_team(request(Value::Array(five))).is_err());
    }

    #[test]
    fn rejects_duplicate_emails_including_leader() {
        let err = validate_team(request(json!([
            { "name": "Ben", "email": "ANA@example.com" }
        ])))
        .err()
        .unwrap();
        assert_eq!(message(err), "Team member emails must be unique");
    }

    #[test]
    fn rejects_malformed_email() {
        assert!(validate_team(request(json!([{ "name": "Ben", "email": "not-an-email" }]))).is_err());
    }
}
