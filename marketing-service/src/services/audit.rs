use crate::models::AuditLog;
use crate::services::MarketingDb;
use chrono::{Duration, Utc};
use serde_json::Value;

/// Default retention for audit entries.
pub const AUDIT_RETENTION_DAYS: i64 = 365;
/// `api_key_used` entries are high volume and kept for less time.
pub const KEY_USAGE_RETENTION_DAYS: i64 = 90;

/// Writes an audit entry. A failed write is logged and never fails the request.
pub async fn record(
    db: &MarketingDb,
    action: &str,
    actor: &str,
    resource_id: &str,
    details: Value,
    retention_days: i64,
) {
    let now = Utc::now();
    let entry = AuditLog {
        log_id: format!("log_{}", uuid::Uuid::new_v4()),
        action: action.to_string(),
        actor: actor.to_string(),
        resource_id: resource_id.to_string(),
        details,
        timestamp: now,
    };

    if let Err(e) = db
        .insert_audit(&entry, now + Duration::days(retention_days))
        .await
    {
        tracing::warn!(action = %action, resource_id = %resource_id, "Failed to write audit log: {}", e);
    }
}
