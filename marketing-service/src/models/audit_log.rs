use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use service_core::time_format;

/// Append-only audit trail entry. Entries expire through the TTL index.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLog {
    pub log_id: String,
    pub action: String,
    pub actor: String,
    pub resource_id: String,
    #[serde(default)]
    pub details: Value,
    #[serde(with = "time_format::iso")]
    pub timestamp: DateTime<Utc>,
}
