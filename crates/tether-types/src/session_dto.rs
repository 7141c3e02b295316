//! Wire DTOs for the backend's list and history commands.
//!
//! These mirror what the backend actually sends; optional fields default so
//! older backends that omit them keep deserializing.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One row of the `list_dashboard_sessions` enrichment projection, merged by
/// id into the canonical `list_sessions` result during a refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardProjection {
    pub id: String,
    pub name: String,
    pub status: String,
    pub created_at: String,
    #[serde(default)]
    pub last_activity_at: Option<String>,
    #[serde(default)]
    pub failure_reason: Option<String>,
    #[serde(default)]
    pub restored: Option<bool>,
    #[serde(default)]
    pub restored_at: Option<String>,
    #[serde(default)]
    pub recovery_hint: Option<bool>,
}

/// A persisted event from `list_session_history`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredHistoryEvent {
    pub id: String,
    pub session_id: String,
    pub run_id: String,
    pub seq: u64,
    pub event_type: String,
    pub payload_json: HistoryPayload,
    pub timestamp: String,
}

/// Inner payload of a stored history event. Entries with a missing type or
/// data are skipped during conversion rather than failing the whole load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryPayload {
    #[serde(rename = "type", default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
}

/// A flat message from the legacy `list_session_messages` fallback, used when
/// a session predates structured history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacySessionMessage {
    pub id: String,
    pub session_id: String,
    pub role: String,
    pub content: String,
    pub timestamp: String,
}
