//! Session record.

use serde::{Deserialize, Serialize};

/// One session as the directory tracks it.
///
/// `status` holds the raw backend vocabulary (normalized on write where the
/// engine synthesizes it); the dashboard folds it into the locked five-state
/// set at projection time. Timestamps are RFC 3339 strings, matching what
/// the backend sends. Optional fields default so older backends that omit
/// them keep deserializing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub name: String,
    pub status: String,
    pub working_dir: String,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub last_activity_at: Option<String>,
    #[serde(default)]
    pub failure_reason: Option<String>,
    #[serde(default)]
    pub restored: bool,
    #[serde(default)]
    pub restored_at: Option<String>,
    #[serde(default)]
    pub recovery_hint: bool,
}

impl Session {
    /// The optimistic record inserted at the head of the directory right
    /// after a spawn succeeds, before the backend list confirms it.
    pub fn starting(id: &str, name: &str, working_dir: &str, timestamp: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            status: "starting".to_string(),
            working_dir: working_dir.to_string(),
            created_at: timestamp.to_string(),
            updated_at: timestamp.to_string(),
            last_activity_at: None,
            failure_reason: None,
            restored: false,
            restored_at: None,
            recovery_hint: false,
        }
    }
}
