//! Shared value types for the Tether session engine.
//!
//! This crate holds the types that cross layer boundaries: the push-event
//! union delivered by the backend, the wire DTOs returned by backend
//! commands, and the presentation-facing dashboard vocabulary. It carries no
//! behavior beyond small accessors so that every layer (core, application,
//! presentation) can depend on it without cycles.

pub mod dashboard;
pub mod event;
pub mod session_dto;

pub use dashboard::{DashboardSessionRow, DashboardSortMode, DashboardStatus};
pub use event::{SessionDebugEvent, SessionEvent, SessionEventKind};
pub use session_dto::{DashboardProjection, HistoryPayload, LegacySessionMessage, StoredHistoryEvent};

use serde::{Deserialize, Serialize};

/// Mutating command currently in flight for a session.
///
/// At most one operation may be in flight per session id; absence means the
/// session is idle from the coordinator's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionOperation {
    Interrupting,
    Resuming,
}

impl SessionOperation {
    /// The status string shown optimistically while the operation runs.
    pub const fn pseudo_status(self) -> &'static str {
        match self {
            SessionOperation::Interrupting => "interrupting",
            SessionOperation::Resuming => "resuming",
        }
    }
}

/// Outcome of the most recent spawn attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpawnOutcome {
    Success,
    SpawnFailed,
}

/// Outcome of the reconciling refresh that follows a successful spawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpawnRefreshStatus {
    Succeeded,
    Failed,
    Skipped,
}

/// Timing and outcome record for the most recent spawn attempt.
///
/// Purely diagnostic: the engine records one of these per spawn so the
/// presentation layer can surface why a launch felt slow or went wrong.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnDiagnostics {
    pub started_at: String,
    pub finished_at: String,
    pub outcome: SpawnOutcome,
    pub session_id: Option<String>,
    pub spawn_duration_ms: u64,
    pub refresh_duration_ms: Option<u64>,
    pub total_duration_ms: u64,
    pub refresh_status: SpawnRefreshStatus,
    pub sessions_count: usize,
    pub has_session_in_store: bool,
    pub active_session_id: Option<String>,
    pub dashboard_selected_session_id: Option<String>,
    pub error_message: Option<String>,
}
