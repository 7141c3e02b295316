//! Session engine use case.
//!
//! `SessionUseCase` reconciles the authoritative, pollable session snapshot
//! with the unordered, at-least-once push-event stream and exposes the
//! consistent derived views and commands the presentation layer consumes.
//! All table mutations happen synchronously under one lock that is never
//! held across an await point; the only suspension points are backend calls
//! and retry delays.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use tether_core::dashboard;
use tether_core::preferences::{PreferenceRepository, Preferences};
use tether_core::session::{status, Session, SessionDebugState};
use tether_core::transport::SessionTransport;
use tether_core::{Result, TetherError};
use tether_types::{
    DashboardProjection, DashboardSessionRow, DashboardSortMode, SessionEvent, SessionOperation,
    SpawnDiagnostics,
};

use crate::session::state::EngineState;

/// Deadline for the two list commands issued by a refresh.
pub const LIST_SESSIONS_TIMEOUT: Duration = Duration::from_millis(1500);
/// Deadline for the spawn command.
pub const SPAWN_SESSION_TIMEOUT: Duration = Duration::from_secs(15);
/// Bootstrap retry limit.
pub const BOOTSTRAP_ATTEMPTS: u32 = 5;
pub const BOOTSTRAP_RETRY_DELAY: Duration = Duration::from_millis(150);

pub struct SessionUseCase {
    pub(crate) transport: Arc<dyn SessionTransport>,
    pub(crate) preferences: Preferences,
    state: Mutex<EngineState>,
}

impl SessionUseCase {
    /// Creates the engine. The stored dashboard sort preference is read here
    /// but only takes effect once hydration completes; until then the
    /// startup ordering applies.
    pub fn new(
        transport: Arc<dyn SessionTransport>,
        preferences: Arc<dyn PreferenceRepository>,
    ) -> Arc<Self> {
        let preferences = Preferences::new(preferences);
        let sort_preference = preferences.dashboard_sort_preference();

        Arc::new(Self {
            transport,
            preferences,
            state: Mutex::new(EngineState::new(sort_preference)),
        })
    }

    pub(crate) fn state(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().expect("engine state lock poisoned")
    }

    /// Issues a backend command with no engine-side deadline.
    pub(crate) async fn call(&self, command: &str, args: Option<Value>) -> Result<Value> {
        self.transport
            .call(command, args)
            .await
            .map_err(|err| TetherError::backend(err.to_string()))
    }

    /// Races a backend command against a timer. The timeout only stops the
    /// engine from waiting; it does not abort the backend-side operation.
    pub(crate) async fn call_with_timeout(
        &self,
        command: &str,
        args: Option<Value>,
        timeout: Duration,
    ) -> Result<Value> {
        match tokio::time::timeout(timeout, self.transport.call(command, args)).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(TetherError::backend(err.to_string())),
            Err(_) => Err(TetherError::timeout(command, timeout.as_millis() as u64)),
        }
    }

    /// Re-fetches the authoritative session list and merges it with the
    /// dashboard enrichment projection and the optimistic pending overlay.
    ///
    /// Any locally-pending spawned id the backend list does not include yet
    /// is re-inserted at the head from the current in-memory copy, so a
    /// freshly spawned session never flashes out of the directory. Pending
    /// markers clear as soon as the canonical list carries the id.
    pub async fn refresh_sessions(self: &Arc<Self>) -> Result<()> {
        let (sessions_value, projections_value) = tokio::try_join!(
            self.call_with_timeout("list_sessions", None, LIST_SESSIONS_TIMEOUT),
            self.call_with_timeout("list_dashboard_sessions", None, LIST_SESSIONS_TIMEOUT),
        )?;

        let session_list: Vec<Session> = parse_rows(sessions_value);
        let projections: Vec<DashboardProjection> = parse_rows(projections_value);

        let history_candidates: Vec<String> = {
            let mut state = self.state();

            let projection_by_id: HashMap<&str, &DashboardProjection> = projections
                .iter()
                .map(|projection| (projection.id.as_str(), projection))
                .collect();
            let current_by_id: HashMap<String, Session> = state
                .sessions
                .iter()
                .map(|session| (session.id.clone(), session.clone()))
                .collect();

            let mut rows: Vec<Session> = session_list
                .iter()
                .cloned()
                .map(|mut session| {
                    let projection = projection_by_id.get(session.id.as_str());
                    session.last_activity_at = projection
                        .and_then(|p| p.last_activity_at.clone())
                        .or(session.last_activity_at);
                    session.failure_reason = projection
                        .and_then(|p| p.failure_reason.clone())
                        .or(session.failure_reason);
                    session.restored = projection.and_then(|p| p.restored).unwrap_or(false);
                    session.restored_at = projection.and_then(|p| p.restored_at.clone());
                    session.recovery_hint =
                        projection.and_then(|p| p.recovery_hint).unwrap_or(false);
                    session
                })
                .collect();

            for session in &session_list {
                state.pending_spawn_ids.remove(&session.id);
            }

            let still_pending: Vec<String> = state.pending_spawn_ids.iter().cloned().collect();
            for session_id in still_pending {
                if rows.iter().any(|row| row.id == session_id) {
                    continue;
                }
                if let Some(optimistic) = current_by_id.get(&session_id) {
                    rows.insert(0, optimistic.clone());
                }
            }

            state.sessions = rows;
            if state.active_session_id.is_none() {
                state.active_session_id = state.first_session_id();
            }
            if state.dashboard_selected_session_id.is_none() {
                state.dashboard_selected_session_id = state.first_session_id();
            }

            session_list
                .iter()
                .filter(|session| status::normalize(&session.status) != "running")
                .map(|session| session.id.clone())
                .collect()
        };

        // History loads are best-effort and must not delay the refresh.
        for session_id in history_candidates {
            let engine = Arc::clone(self);
            tokio::spawn(async move {
                engine.load_session_history(&session_id).await;
            });
        }

        Ok(())
    }

    /// Marks the directory non-authoritative, retries the refresh up to the
    /// bootstrap attempt limit, then marks it hydrated unconditionally,
    /// recording the final error when every attempt failed.
    pub async fn bootstrap_initial_sessions(self: &Arc<Self>) -> Result<()> {
        self.begin_hydration();

        match self
            .refresh_with_retry(BOOTSTRAP_ATTEMPTS, BOOTSTRAP_RETRY_DELAY)
            .await
        {
            Ok(()) => {
                self.complete_hydration(None);
                Ok(())
            }
            Err(err) => {
                self.complete_hydration(Some(error_message(&err, "Failed to load sessions.")));
                Err(err)
            }
        }
    }

    pub fn begin_hydration(&self) {
        let mut state = self.state();
        state.hydrated = false;
        state.load_error = None;
    }

    /// Completes hydration. This is also the point where the persisted sort
    /// preference replaces the startup ordering.
    pub fn complete_hydration(&self, error: Option<String>) {
        let mut state = self.state();
        state.load_error = error;
        state.hydrated = true;
        state.sort_mode = state.sort_preference;
    }

    pub async fn refresh_with_retry(
        self: &Arc<Self>,
        attempts: u32,
        delay: Duration,
    ) -> Result<()> {
        let mut last_error = None;

        for attempt in 1..=attempts {
            tracing::debug!("[Sessions] refresh attempt {attempt}/{attempts}");
            match self.refresh_sessions().await {
                Ok(()) => {
                    tracing::debug!("[Sessions] session list refresh succeeded");
                    return Ok(());
                }
                Err(err) => {
                    tracing::warn!(
                        "[Sessions] session list refresh failed (attempt {attempt}/{attempts}): {err}"
                    );
                    last_error = Some(err);
                    if attempt < attempts {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| TetherError::internal("refresh failed with no recorded error")))
    }

    // ------------------------------------------------------------------
    // Derived views and accessors
    // ------------------------------------------------------------------

    /// Projects the dashboard rows for the given wall-clock instant, using
    /// the currently selected sort mode.
    pub fn dashboard_rows(&self, now: DateTime<Utc>) -> Vec<DashboardSessionRow> {
        let state = self.state();
        dashboard::project_rows(&state.sessions, &state.event_log, now, state.sort_mode)
    }

    pub fn sessions(&self) -> Vec<Session> {
        self.state().sessions.clone()
    }

    pub fn session_events(&self, session_id: &str) -> Vec<SessionEvent> {
        self.state().event_log.events(session_id).to_vec()
    }

    pub fn session_debug(&self, session_id: &str) -> Option<SessionDebugState> {
        self.state().debug.get(session_id).cloned()
    }

    pub fn session_operation(&self, session_id: &str) -> Option<SessionOperation> {
        self.state().operations.get(session_id).copied()
    }

    pub fn session_error(&self, session_id: &str) -> Option<String> {
        self.state().errors.get(session_id).cloned()
    }

    pub fn active_session_id(&self) -> Option<String> {
        self.state().active_session_id.clone()
    }

    pub fn set_active_session(&self, session_id: Option<String>) {
        self.state().active_session_id = session_id;
    }

    pub fn dashboard_selected_session_id(&self) -> Option<String> {
        self.state().dashboard_selected_session_id.clone()
    }

    pub fn set_dashboard_selected_session(&self, session_id: Option<String>) {
        self.state().dashboard_selected_session_id = session_id;
    }

    pub fn is_hydrated(&self) -> bool {
        self.state().hydrated
    }

    pub fn load_error(&self) -> Option<String> {
        self.state().load_error.clone()
    }

    pub fn spawn_diagnostics(&self) -> Option<SpawnDiagnostics> {
        self.state().spawn_diagnostics.clone()
    }

    pub fn sort_mode(&self) -> DashboardSortMode {
        self.state().sort_mode
    }

    /// Switches the dashboard ordering and persists it as the preference.
    pub fn set_sort_mode(&self, mode: DashboardSortMode) {
        {
            let mut state = self.state();
            state.sort_mode = mode;
            state.sort_preference = mode;
        }
        self.preferences.set_dashboard_sort_preference(mode);
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    /// Single teardown entry point: clears every table, drops the push
    /// subscriptions and re-reads the sort preference.
    pub fn reset(&self) {
        let sort_preference = self.preferences.dashboard_sort_preference();
        self.state().reset(sort_preference);
    }
}

/// Current wall-clock time as the engine's timestamp format.
pub(crate) fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Error text for display, falling back when the underlying message is
/// blank.
pub(crate) fn error_message(err: &TetherError, fallback: &str) -> String {
    let message = err.to_string();
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    }
}

/// Tolerantly deserializes a backend list result: a non-array payload is an
/// empty list, and malformed rows are dropped rather than failing the call.
pub(crate) fn parse_rows<T: serde::de::DeserializeOwned>(value: Value) -> Vec<T> {
    let Value::Array(items) = value else {
        return Vec::new();
    };

    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(row) => Some(row),
            Err(err) => {
                tracing::warn!("[Sessions] dropped malformed backend row: {err}");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_rows_tolerates_nulls_and_bad_rows() {
        assert!(parse_rows::<Session>(Value::Null).is_empty());
        assert!(parse_rows::<Session>(json!({"not": "an array"})).is_empty());

        let rows: Vec<Session> = parse_rows(json!([
            {
                "id": "good",
                "name": "Good",
                "status": "running",
                "working_dir": "/tmp",
                "created_at": "2026-01-01T00:00:00Z",
                "updated_at": "2026-01-01T00:00:00Z"
            },
            { "id": "missing-fields" }
        ]));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "good");
    }

    #[test]
    fn blank_error_messages_fall_back() {
        let err = TetherError::backend("   ");
        assert_eq!(error_message(&err, "fallback"), "fallback");

        let err = TetherError::backend("real message");
        assert_eq!(error_message(&err, "fallback"), "real message");
    }
}
