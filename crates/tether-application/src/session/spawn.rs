//! Spawn flow.
//!
//! Listener registration happens strictly before the spawn request so no
//! event for the new session can be missed. The new record is inserted
//! optimistically; the follow-up refresh is best-effort and its failure does
//! not fail the spawn. Either way a diagnostics record captures what
//! happened and how long each step took.

use std::sync::Arc;
use std::time::Instant;

use serde_json::json;
use tether_core::session::Session;
use tether_core::{Result, TetherError};
use tether_types::{SpawnDiagnostics, SpawnOutcome, SpawnRefreshStatus};

use crate::session_usecase::{error_message, now_timestamp, SPAWN_SESSION_TIMEOUT};
use crate::SessionUseCase;

impl SessionUseCase {
    /// Launches a new session and returns its backend-assigned id.
    pub async fn spawn_session(
        self: &Arc<Self>,
        name: &str,
        prompt: &str,
        working_dir: &str,
    ) -> Result<String> {
        // Subscription must be established before the request is issued.
        self.init_listeners().await?;

        let started_at = now_timestamp();
        let started = Instant::now();

        let args = json!({
            "name": name,
            "prompt": prompt,
            "workingDir": working_dir,
            "cliPathOverride": self.preferences.cli_path_override(),
        });

        let spawn_result: Result<String> = match self
            .call_with_timeout("spawn_session", Some(args), SPAWN_SESSION_TIMEOUT)
            .await
        {
            Ok(value) => serde_json::from_value(value).map_err(|err| {
                TetherError::internal(format!("spawn_session returned an invalid id: {err}"))
            }),
            Err(err) => Err(err),
        };

        let session_id = match spawn_result {
            Ok(session_id) => session_id,
            Err(err) => {
                let message =
                    normalize_spawn_error(&error_message(&err, "Failed to launch a new session."));
                let total_ms = started.elapsed().as_millis() as u64;

                let mut state = self.state();
                state.spawn_diagnostics = Some(SpawnDiagnostics {
                    started_at,
                    finished_at: now_timestamp(),
                    outcome: SpawnOutcome::SpawnFailed,
                    session_id: None,
                    spawn_duration_ms: total_ms,
                    refresh_duration_ms: None,
                    total_duration_ms: total_ms,
                    refresh_status: SpawnRefreshStatus::Skipped,
                    sessions_count: state.sessions.len(),
                    has_session_in_store: false,
                    active_session_id: state.active_session_id.clone(),
                    dashboard_selected_session_id: state.dashboard_selected_session_id.clone(),
                    error_message: Some(message.clone()),
                });

                return Err(TetherError::backend(message));
            }
        };

        let spawn_duration_ms = started.elapsed().as_millis() as u64;

        {
            let now = now_timestamp();
            let mut state = self.state();
            state.pending_spawn_ids.insert(session_id.clone());
            if !state.sessions.iter().any(|session| session.id == session_id) {
                let session = Session::starting(&session_id, name, working_dir, &now);
                state.sessions.insert(0, session);
            }
            state.active_session_id = Some(session_id.clone());
            state.dashboard_selected_session_id = Some(session_id.clone());
        }

        let refresh_started = Instant::now();
        let (refresh_status, refresh_error) = match self.refresh_sessions().await {
            Ok(()) => (SpawnRefreshStatus::Succeeded, None),
            Err(err) => {
                let message = error_message(&err, "Unknown session list failure");
                tracing::warn!(
                    "[Sessions] spawn succeeded but refresh failed: session={session_id} error={message}"
                );
                (SpawnRefreshStatus::Failed, Some(message))
            }
        };

        let mut state = self.state();
        state.spawn_diagnostics = Some(SpawnDiagnostics {
            started_at,
            finished_at: now_timestamp(),
            outcome: SpawnOutcome::Success,
            session_id: Some(session_id.clone()),
            spawn_duration_ms,
            refresh_duration_ms: Some(refresh_started.elapsed().as_millis() as u64),
            total_duration_ms: started.elapsed().as_millis() as u64,
            refresh_status,
            sessions_count: state.sessions.len(),
            has_session_in_store: state.sessions.iter().any(|session| session.id == session_id),
            active_session_id: state.active_session_id.clone(),
            dashboard_selected_session_id: state.dashboard_selected_session_id.clone(),
            error_message: refresh_error,
        });
        drop(state);

        Ok(session_id)
    }
}

/// Maps spawn failures to user-actionable messages. Known backend errors are
/// already actionable and pass through verbatim; timeouts and a missing CLI
/// get a retry-encouraging rewrite; anything unrecognized passes through
/// unchanged.
pub(crate) fn normalize_spawn_error(message: &str) -> String {
    if message.contains("spawn_session timed out") {
        return "Session launch timed out after 15 seconds. Verify your working directory and \
                session CLI, then try again."
            .to_string();
    }

    if message.contains("Working directory does not exist")
        || message.contains("Working directory is not a directory")
        || message.contains("Invalid CLI override path")
        || message.contains("Unsupported CLI version")
    {
        return message.to_string();
    }

    if message.contains("CLI not found") {
        return "The session CLI was not found. Install it or set a valid CLI path override in \
                settings, then retry."
            .to_string();
    }

    message.to_string()
}
