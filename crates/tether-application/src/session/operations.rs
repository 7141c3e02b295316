//! Per-session operation coordination.
//!
//! Interrupt and resume are single-flight per session id: a second caller is
//! rejected, not queued. Errors are isolated to the session's own error
//! slot, and the operation lock is always released last, after the
//! reconciling refresh, so a session can never get stuck mid-operation.

use std::sync::Arc;

use serde_json::{json, Value};
use tether_core::session::status;
use tether_core::{Result, TetherError};
use tether_types::SessionOperation;

use crate::session_usecase::{error_message, now_timestamp};
use crate::SessionUseCase;

impl SessionUseCase {
    pub async fn interrupt_session(self: &Arc<Self>, session_id: &str) -> Result<()> {
        self.begin_operation(session_id, SessionOperation::Interrupting)?;

        let outcome = self
            .call("interrupt_session", Some(json!({ "id": session_id })))
            .await;
        self.finish_operation(session_id, outcome, "Failed to interrupt session.")
            .await
    }

    pub async fn resume_session(self: &Arc<Self>, session_id: &str, prompt: &str) -> Result<()> {
        if self.state().operations.contains_key(session_id) {
            return Err(TetherError::OperationInFlight);
        }

        let prompt = prompt.trim();
        if prompt.is_empty() {
            let message = "Resume prompt cannot be empty.".to_string();
            self.state()
                .errors
                .insert(session_id.to_string(), message.clone());
            return Err(TetherError::validation(message));
        }

        self.begin_operation(session_id, SessionOperation::Resuming)?;

        let args = json!({
            "id": session_id,
            "prompt": prompt,
            "cliPathOverride": self.preferences.cli_path_override(),
        });
        let outcome = self.call("resume_session", Some(args)).await;
        self.finish_operation(session_id, outcome, "Failed to resume session.")
            .await
    }

    /// Renames a session. Validation never reaches the backend; on success
    /// the local record is updated immediately.
    pub async fn rename_session(&self, session_id: &str, name: &str) -> Result<()> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(TetherError::validation("Session name cannot be empty."));
        }

        self.call(
            "rename_session",
            Some(json!({ "id": session_id, "name": trimmed })),
        )
        .await?;

        let now = now_timestamp();
        let mut state = self.state();
        if let Some(session) = state
            .sessions
            .iter_mut()
            .find(|session| session.id == session_id)
        {
            session.name = trimmed.to_string();
            session.updated_at = now;
        }

        Ok(())
    }

    /// Removes a session: running sessions are killed before deletion, and
    /// the id is purged from every local table afterwards.
    pub async fn remove_session(&self, session_id: &str, current_status: &str) -> Result<()> {
        if status::normalize(current_status) == "running" {
            self.call("kill_session", Some(json!({ "id": session_id })))
                .await?;
        }

        self.call("delete_session", Some(json!({ "id": session_id })))
            .await?;

        let mut state = self.state();
        state.operations.remove(session_id);
        state.errors.remove(session_id);
        state.remove_session_local(session_id);

        Ok(())
    }

    /// Claims the single-flight lock: rejects when an operation is already
    /// in flight, clears the previous error and applies the optimistic
    /// pseudo-status.
    fn begin_operation(&self, session_id: &str, operation: SessionOperation) -> Result<()> {
        let mut state = self.state();
        if state.operations.contains_key(session_id) {
            return Err(TetherError::OperationInFlight);
        }

        state.errors.remove(session_id);
        state.operations.insert(session_id.to_string(), operation);
        state.update_session_status(session_id, operation.pseudo_status(), &now_timestamp());
        Ok(())
    }

    /// Settles an operation: records or clears the session's error, always
    /// triggers the reconciling refresh (non-fatal on failure), and clears
    /// the operation lock in the final step.
    async fn finish_operation(
        self: &Arc<Self>,
        session_id: &str,
        outcome: Result<Value>,
        fallback: &str,
    ) -> Result<()> {
        let result = match outcome {
            Ok(_) => {
                self.state().errors.remove(session_id);
                Ok(())
            }
            Err(err) => {
                let message = error_message(&err, fallback);
                self.state()
                    .errors
                    .insert(session_id.to_string(), message.clone());
                Err(TetherError::backend(message))
            }
        };

        if let Err(err) = self.refresh_sessions().await {
            tracing::warn!(
                "[Sessions] refresh after operation failed: session={session_id} error={err}"
            );
        }

        self.state().operations.remove(session_id);
        result
    }
}
