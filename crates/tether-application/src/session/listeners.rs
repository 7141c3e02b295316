//! Push-channel registration and canonical/legacy reconciliation.
//!
//! Two families of channels can describe the same real-world transition: the
//! canonical typed `session-event` feed and the coarse legacy notifications
//! kept for older backends. The first canonical event observed for a session
//! id marks that id, and from then on legacy notifications for it no longer
//! synthesize state; completion/error notifications instead trigger a full
//! refresh so the authoritative snapshot wins.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tether_core::session::{status, SessionDebugState};
use tether_core::transport::Subscription;
use tether_core::{Result, TetherError};
use tether_types::{SessionDebugEvent, SessionEvent};

use crate::session_usecase::now_timestamp;
use crate::SessionUseCase;

const SESSION_EVENT_CHANNEL: &str = "session-event";
const SESSION_DEBUG_CHANNEL: &str = "session-debug";
const SESSION_OUTPUT_CHANNEL: &str = "session-output";
const SESSION_STARTED_CHANNEL: &str = "session-started";
const SESSION_COMPLETE_CHANNEL: &str = "session-complete";
const SESSION_ERROR_CHANNEL: &str = "session-error";

/// Payload of the legacy `session-output` channel.
#[derive(Debug, Deserialize)]
struct LegacyOutputPayload {
    session_id: String,
    line: String,
}

impl SessionUseCase {
    /// Registers every push listener exactly once.
    ///
    /// Idempotent and guarded against concurrent double-registration. A
    /// registration failure leaves the listener set uninitialized so a later
    /// call retries from scratch; partial subscriptions from the failed
    /// attempt are dropped (unsubscribed) with the error.
    pub async fn init_listeners(self: &Arc<Self>) -> Result<()> {
        {
            let mut state = self.state();
            if state.listeners_initialized || state.listeners_initializing {
                return Ok(());
            }
            state.listeners_initializing = true;
        }

        let result = self.register_listeners().await;

        let mut state = self.state();
        state.listeners_initializing = false;
        match result {
            Ok(subscriptions) => {
                state.subscriptions = subscriptions;
                state.listeners_initialized = true;
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    async fn register_listeners(self: &Arc<Self>) -> Result<Vec<Subscription>> {
        let mut subscriptions = Vec::with_capacity(6);

        subscriptions.push(
            self.subscribe(SESSION_EVENT_CHANNEL, {
                let engine = Arc::downgrade(self);
                move |payload| {
                    let Some(engine) = engine.upgrade() else { return };
                    match serde_json::from_value::<SessionEvent>(payload) {
                        Ok(event) => engine.route_session_event(event),
                        Err(err) => {
                            tracing::warn!("[Sessions] dropped malformed session event: {err}");
                        }
                    }
                }
            })
            .await?,
        );

        subscriptions.push(
            self.subscribe(SESSION_DEBUG_CHANNEL, {
                let engine = Arc::downgrade(self);
                move |payload| {
                    let Some(engine) = engine.upgrade() else { return };
                    match serde_json::from_value::<SessionDebugEvent>(payload) {
                        Ok(event) => engine.route_session_debug_event(event),
                        Err(err) => {
                            tracing::warn!("[Sessions] dropped malformed debug event: {err}");
                        }
                    }
                }
            })
            .await?,
        );

        subscriptions.push(
            self.subscribe(SESSION_OUTPUT_CHANNEL, {
                let engine = Arc::downgrade(self);
                move |payload| {
                    let Some(engine) = engine.upgrade() else { return };
                    match serde_json::from_value::<LegacyOutputPayload>(payload) {
                        Ok(output) => engine.handle_legacy_output(&output.session_id, &output.line),
                        Err(err) => {
                            tracing::warn!("[Sessions] dropped malformed output line: {err}");
                        }
                    }
                }
            })
            .await?,
        );

        subscriptions.push(
            self.subscribe(SESSION_STARTED_CHANNEL, {
                let engine = Arc::downgrade(self);
                move |payload| {
                    let Some(engine) = engine.upgrade() else { return };
                    match serde_json::from_value::<String>(payload) {
                        Ok(session_id) => engine.handle_legacy_started(&session_id),
                        Err(err) => {
                            tracing::warn!("[Sessions] dropped malformed start notification: {err}");
                        }
                    }
                }
            })
            .await?,
        );

        subscriptions.push(
            self.subscribe(SESSION_COMPLETE_CHANNEL, {
                let engine = Arc::downgrade(self);
                move |payload| {
                    let Some(engine) = engine.upgrade() else { return };
                    match serde_json::from_value::<String>(payload) {
                        Ok(session_id) => {
                            engine.handle_legacy_complete(&session_id);
                            engine.spawn_reconciling_refresh(SESSION_COMPLETE_CHANNEL);
                        }
                        Err(err) => {
                            tracing::warn!(
                                "[Sessions] dropped malformed completion notification: {err}"
                            );
                        }
                    }
                }
            })
            .await?,
        );

        subscriptions.push(
            self.subscribe(SESSION_ERROR_CHANNEL, {
                let engine = Arc::downgrade(self);
                move |payload| {
                    let Some(engine) = engine.upgrade() else { return };
                    match serde_json::from_value::<(String, String)>(payload) {
                        Ok((session_id, error)) => {
                            engine.handle_legacy_error(&session_id, &error);
                            engine.spawn_reconciling_refresh(SESSION_ERROR_CHANNEL);
                        }
                        Err(err) => {
                            tracing::warn!("[Sessions] dropped malformed error notification: {err}");
                        }
                    }
                }
            })
            .await?,
        );

        Ok(subscriptions)
    }

    async fn subscribe<F>(&self, channel: &str, handler: F) -> Result<Subscription>
    where
        F: Fn(Value) + Send + Sync + 'static,
    {
        self.transport
            .subscribe(channel, Arc::new(handler))
            .await
            .map_err(|err| TetherError::backend(format!("failed to subscribe to {channel}: {err}")))
    }

    /// Reconciling refresh triggered from a push handler. Failures are
    /// logged and swallowed; a missed reconciliation never poisons the
    /// event path.
    fn spawn_reconciling_refresh(self: &Arc<Self>, source: &'static str) {
        let engine = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(err) = engine.refresh_sessions().await {
                tracing::warn!("[Sessions] refresh after {source} notification failed: {err}");
            }
        });
    }

    // ------------------------------------------------------------------
    // Canonical channel
    // ------------------------------------------------------------------

    /// Routes one canonical push event: marks the id canonical, clears
    /// restore markers on first proof of life, coalesces message chunks,
    /// normalizes and applies status transitions, and force-flushes the
    /// message buffer when a terminal status or error arrives mid-stream.
    pub fn route_session_event(&self, event: SessionEvent) {
        let session_id = event.session_id().to_string();
        let seq = event.seq();
        let timestamp = event.timestamp().to_string();

        let mut state = self.state();
        state.canonical_ids.insert(session_id.clone());

        if state
            .session(&session_id)
            .is_some_and(|session| session.restored)
        {
            state.clear_restore_indicators(&session_id, &timestamp);
        }

        match event {
            SessionEvent::Message {
                content, complete, ..
            } => {
                if let Some(message) =
                    state
                        .coalescer
                        .append_chunk(&session_id, &content, complete, seq, &timestamp)
                {
                    state.event_log.append(message);
                }
            }
            SessionEvent::Status {
                status: raw_status,
                message,
                ..
            } => {
                let normalized = status::normalize(&raw_status);
                if status::is_terminal_status(&normalized) {
                    if let Some(flushed) = state.coalescer.flush(&session_id, seq, &timestamp) {
                        state.event_log.append(flushed);
                    }
                }
                state.event_log.append(SessionEvent::Status {
                    session_id: session_id.clone(),
                    seq,
                    timestamp: timestamp.clone(),
                    status: normalized.clone(),
                    message,
                });
                state.update_session_status(&session_id, &normalized, &timestamp);
            }
            SessionEvent::Error { .. } => {
                if let Some(flushed) = state.coalescer.flush(&session_id, seq, &timestamp) {
                    state.event_log.append(flushed);
                }
                state.event_log.append(event);
            }
            other => {
                state.event_log.append(other);
            }
        }
    }

    /// Folds one debug event into the session's diagnostic snapshot.
    pub fn route_session_debug_event(&self, event: SessionDebugEvent) {
        let mut state = self.state();
        let snapshot = state
            .debug
            .entry(event.session_id().to_string())
            .or_insert_with(|| SessionDebugState::new(event.timestamp()));
        snapshot.apply(&event);
    }

    // ------------------------------------------------------------------
    // Legacy channels
    // ------------------------------------------------------------------

    /// Legacy output line: each line is a complete message of its own.
    pub fn handle_legacy_output(&self, session_id: &str, line: &str) {
        let mut state = self.state();
        if state.canonical_ids.contains(session_id) {
            return;
        }

        let seq = state.next_seq();
        let timestamp = now_timestamp();
        if let Some(message) =
            state
                .coalescer
                .append_chunk(session_id, &format!("{line}\n"), true, seq, &timestamp)
        {
            state.event_log.append(message);
        }
    }

    pub fn handle_legacy_started(&self, session_id: &str) {
        let mut state = self.state();
        if state.canonical_ids.contains(session_id) {
            return;
        }

        let seq = state.next_seq();
        let timestamp = now_timestamp();
        state.event_log.append(SessionEvent::Status {
            session_id: session_id.to_string(),
            seq,
            timestamp: timestamp.clone(),
            status: "running".to_string(),
            message: None,
        });
        state.update_session_status(session_id, "running", &timestamp);
    }

    /// Legacy completion. For canonical sessions this synthesizes nothing;
    /// the caller's reconciling refresh carries the transition instead.
    pub fn handle_legacy_complete(&self, session_id: &str) {
        let mut state = self.state();
        if state.canonical_ids.contains(session_id) {
            return;
        }

        let flush_seq = state.next_seq();
        let timestamp = now_timestamp();
        if let Some(flushed) = state.coalescer.flush(session_id, flush_seq, &timestamp) {
            state.event_log.append(flushed);
        }

        let status_seq = state.next_seq();
        state.event_log.append(SessionEvent::Status {
            session_id: session_id.to_string(),
            seq: status_seq,
            timestamp: timestamp.clone(),
            status: "completed".to_string(),
            message: None,
        });
        state.update_session_status(session_id, "completed", &timestamp);
    }

    /// Legacy error. Synthesizes the error event plus the failed status for
    /// non-canonical sessions only.
    pub fn handle_legacy_error(&self, session_id: &str, error: &str) {
        let mut state = self.state();
        if state.canonical_ids.contains(session_id) {
            return;
        }

        let timestamp = now_timestamp();
        let seq = state.next_seq();
        if let Some(flushed) = state.coalescer.flush(session_id, seq, &timestamp) {
            state.event_log.append(flushed);
        }

        state.event_log.append(SessionEvent::Error {
            session_id: session_id.to_string(),
            seq,
            timestamp: timestamp.clone(),
            error: error.to_string(),
        });

        let status_seq = state.next_seq();
        state.event_log.append(SessionEvent::Status {
            session_id: session_id.to_string(),
            seq: status_seq,
            timestamp: now_timestamp(),
            status: "failed".to_string(),
            message: None,
        });
        state.update_session_status(session_id, "failed", &timestamp);
    }
}
