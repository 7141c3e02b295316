//! Persisted-history loading.
//!
//! Settled sessions get their event log seeded from the backend's stored
//! history: the structured event table first, falling back to the legacy
//! flat-message table for sessions that predate it. History is fetched at
//! most once per session and never overwrites live events.

use serde_json::{json, Map, Value};
use tether_core::session::status;
use tether_types::{LegacySessionMessage, SessionEvent, StoredHistoryEvent};

use crate::session_usecase::parse_rows;
use crate::SessionUseCase;

impl SessionUseCase {
    /// Loads a session's persisted history into its (empty) event log.
    ///
    /// Transport failures are treated as an empty history: this path runs
    /// fire-and-forget after refreshes and must never surface an error.
    pub async fn load_session_history(&self, session_id: &str) {
        if self.state().loaded_history.contains(session_id) {
            return;
        }

        let stored = match self
            .call("list_session_history", Some(json!({ "id": session_id })))
            .await
        {
            Ok(value) => parse_rows::<StoredHistoryEvent>(value),
            Err(err) => {
                tracing::debug!("[Sessions] history fetch failed: session={session_id} error={err}");
                Vec::new()
            }
        };

        let mut events = stored_history_events(session_id, stored);

        if events.is_empty() {
            let legacy = match self
                .call("list_session_messages", Some(json!({ "id": session_id })))
                .await
            {
                Ok(value) => parse_rows::<LegacySessionMessage>(value),
                Err(err) => {
                    tracing::debug!(
                        "[Sessions] legacy history fetch failed: session={session_id} error={err}"
                    );
                    Vec::new()
                }
            };
            events = legacy_history_events(session_id, legacy);
        }

        let mut state = self.state();
        state.loaded_history.insert(session_id.to_string());
        if events.is_empty() {
            return;
        }
        state.event_log.install_history(session_id, events);
    }
}

fn string_field(data: &Map<String, Value>, key: &str) -> String {
    data.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn optional_string_field(data: &Map<String, Value>, key: &str) -> Option<String> {
    data.get(key).and_then(Value::as_str).map(str::to_string)
}

fn optional_value_field(data: &Map<String, Value>, key: &str) -> Option<Value> {
    data.get(key).cloned().filter(|value| !value.is_null())
}

/// Converts stored history rows into log events. Rows with a missing payload
/// type, a non-object payload or an unknown type are skipped; status
/// payloads are normalized the same way live ones are.
fn stored_history_events(session_id: &str, rows: Vec<StoredHistoryEvent>) -> Vec<SessionEvent> {
    rows.into_iter()
        .filter_map(|row| {
            let payload_type = row.payload_json.event_type?;
            let data = row.payload_json.data?;
            let data = data.as_object()?;

            let event = match payload_type.as_str() {
                "message" => SessionEvent::Message {
                    session_id: session_id.to_string(),
                    seq: row.seq,
                    timestamp: row.timestamp,
                    content: string_field(data, "content"),
                    complete: true,
                },
                "thinking" => SessionEvent::Thinking {
                    session_id: session_id.to_string(),
                    seq: row.seq,
                    timestamp: row.timestamp,
                    content: string_field(data, "content"),
                },
                "tool_call" => SessionEvent::ToolCall {
                    session_id: session_id.to_string(),
                    seq: row.seq,
                    timestamp: row.timestamp,
                    call_id: optional_string_field(data, "call_id"),
                    tool_name: data
                        .get("tool_name")
                        .and_then(Value::as_str)
                        .unwrap_or("unknown")
                        .to_string(),
                    args: optional_value_field(data, "args"),
                },
                "tool_result" => SessionEvent::ToolResult {
                    session_id: session_id.to_string(),
                    seq: row.seq,
                    timestamp: row.timestamp,
                    call_id: optional_string_field(data, "call_id"),
                    tool_name: optional_string_field(data, "tool_name"),
                    result: optional_value_field(data, "result"),
                },
                "status" => SessionEvent::Status {
                    session_id: session_id.to_string(),
                    seq: row.seq,
                    timestamp: row.timestamp,
                    status: status::normalize(
                        data.get("status").and_then(Value::as_str).unwrap_or("starting"),
                    ),
                    message: None,
                },
                "error" => SessionEvent::Error {
                    session_id: session_id.to_string(),
                    seq: row.seq,
                    timestamp: row.timestamp,
                    error: data
                        .get("message")
                        .or_else(|| data.get("error"))
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                },
                _ => return None,
            };

            Some(event)
        })
        .collect()
}

/// Converts legacy flat messages into complete message events with
/// positional sequence numbers.
fn legacy_history_events(
    session_id: &str,
    messages: Vec<LegacySessionMessage>,
) -> Vec<SessionEvent> {
    messages
        .into_iter()
        .enumerate()
        .map(|(index, message)| SessionEvent::Message {
            session_id: session_id.to_string(),
            seq: (index + 1) as u64,
            timestamp: message.timestamp,
            content: message.content,
            complete: true,
        })
        .collect()
}
