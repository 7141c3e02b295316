//! Push-event types delivered over the canonical backend channels.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One event in a session's log.
///
/// This is both the wire shape of the canonical `session-event` push channel
/// and the in-memory log entry. Every variant carries the common envelope
/// (session id, sequence number, timestamp); the payload differs per kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A coalesced assistant message. `complete` is always true once the
    /// event reaches a log; partial chunks live only in the coalescer.
    Message {
        session_id: String,
        seq: u64,
        timestamp: String,
        content: String,
        complete: bool,
    },
    ToolCall {
        session_id: String,
        seq: u64,
        timestamp: String,
        #[serde(default)]
        call_id: Option<String>,
        tool_name: String,
        #[serde(default)]
        args: Option<Value>,
    },
    ToolResult {
        session_id: String,
        seq: u64,
        timestamp: String,
        #[serde(default)]
        call_id: Option<String>,
        #[serde(default)]
        tool_name: Option<String>,
        #[serde(default)]
        result: Option<Value>,
    },
    Thinking {
        session_id: String,
        seq: u64,
        timestamp: String,
        content: String,
    },
    /// A lifecycle transition. `status` is stored normalized.
    Status {
        session_id: String,
        seq: u64,
        timestamp: String,
        status: String,
        #[serde(default)]
        message: Option<String>,
    },
    Error {
        session_id: String,
        seq: u64,
        timestamp: String,
        error: String,
    },
}

impl SessionEvent {
    pub fn session_id(&self) -> &str {
        match self {
            SessionEvent::Message { session_id, .. }
            | SessionEvent::ToolCall { session_id, .. }
            | SessionEvent::ToolResult { session_id, .. }
            | SessionEvent::Thinking { session_id, .. }
            | SessionEvent::Status { session_id, .. }
            | SessionEvent::Error { session_id, .. } => session_id,
        }
    }

    pub fn seq(&self) -> u64 {
        match self {
            SessionEvent::Message { seq, .. }
            | SessionEvent::ToolCall { seq, .. }
            | SessionEvent::ToolResult { seq, .. }
            | SessionEvent::Thinking { seq, .. }
            | SessionEvent::Status { seq, .. }
            | SessionEvent::Error { seq, .. } => *seq,
        }
    }

    pub fn timestamp(&self) -> &str {
        match self {
            SessionEvent::Message { timestamp, .. }
            | SessionEvent::ToolCall { timestamp, .. }
            | SessionEvent::ToolResult { timestamp, .. }
            | SessionEvent::Thinking { timestamp, .. }
            | SessionEvent::Status { timestamp, .. }
            | SessionEvent::Error { timestamp, .. } => timestamp,
        }
    }

    pub fn kind(&self) -> SessionEventKind {
        match self {
            SessionEvent::Message { .. } => SessionEventKind::Message,
            SessionEvent::ToolCall { .. } => SessionEventKind::ToolCall,
            SessionEvent::ToolResult { .. } => SessionEventKind::ToolResult,
            SessionEvent::Thinking { .. } => SessionEventKind::Thinking,
            SessionEvent::Status { .. } => SessionEventKind::Status,
            SessionEvent::Error { .. } => SessionEventKind::Error,
        }
    }
}

/// Discriminant of a [`SessionEvent`], used as half of the dedup key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEventKind {
    Message,
    ToolCall,
    ToolResult,
    Thinking,
    Status,
    Error,
}

/// Diagnostic event from the `session-debug` push channel.
///
/// Independent of the main event log; feeds the per-session debug state
/// (resolved spawn command line plus a bounded stderr tail).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionDebugEvent {
    Spawn {
        session_id: String,
        timestamp: String,
        #[serde(default)]
        cli_path: Option<String>,
        #[serde(default)]
        args: Option<Vec<String>>,
        #[serde(default)]
        working_dir: Option<String>,
    },
    Stderr {
        session_id: String,
        timestamp: String,
        #[serde(default)]
        message: Option<String>,
    },
}

impl SessionDebugEvent {
    pub fn session_id(&self) -> &str {
        match self {
            SessionDebugEvent::Spawn { session_id, .. }
            | SessionDebugEvent::Stderr { session_id, .. } => session_id,
        }
    }

    pub fn timestamp(&self) -> &str {
        match self {
            SessionDebugEvent::Spawn { timestamp, .. }
            | SessionDebugEvent::Stderr { timestamp, .. } => timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn canonical_event_wire_shape_round_trips() {
        let wire = json!({
            "type": "status",
            "data": {
                "session_id": "s-1",
                "seq": 4,
                "timestamp": "2026-01-01T00:00:00.000Z",
                "status": "running"
            }
        });

        let event: SessionEvent = serde_json::from_value(wire).unwrap();
        assert_eq!(event.kind(), SessionEventKind::Status);
        assert_eq!(event.session_id(), "s-1");
        assert_eq!(event.seq(), 4);
    }

    #[test]
    fn debug_event_is_internally_tagged_by_kind() {
        let wire = json!({
            "kind": "stderr",
            "session_id": "s-1",
            "timestamp": "2026-01-01T00:00:00.000Z",
            "message": "boom"
        });

        let event: SessionDebugEvent = serde_json::from_value(wire).unwrap();
        assert!(matches!(event, SessionDebugEvent::Stderr { .. }));
    }
}
