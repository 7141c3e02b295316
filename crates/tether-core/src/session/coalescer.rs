//! Partial-message buffering.
//!
//! Upstream transports deliver assistant text in arbitrarily small
//! fragments. The coalescer keeps one mutable buffer per session and emits a
//! single `message` event per logical turn: on the completing chunk, or when
//! a flush is forced by a terminal status or error arriving mid-stream.

use std::collections::HashMap;

use tether_types::SessionEvent;

/// Per-session text buffers. Buffers for different sessions never mix; the
/// session id on the chunk is the only routing key.
#[derive(Debug, Default)]
pub struct MessageCoalescer {
    buffers: HashMap<String, String>,
}

impl MessageCoalescer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a chunk to the session's buffer. When `complete` is set the
    /// buffer is flushed and the emitted event carries the given seq and
    /// timestamp; otherwise nothing is emitted.
    pub fn append_chunk(
        &mut self,
        session_id: &str,
        chunk: &str,
        complete: bool,
        seq: u64,
        timestamp: &str,
    ) -> Option<SessionEvent> {
        self.buffers
            .entry(session_id.to_string())
            .or_default()
            .push_str(chunk);

        if complete {
            self.flush(session_id, seq, timestamp)
        } else {
            None
        }
    }

    /// Emits the buffered text as one `message` event and clears the buffer.
    ///
    /// Idempotent: an empty or whitespace-only buffer emits nothing. Used
    /// directly when a terminal status or error arrives mid-stream so no
    /// partial text is silently lost.
    pub fn flush(&mut self, session_id: &str, seq: u64, timestamp: &str) -> Option<SessionEvent> {
        let buffer = self.buffers.get_mut(session_id)?;
        let content = buffer.trim_end().to_string();
        buffer.clear();

        if content.is_empty() {
            return None;
        }

        Some(SessionEvent::Message {
            session_id: session_id.to_string(),
            seq,
            timestamp: timestamp.to_string(),
            content,
            complete: true,
        })
    }

    /// Drops the buffer for a removed session.
    pub fn remove(&mut self, session_id: &str) {
        self.buffers.remove(session_id);
    }

    /// Clears every buffer.
    pub fn reset(&mut self) {
        self.buffers.clear();
    }
}
