//! Append-only per-session event log with dedup and ordering.
//!
//! Transport delivery is at-least-once and unordered, and the same
//! transition can surface on two channels. The log absorbs that: duplicate
//! `(kind, seq)` pairs collapse to the first occurrence, repeated
//! running/terminal announcements collapse to one, at most one terminal
//! status event ever exists per session, and presentation order is always
//! ascending by seq regardless of arrival order.

use std::collections::HashMap;

use tether_types::SessionEvent;

use super::status::{is_terminal_status, normalize};

/// Per-session event sequences, keyed by session id.
#[derive(Debug, Default)]
pub struct EventLog {
    events: HashMap<String, Vec<SessionEvent>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an event, enforcing the dedup and terminal-lock rules.
    ///
    /// Rules, checked in order:
    /// 1. an event with the same `(kind, seq)` already exists: rejected
    /// 2. status only: the same normalized status already exists and the
    ///    incoming one is `running` or terminal: rejected
    /// 3. status only: a terminal status event already exists and the
    ///    incoming one is also terminal: rejected
    /// 4. otherwise inserted, and the session's log is re-sorted by seq
    ///    (stable, so same-seq events keep insertion order)
    ///
    /// Returns whether the event was inserted.
    pub fn append(&mut self, event: SessionEvent) -> bool {
        let session_id = event.session_id();

        if let Some(entries) = self.events.get(session_id) {
            let duplicate = entries
                .iter()
                .any(|existing| existing.kind() == event.kind() && existing.seq() == event.seq());
            if duplicate {
                return false;
            }

            if let SessionEvent::Status { status, .. } = &event {
                let incoming = normalize(status);

                let has_same_status = entries.iter().any(|existing| {
                    matches!(existing, SessionEvent::Status { status: existing_status, .. }
                        if normalize(existing_status) == incoming)
                });
                if has_same_status && (incoming == "running" || is_terminal_status(&incoming)) {
                    return false;
                }

                if is_terminal_status(&incoming) {
                    let has_terminal = entries.iter().any(|existing| {
                        matches!(existing, SessionEvent::Status { status: existing_status, .. }
                            if is_terminal_status(existing_status))
                    });
                    if has_terminal {
                        return false;
                    }
                }
            }
        }

        let entries = self.events.entry(session_id.to_string()).or_default();
        entries.push(event);
        entries.sort_by_key(SessionEvent::seq);
        true
    }

    /// The session's events in presentation order. Empty slice for unknown
    /// ids.
    pub fn events(&self, session_id: &str) -> &[SessionEvent] {
        self.events
            .get(session_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Seeds a session's log from persisted history. Only applies when the
    /// log is currently empty; live events always win over a late history
    /// load. Returns whether the history was installed.
    pub fn install_history(&mut self, session_id: &str, events: Vec<SessionEvent>) -> bool {
        if self
            .events
            .get(session_id)
            .is_some_and(|existing| !existing.is_empty())
        {
            return false;
        }

        self.events.insert(session_id.to_string(), events);
        true
    }

    /// Drops a removed session's log.
    pub fn remove(&mut self, session_id: &str) {
        self.events.remove(session_id);
    }

    /// Clears every session's log.
    pub fn reset(&mut self) {
        self.events.clear();
    }
}
