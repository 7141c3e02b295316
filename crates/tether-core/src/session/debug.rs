//! Per-session diagnostic state.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tether_types::SessionDebugEvent;

/// Maximum stderr lines retained per session.
pub const STDERR_TAIL_CAPACITY: usize = 20;

/// Diagnostic snapshot for one session: the resolved spawn command line and
/// a bounded tail of recent stderr. Independent of the main event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionDebugState {
    #[serde(default)]
    pub cli_path: Option<String>,
    #[serde(default)]
    pub args: Option<Vec<String>>,
    #[serde(default)]
    pub working_dir: Option<String>,
    pub stderr_tail: VecDeque<String>,
    pub updated_at: String,
}

impl SessionDebugState {
    pub fn new(timestamp: &str) -> Self {
        Self {
            cli_path: None,
            args: None,
            working_dir: None,
            stderr_tail: VecDeque::new(),
            updated_at: timestamp.to_string(),
        }
    }

    /// Folds one debug event into the snapshot.
    pub fn apply(&mut self, event: &SessionDebugEvent) {
        match event {
            SessionDebugEvent::Spawn {
                cli_path,
                args,
                working_dir,
                timestamp,
                ..
            } => {
                self.cli_path = cli_path.clone();
                self.args = args.clone();
                self.working_dir = working_dir.clone();
                self.updated_at = timestamp.clone();
            }
            SessionDebugEvent::Stderr {
                message, timestamp, ..
            } => {
                self.stderr_tail
                    .push_back(message.clone().unwrap_or_default());
                while self.stderr_tail.len() > STDERR_TAIL_CAPACITY {
                    self.stderr_tail.pop_front();
                }
                self.updated_at = timestamp.clone();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stderr(line: &str, timestamp: &str) -> SessionDebugEvent {
        SessionDebugEvent::Stderr {
            session_id: "a".to_string(),
            timestamp: timestamp.to_string(),
            message: Some(line.to_string()),
        }
    }

    #[test]
    fn stderr_tail_is_bounded_to_the_most_recent_lines() {
        let mut state = SessionDebugState::new("t0");
        for index in 0..25 {
            state.apply(&stderr(&format!("line {index}"), "t1"));
        }

        assert_eq!(state.stderr_tail.len(), STDERR_TAIL_CAPACITY);
        assert_eq!(state.stderr_tail.front().map(String::as_str), Some("line 5"));
        assert_eq!(state.stderr_tail.back().map(String::as_str), Some("line 24"));
    }

    #[test]
    fn spawn_metadata_overwrites_previous_values() {
        let mut state = SessionDebugState::new("t0");
        state.apply(&SessionDebugEvent::Spawn {
            session_id: "a".to_string(),
            timestamp: "t1".to_string(),
            cli_path: Some("/usr/bin/agent".to_string()),
            args: Some(vec!["--continue".to_string()]),
            working_dir: Some("/work".to_string()),
        });

        assert_eq!(state.cli_path.as_deref(), Some("/usr/bin/agent"));
        assert_eq!(state.updated_at, "t1");
    }
}
