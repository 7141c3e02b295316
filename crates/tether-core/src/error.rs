//! Error types for the Tether engine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the session engine.
///
/// The variants follow the engine's failure taxonomy: timeouts raced against
/// a backend call, caller-side validation that never reaches the backend,
/// single-flight rejection, and errors reported by the backend itself.
/// `Clone + Serialize` so an error can be handed across an IPC boundary to
/// the presentation layer unchanged.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TetherError {
    /// A backend command exceeded its deadline. The message shape is relied
    /// on by the spawn-error mapping, which recognizes the command name.
    #[error("{command} timed out after {timeout_ms}ms")]
    Timeout { command: String, timeout_ms: u64 },

    /// Caller-side precondition failure; no backend call was made.
    #[error("{0}")]
    Validation(String),

    /// A mutating command was rejected because another operation is already
    /// in flight for the same session.
    #[error("Session operation already in progress.")]
    OperationInFlight,

    /// An error string reported by the backend (or the transport carrying
    /// it), passed through for display.
    #[error("{0}")]
    Backend(String),

    /// Internal error (should not happen in normal operation).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TetherError {
    pub fn timeout(command: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            command: command.into(),
            timeout_ms,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// A type alias for `Result<T, TetherError>`.
pub type Result<T> = std::result::Result<T, TetherError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_message_names_the_command() {
        let err = TetherError::timeout("spawn_session", 15000);
        assert_eq!(err.to_string(), "spawn_session timed out after 15000ms");
    }
}
