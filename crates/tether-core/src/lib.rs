//! Domain layer for the Tether session engine.
//!
//! Everything here is either a pure data structure with synchronous
//! mutation rules (event log, message coalescer, debug state) or a pure
//! derivation (status normalization, dashboard projection). The traits at
//! the bottom of the dependency graph, [`transport::SessionTransport`] and
//! [`preferences::PreferenceRepository`], are the only seams to the outside
//! world; their implementations live in other crates.

pub mod dashboard;
pub mod error;
pub mod preferences;
pub mod session;
pub mod transport;

pub use error::{Result, TetherError};
