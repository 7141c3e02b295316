//! Infrastructure layer for Tether.
//!
//! Implementations of the core boundary traits against the real filesystem.
//! The IPC transport itself is provided by the desktop shell and is not part
//! of this crate.

pub mod json_preference_store;
pub mod paths;

pub use json_preference_store::JsonPreferenceStore;
pub use paths::TetherPaths;
