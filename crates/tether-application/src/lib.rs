//! Application layer for Tether.
//!
//! This crate provides the session engine use case: it owns the per-session
//! tables, reconciles the pollable backend snapshot with the push-event
//! stream, and exposes the commands and derived views the presentation layer
//! consumes.

pub mod session;
pub mod session_usecase;

pub use session_usecase::SessionUseCase;
