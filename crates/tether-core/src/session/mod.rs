//! Session domain module.
//!
//! - `model`: the session record the directory holds
//! - `status`: raw-status normalization and the locked dashboard mapping
//! - `coalescer`: partial-message buffering per session
//! - `event_log`: the append-only, dedup-and-ordered per-session log
//! - `debug`: per-session diagnostic state fed by the debug channel

mod coalescer;
mod debug;
mod event_log;
mod model;
pub mod status;

pub use coalescer::MessageCoalescer;
pub use debug::{SessionDebugState, STDERR_TAIL_CAPACITY};
pub use event_log::EventLog;
pub use model::Session;
