//! The engine's in-memory tables.
//!
//! Six per-session tables (directory, events, debug, operations, errors,
//! message buffers) plus the markers that make reconciliation work
//! (canonical ids, pending spawns, loaded history). One struct owns them all
//! so every invariant can be re-established under a single lock and torn
//! down through a single reset entry point.

use std::collections::{HashMap, HashSet};

use tether_core::session::{EventLog, MessageCoalescer, Session, SessionDebugState};
use tether_core::transport::Subscription;
use tether_types::{DashboardSortMode, SessionOperation, SpawnDiagnostics};

pub(crate) struct EngineState {
    pub sessions: Vec<Session>,
    pub active_session_id: Option<String>,
    pub dashboard_selected_session_id: Option<String>,
    /// False until the bootstrap retry loop has run to completion. While
    /// false the directory is not authoritative and consumers must suppress
    /// destructive empty-state decisions.
    pub hydrated: bool,
    pub load_error: Option<String>,
    pub event_log: EventLog,
    pub coalescer: MessageCoalescer,
    pub debug: HashMap<String, SessionDebugState>,
    pub operations: HashMap<String, SessionOperation>,
    pub errors: HashMap<String, String>,
    /// Session ids seen on the canonical push channel. Legacy channels are
    /// suppressed for these ids.
    pub canonical_ids: HashSet<String>,
    /// Ids spawned locally but not yet present in the backend list.
    pub pending_spawn_ids: HashSet<String>,
    /// Ids whose persisted history has already been fetched.
    pub loaded_history: HashSet<String>,
    pub seq_counter: u64,
    pub sort_mode: DashboardSortMode,
    pub sort_preference: DashboardSortMode,
    pub spawn_diagnostics: Option<SpawnDiagnostics>,
    pub listeners_initialized: bool,
    pub listeners_initializing: bool,
    /// Held so the transport keeps delivering; dropped on reset.
    pub subscriptions: Vec<Subscription>,
}

impl EngineState {
    pub fn new(sort_preference: DashboardSortMode) -> Self {
        Self {
            sessions: Vec::new(),
            active_session_id: None,
            dashboard_selected_session_id: None,
            hydrated: false,
            load_error: None,
            event_log: EventLog::new(),
            coalescer: MessageCoalescer::new(),
            debug: HashMap::new(),
            operations: HashMap::new(),
            errors: HashMap::new(),
            canonical_ids: HashSet::new(),
            pending_spawn_ids: HashSet::new(),
            loaded_history: HashSet::new(),
            seq_counter: 0,
            // The startup sort is always active-first; the stored preference
            // takes over once hydration completes.
            sort_mode: DashboardSortMode::default(),
            sort_preference,
            spawn_diagnostics: None,
            listeners_initialized: false,
            listeners_initializing: false,
            subscriptions: Vec::new(),
        }
    }

    /// Next engine-assigned sequence number, used when a legacy channel
    /// forces the engine to synthesize an event itself.
    pub fn next_seq(&mut self) -> u64 {
        self.seq_counter += 1;
        self.seq_counter
    }

    pub fn session(&self, session_id: &str) -> Option<&Session> {
        self.sessions.iter().find(|session| session.id == session_id)
    }

    pub fn first_session_id(&self) -> Option<String> {
        self.sessions.first().map(|session| session.id.clone())
    }

    pub fn update_session_status(&mut self, session_id: &str, status: &str, updated_at: &str) {
        if let Some(session) = self
            .sessions
            .iter_mut()
            .find(|session| session.id == session_id)
        {
            session.status = status.to_string();
            session.updated_at = updated_at.to_string();
        }
    }

    /// Clears the restore markers once live events prove the session is
    /// really back.
    pub fn clear_restore_indicators(&mut self, session_id: &str, updated_at: &str) {
        if let Some(session) = self
            .sessions
            .iter_mut()
            .find(|session| session.id == session_id)
        {
            session.restored = false;
            session.restored_at = None;
            session.recovery_hint = false;
            session.updated_at = updated_at.to_string();
        }
    }

    /// Purges one session id from every table and reassigns the selection
    /// ids if they pointed at it.
    pub fn remove_session_local(&mut self, session_id: &str) {
        self.coalescer.remove(session_id);
        self.canonical_ids.remove(session_id);
        self.pending_spawn_ids.remove(session_id);
        self.loaded_history.remove(session_id);

        self.sessions.retain(|session| session.id != session_id);
        self.event_log.remove(session_id);
        self.debug.remove(session_id);

        if self.active_session_id.as_deref() == Some(session_id) {
            self.active_session_id = self.first_session_id();
        }
        if self.dashboard_selected_session_id.as_deref() == Some(session_id) {
            self.dashboard_selected_session_id = self.first_session_id();
        }
    }

    /// Single teardown entry point. Drops the subscriptions (unsubscribing)
    /// and returns every table to its initial state.
    pub fn reset(&mut self, sort_preference: DashboardSortMode) {
        *self = EngineState::new(sort_preference);
    }
}
