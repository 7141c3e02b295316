//! Shared test doubles for the engine integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};
use tether_application::SessionUseCase;
use tether_core::preferences::PreferenceRepository;
use tether_core::transport::{PushHandler, SessionTransport, Subscription};

pub type CallResponder =
    Box<dyn Fn(&str, Option<&Value>) -> anyhow::Result<Value> + Send + Sync>;

/// Transport whose command results come from a scripted responder. Records a
/// single timeline of subscribes and calls so tests can assert ordering.
pub struct ScriptedTransport {
    responder: CallResponder,
    pub ops: Mutex<Vec<String>>,
    pub calls: Mutex<Vec<(String, Option<Value>)>>,
    handlers: Mutex<HashMap<String, PushHandler>>,
}

impl ScriptedTransport {
    pub fn new(
        responder: impl Fn(&str, Option<&Value>) -> anyhow::Result<Value> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            responder: Box::new(responder),
            ops: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
            handlers: Mutex::new(HashMap::new()),
        })
    }

    /// Transport whose list commands return empty arrays and everything else
    /// null.
    pub fn empty() -> Arc<Self> {
        Self::new(|command, _| match command {
            "list_sessions" | "list_dashboard_sessions" => Ok(json!([])),
            _ => Ok(Value::Null),
        })
    }

    /// The recorded command names, in call order.
    pub fn command_names(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn call_count(&self, command: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(name, _)| name == command)
            .count()
    }

    /// The recorded args of the most recent call to `command`.
    pub fn last_args(&self, command: &str) -> Option<Value> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(name, _)| name == command)
            .and_then(|(_, args)| args.clone())
    }

    pub fn subscribed_channels(&self) -> Vec<String> {
        self.handlers.lock().unwrap().keys().cloned().collect()
    }

    /// Delivers a push payload to the registered handler, as the backend
    /// would.
    pub fn emit(&self, channel: &str, payload: Value) {
        let handler = self.handlers.lock().unwrap().get(channel).cloned();
        if let Some(handler) = handler {
            handler(payload);
        }
    }

    /// Index of `entry` in the op timeline; panics when absent.
    pub fn op_index(&self, entry: &str) -> usize {
        self.ops
            .lock()
            .unwrap()
            .iter()
            .position(|op| op == entry)
            .unwrap_or_else(|| panic!("{entry} not found in transport ops"))
    }
}

#[async_trait]
impl SessionTransport for ScriptedTransport {
    async fn call(&self, command: &str, args: Option<Value>) -> anyhow::Result<Value> {
        self.ops.lock().unwrap().push(format!("call:{command}"));
        self.calls
            .lock()
            .unwrap()
            .push((command.to_string(), args.clone()));
        (self.responder)(command, args.as_ref())
    }

    async fn subscribe(&self, channel: &str, handler: PushHandler) -> anyhow::Result<Subscription> {
        self.ops.lock().unwrap().push(format!("subscribe:{channel}"));
        self.handlers
            .lock()
            .unwrap()
            .insert(channel.to_string(), handler);
        Ok(Subscription::detached())
    }
}

/// In-memory preference store for tests that don't care about persistence.
#[derive(Default)]
pub struct MemoryPreferences {
    values: Mutex<HashMap<String, String>>,
}

impl PreferenceRepository for MemoryPreferences {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().unwrap().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

pub fn engine_with(transport: Arc<ScriptedTransport>) -> Arc<SessionUseCase> {
    SessionUseCase::new(transport, Arc::new(MemoryPreferences::default()))
}

/// A backend session row as `list_sessions` returns it.
pub fn session_row(id: &str, status: &str, created_at: &str) -> Value {
    json!({
        "id": id,
        "name": format!("Session {id}"),
        "status": status,
        "working_dir": "/tmp/work",
        "created_at": created_at,
        "updated_at": created_at,
    })
}

/// Yields to the runtime until spawned reconciliation tasks settle.
pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}
