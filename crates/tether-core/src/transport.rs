//! Transport boundary trait.
//!
//! Defines the two primitives the engine assumes from the IPC layer: a
//! request/response call and a push-event subscription. The desktop shell
//! provides the real implementation; tests script their own.

use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Callback invoked for every payload delivered on a subscribed channel.
///
/// Handlers run on the transport's delivery context and must not block;
/// engine handlers take a short lock, mutate the in-memory tables and
/// return.
pub type PushHandler = Arc<dyn Fn(Value) + Send + Sync>;

/// The IPC boundary between the engine and the backend that owns the real
/// processes.
///
/// Delivery guarantees are weak on purpose: pushes arrive at-least-once,
/// possibly out of order, and the same real-world transition may surface on
/// more than one named channel. The engine's dedup and reconciliation layers
/// exist to absorb exactly that.
#[async_trait]
pub trait SessionTransport: Send + Sync {
    /// Issues a request/response command. Deadlines are the caller's
    /// responsibility; implementations just fail with the transport or
    /// backend error.
    async fn call(&self, command: &str, args: Option<Value>) -> Result<Value>;

    /// Registers a push handler on a named channel. The returned
    /// [`Subscription`] unsubscribes when dropped.
    async fn subscribe(&self, channel: &str, handler: PushHandler) -> Result<Subscription>;
}

/// Handle for an active push subscription.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// A subscription that runs the given cancel action when dropped.
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A subscription with no cancel action, for transports whose handlers
    /// live as long as the process.
    pub fn detached() -> Self {
        Self { cancel: None }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("cancelable", &self.cancel.is_some())
            .finish()
    }
}
