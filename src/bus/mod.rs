//! Process-wide publish/subscribe event bus.
//!
//! Handlers are registered per event type and receive every matching
//! emission until their [`Subscription`] is released. Emission is
//! fire-and-forget: each handler is invoked synchronously, its future is
//! spawned onto the current Tokio runtime, and any error or panic it raises is
//! logged at the dispatch site without reaching siblings or the publisher.

pub mod events;

pub use events::*;

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError, Weak};

use futures::future::BoxFuture;
use futures::FutureExt;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{error, trace, warn};

use crate::error::{Result, SwitchboardError};

static GLOBAL_BUS: OnceLock<EventBus> = OnceLock::new();

/// Error a handler may return. It is logged and otherwise ignored.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

pub type HandlerResult = std::result::Result<(), HandlerError>;

pub type HandlerFuture = BoxFuture<'static, HandlerResult>;

type Handler = dyn Fn(Arc<Event>) -> HandlerFuture + Send + Sync;

/// An immutable occurrence routed by its `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub event_type: String,
    pub payload: serde_json::Value,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl Event {
    pub fn new(event_type: impl AsRef<str>, payload: serde_json::Value) -> Self {
        Self {
            event_type: event_type.as_ref().to_string(),
            payload,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn is(&self, kind: EventKind) -> bool {
        self.event_type == kind.as_ref()
    }

    /// Deserialize the payload into a typed value.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.payload.clone()).map_err(|e| {
            SwitchboardError::InvalidArgument(format!(
                "malformed {} payload: {e}",
                self.event_type
            ))
        })
    }
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    handlers: HashMap<String, Vec<(u64, Arc<Handler>)>>,
}

/// Typed publish/subscribe mediator. Cloning yields another handle to the
/// same registry.
#[derive(Clone, Default)]
pub struct EventBus {
    registry: Arc<Mutex<Registry>>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.lock();
        let counts: HashMap<&str, usize> = registry
            .handlers
            .iter()
            .map(|(event_type, handlers)| (event_type.as_str(), handlers.len()))
            .collect();
        f.debug_struct("EventBus").field("handlers", &counts).finish()
    }
}

impl EventBus {
    /// Create an isolated bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get (or create) the process-wide bus.
    pub fn global() -> &'static EventBus {
        GLOBAL_BUS.get_or_init(EventBus::new)
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register `handler` for `event_type`.
    ///
    /// The handler stays registered for as long as the returned
    /// [`Subscription`] is alive.
    pub fn subscribe<F, Fut>(&self, event_type: impl AsRef<str>, handler: F) -> Subscription
    where
        F: Fn(Arc<Event>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        let event_type = event_type.as_ref().to_string();
        let handler: Arc<Handler> = Arc::new(move |event| handler(event).boxed());

        let mut registry = self.lock();
        registry.next_id += 1;
        let id = registry.next_id;
        registry
            .handlers
            .entry(event_type.clone())
            .or_default()
            .push((id, handler));
        drop(registry);

        Subscription {
            registry: Arc::downgrade(&self.registry),
            event_type,
            id,
            released: false,
        }
    }

    /// Register a handler that receives the decoded payload of `kind`.
    ///
    /// A payload that does not decode into `P` is reported as a handler error.
    pub fn on<P, F, Fut>(&self, kind: EventKind, handler: F) -> Subscription
    where
        P: DeserializeOwned + Send + 'static,
        F: Fn(P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.subscribe(kind, move |event: Arc<Event>| -> HandlerFuture {
            match event.decode::<P>() {
                Ok(payload) => handler(payload).boxed(),
                Err(err) => futures::future::ready(Err(HandlerError::from(err))).boxed(),
            }
        })
    }

    /// Dispatch `event` to every handler currently registered for its type.
    pub fn emit(&self, event: Event) {
        let handlers: Vec<Arc<Handler>> = self
            .lock()
            .handlers
            .get(&event.event_type)
            .map(|entries| entries.iter().map(|(_, h)| Arc::clone(h)).collect())
            .unwrap_or_default();

        trace!(event_type = %event.event_type, handlers = handlers.len(), "emit");
        if handlers.is_empty() {
            return;
        }

        let event = Arc::new(event);
        let runtime = tokio::runtime::Handle::try_current().ok();

        for handler in handlers {
            let invoked = panic::catch_unwind(AssertUnwindSafe(|| handler(Arc::clone(&event))));
            let future = match invoked {
                Ok(future) => future,
                Err(panic) => {
                    error!(
                        event_type = %event.event_type,
                        panic = %panic_message(panic.as_ref()),
                        "event handler panicked"
                    );
                    continue;
                }
            };

            let guarded = isolate(event.event_type.clone(), future);
            match &runtime {
                Some(handle) => {
                    handle.spawn(guarded);
                }
                None => {
                    if guarded.now_or_never().is_none() {
                        warn!(
                            event_type = %event.event_type,
                            "event handler suspended outside a Tokio runtime and was dropped"
                        );
                    }
                }
            }
        }
    }

    /// Emit a typed application event.
    pub fn publish(&self, event: impl Into<Event>) {
        self.emit(event.into());
    }

    /// Number of live handlers for `event_type`.
    pub fn subscriber_count(&self, event_type: impl AsRef<str>) -> usize {
        self.lock()
            .handlers
            .get(event_type.as_ref())
            .map_or(0, Vec::len)
    }
}

async fn isolate(event_type: String, future: HandlerFuture) {
    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => {
            error!(event_type = %event_type, error = %err, "Error in event handler");
        }
        Err(panic) => {
            error!(
                event_type = %event_type,
                panic = %panic_message(panic.as_ref()),
                "event handler panicked"
            );
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Owned registration handle. Releasing it (explicitly or by drop) removes
/// exactly the handler it was created for.
#[must_use = "dropping a Subscription unsubscribes its handler"]
pub struct Subscription {
    registry: Weak<Mutex<Registry>>,
    event_type: String,
    id: u64,
    released: bool,
}

impl Subscription {
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// Remove the handler now.
    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        let mut registry = registry.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(entries) = registry.handlers.get_mut(&self.event_type) {
            entries.retain(|(id, _)| *id != self.id);
            if entries.is_empty() {
                registry.handlers.remove(&self.event_type);
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("event_type", &self.event_type)
            .field("id", &self.id)
            .finish()
    }
}
