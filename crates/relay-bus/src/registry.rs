//! # Registry
//!
//! The per-page owner of the shared inbound surface. Embed instances register
//! a [`Route`] on construction and deregister it on destroy; the registry's
//! single listener feeds every inbound message through [`Registry::dispatch`].
//!
//! Lifecycle:
//!
//! 1. `Registry::new` creates the bounded inbound channel.
//! 2. `init()` attaches the listener task (idempotent).
//! 3. Instances come and go via `register` / `deregister`; the listener stays.
//! 4. `teardown()` detaches the listener and drops every route. Final.

use crate::inbound::{InboundMessage, Inbox};
use crate::responder::Responder;
use crate::stats::{DispatchStats, DispatchStatsSnapshot};
use crate::subscription::SubscriptionTable;
use crate::DEFAULT_INBOX_CAPACITY;
use parking_lot::{Mutex, RwLock};
use relay_types::{should_deliver, EmbedId, EventEnvelope, Origin};
use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

/// Errors from registry lifecycle operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// An instance with this id is already registered.
    #[error("Embed id {0} is already registered")]
    DuplicateEmbedId(EmbedId),

    /// The registry was torn down.
    #[error("Registry torn down")]
    TornDown,

    /// `init()` was called outside a tokio runtime.
    #[error("No async runtime available to attach the inbound listener")]
    NoRuntime,
}

/// Registry configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Bound of the inbound channel.
    pub inbox_capacity: usize,
    /// Discard messages whose origin does not match the instance's expected
    /// origin. When off, mismatches are only logged.
    pub strict_origin: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            inbox_capacity: DEFAULT_INBOX_CAPACITY,
            strict_origin: true,
        }
    }
}

/// Routing entry of one embed instance.
#[derive(Debug, Clone)]
pub struct Route {
    pub embed_id: EmbedId,
    pub expected_origin: Origin,
    pub table: Arc<SubscriptionTable>,
}

/// What happened to one inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Routed to an instance. `invoked` callbacks ran, `filtered` were
    /// skipped by the two-phase filter.
    Delivered { invoked: usize, filtered: usize },
    /// Payload was not an envelope.
    Malformed,
    /// No live instance carries the envelope's embed id.
    UnknownEmbed,
    /// Sender origin differs from the instance's expected origin.
    ForeignOrigin,
}

struct RegistryInner {
    config: RegistryConfig,
    routes: RwLock<HashMap<EmbedId, Route>>,
    stats: DispatchStats,
    inbox: Inbox,
    receiver: Mutex<Option<mpsc::Receiver<InboundMessage>>>,
    listener: Mutex<Option<JoinHandle<()>>>,
    torn_down: AtomicBool,
}

/// Per-page inbound dispatcher. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct Registry {
    inner: Arc<RegistryInner>,
}

impl Registry {
    pub fn new(config: RegistryConfig) -> Self {
        let capacity = config.inbox_capacity.max(1);
        let (sender, receiver) = mpsc::channel(capacity);
        Self {
            inner: Arc::new(RegistryInner {
                config,
                routes: RwLock::new(HashMap::new()),
                stats: DispatchStats::default(),
                inbox: Inbox::new(sender, capacity),
                receiver: Mutex::new(Some(receiver)),
                listener: Mutex::new(None),
                torn_down: AtomicBool::new(false),
            }),
        }
    }

    /// Attach the inbound listener on the current tokio runtime.
    ///
    /// Calling it again while attached is a no-op.
    pub fn init(&self) -> Result<(), RegistryError> {
        if self.is_torn_down() {
            return Err(RegistryError::TornDown);
        }

        let mut listener = self.inner.listener.lock();
        if listener.is_some() {
            return Ok(());
        }

        let runtime = Handle::try_current().map_err(|_| RegistryError::NoRuntime)?;
        let Some(mut receiver) = self.inner.receiver.lock().take() else {
            return Err(RegistryError::TornDown);
        };

        let weak: Weak<RegistryInner> = Arc::downgrade(&self.inner);
        *listener = Some(runtime.spawn(async move {
            while let Some(message) = receiver.recv().await {
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                inner.dispatch(message);
            }
            debug!("Inbound listener stopped");
        }));

        info!(
            capacity = self.inner.inbox.capacity(),
            strict_origin = self.inner.config.strict_origin,
            "Inbound listener attached"
        );
        Ok(())
    }

    /// Detach the listener and drop every route.
    ///
    /// Returns the number of routes that were still registered.
    pub fn teardown(&self) -> usize {
        if self.inner.torn_down.swap(true, Ordering::AcqRel) {
            return 0;
        }

        if let Some(listener) = self.inner.listener.lock().take() {
            listener.abort();
        }
        drop(self.inner.receiver.lock().take());

        let dropped = {
            let mut routes = self.inner.routes.write();
            let count = routes.len();
            routes.clear();
            count
        };

        info!(routes_dropped = dropped, "Registry torn down");
        dropped
    }

    pub fn is_listening(&self) -> bool {
        self.inner
            .listener
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub fn is_torn_down(&self) -> bool {
        self.inner.torn_down.load(Ordering::Acquire)
    }

    /// Handle onto the shared inbound surface.
    pub fn inbox(&self) -> Inbox {
        self.inner.inbox.clone()
    }

    /// Add a route for a newly constructed instance.
    pub fn register(&self, route: Route) -> Result<(), RegistryError> {
        if self.is_torn_down() {
            return Err(RegistryError::TornDown);
        }

        let mut routes = self.inner.routes.write();
        if routes.contains_key(&route.embed_id) {
            return Err(RegistryError::DuplicateEmbedId(route.embed_id));
        }

        debug!(
            embed_id = %route.embed_id,
            expected_origin = %route.expected_origin,
            "Route registered"
        );
        routes.insert(route.embed_id.clone(), route);
        Ok(())
    }

    /// Remove an instance's route. Other routes and the listener are untouched.
    pub fn deregister(&self, embed_id: &EmbedId) -> bool {
        let removed = self.inner.routes.write().remove(embed_id).is_some();
        if removed {
            debug!(embed_id = %embed_id, "Route deregistered");
        }
        removed
    }

    pub fn contains(&self, embed_id: &EmbedId) -> bool {
        self.inner.routes.read().contains_key(embed_id)
    }

    pub fn route_count(&self) -> usize {
        self.inner.routes.read().len()
    }

    /// Route one inbound message synchronously. Never fails outward.
    pub fn dispatch(&self, message: InboundMessage) -> DispatchOutcome {
        self.inner.dispatch(message)
    }

    pub fn stats(&self) -> DispatchStatsSnapshot {
        self.inner.stats.snapshot()
    }

    pub fn config(&self) -> RegistryConfig {
        self.inner.config
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(RegistryConfig::default())
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("routes", &self.route_count())
            .field("listening", &self.is_listening())
            .field("torn_down", &self.is_torn_down())
            .finish()
    }
}

impl RegistryInner {
    fn dispatch(&self, message: InboundMessage) -> DispatchOutcome {
        let InboundMessage { origin, data, port } = message;

        let envelope = match EventEnvelope::from_value(data) {
            Ok(envelope) => envelope,
            Err(e) => {
                DispatchStats::bump(&self.stats.malformed);
                trace!(origin = %origin, error = %e, "Discarding non-envelope message");
                return DispatchOutcome::Malformed;
            }
        };

        let Some(embed_id) = envelope.embed_id.clone() else {
            DispatchStats::bump(&self.stats.unknown_embed);
            trace!(origin = %origin, event_type = %envelope.kind, "Discarding unaddressed message");
            return DispatchOutcome::UnknownEmbed;
        };

        let (table, expected_origin) = {
            let routes = self.routes.read();
            match routes.get(&embed_id) {
                Some(route) => (Arc::clone(&route.table), route.expected_origin.clone()),
                None => {
                    DispatchStats::bump(&self.stats.unknown_embed);
                    trace!(embed_id = %embed_id, "Discarding message for unknown embed");
                    return DispatchOutcome::UnknownEmbed;
                }
            }
        };

        if !expected_origin.matches(&origin) {
            if self.config.strict_origin {
                DispatchStats::bump(&self.stats.foreign_origin);
                debug!(
                    embed_id = %embed_id,
                    origin = %origin,
                    expected_origin = %expected_origin,
                    "Discarding message from unexpected origin"
                );
                return DispatchOutcome::ForeignOrigin;
            }
            warn!(
                embed_id = %embed_id,
                origin = %origin,
                expected_origin = %expected_origin,
                "Accepting message from unexpected origin (strict origin checks off)"
            );
        }

        DispatchStats::bump(&self.stats.routed);

        let phase = envelope.phase();
        let responder =
            port.map(|port| Responder::new(port, embed_id.clone(), envelope.kind.clone()));

        let mut invoked = 0;
        let mut filtered = 0;
        for subscription in table.matching(&envelope.kind) {
            if !should_deliver(phase, subscription.deliver_on_start) {
                filtered += 1;
                DispatchStats::bump(&self.stats.filtered_by_phase);
                continue;
            }

            let callback = &subscription.callback;
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                callback(&envelope.data, responder.as_ref());
            }));

            match outcome {
                Ok(()) => {
                    invoked += 1;
                    DispatchStats::bump(&self.stats.callbacks_invoked);
                }
                Err(payload) => {
                    DispatchStats::bump(&self.stats.callback_panics);
                    error!(
                        embed_id = %embed_id,
                        event_type = %envelope.kind,
                        panic = %panic_message(payload.as_ref()),
                        "Subscriber callback panicked, continuing delivery"
                    );
                }
            }
        }

        trace!(
            embed_id = %embed_id,
            event_type = %envelope.kind,
            phase = ?phase,
            invoked,
            filtered,
            "Dispatched inbound message"
        );

        DispatchOutcome::Delivered { invoked, filtered }
    }
}

impl Drop for RegistryInner {
    fn drop(&mut self) {
        if let Some(listener) = self.listener.get_mut().take() {
            listener.abort();
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
