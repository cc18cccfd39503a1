//! # Subscription Table
//!
//! Per-instance map from event kind to the ordered list of callbacks
//! registered for it. Registration order is delivery order; duplicate
//! registrations are kept and each one fires.

use crate::responder::Responder;
use parking_lot::RwLock;
use relay_types::EmbedEvent;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A subscriber callback: receives the payload and, when the inbound message
/// carried a reply port, a responder bound to it.
pub type Callback = Arc<dyn Fn(&Value, Option<&Responder>) + Send + Sync>;

/// Box a closure as a [`Callback`].
pub fn callback<F>(f: F) -> Callback
where
    F: Fn(&Value, Option<&Responder>) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Delivery options for one subscription.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubscribeOptions {
    /// Also deliver `status: "start"` messages to this subscription.
    pub start: bool,
}

impl SubscribeOptions {
    /// Options opting into start-phase delivery.
    pub fn start() -> Self {
        Self { start: true }
    }
}

/// One registered callback.
#[derive(Clone)]
pub struct Subscription {
    pub event_type: EmbedEvent,
    pub callback: Callback,
    pub deliver_on_start: bool,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("event_type", &self.event_type)
            .field("deliver_on_start", &self.deliver_on_start)
            .finish_non_exhaustive()
    }
}

/// Ordered subscriptions of one embed instance.
#[derive(Default)]
pub struct SubscriptionTable {
    entries: RwLock<HashMap<EmbedEvent, Vec<Subscription>>>,
}

impl SubscriptionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a subscription to the list for `event_type`.
    pub fn add(&self, event_type: EmbedEvent, callback: Callback, options: SubscribeOptions) {
        let subscription = Subscription {
            event_type: event_type.clone(),
            callback,
            deliver_on_start: options.start,
        };
        self.entries
            .write()
            .entry(event_type)
            .or_default()
            .push(subscription);
    }

    /// Subscriptions matching `event_type`: its own list in registration
    /// order, followed by the wildcard list.
    ///
    /// Returns a snapshot, so callbacks may register more subscriptions
    /// while it is being delivered.
    pub fn matching(&self, event_type: &EmbedEvent) -> Vec<Subscription> {
        let entries = self.entries.read();
        let mut matched: Vec<Subscription> =
            entries.get(event_type).cloned().unwrap_or_default();
        if *event_type != EmbedEvent::All {
            if let Some(wildcard) = entries.get(&EmbedEvent::All) {
                matched.extend(wildcard.iter().cloned());
            }
        }
        matched
    }

    /// Total number of subscriptions across all kinds.
    pub fn len(&self) -> usize {
        self.entries.read().values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every subscription. Returns how many were removed.
    pub fn clear(&self) -> usize {
        let mut entries = self.entries.write();
        let removed = entries.values().map(Vec::len).sum();
        entries.clear();
        removed
    }
}

impl fmt::Debug for SubscriptionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionTable")
            .field("len", &self.len())
            .finish()
    }
}
