//! # Responder
//!
//! When the embedded document asks the host something, the inbound message
//! carries a reply port. Every callback invoked for that message receives the
//! same [`Responder`]; the first `respond` call posts the answer, later calls
//! are no-ops. Not answering at all is legal: the remote side's own timeout
//! governs that case.

use parking_lot::Mutex;
use relay_types::{EmbedEvent, EmbedId, ReplyEnvelope, ReplyPort};
use serde_json::Value;
use tracing::debug;

/// Answers one inbound request over its private reply port.
#[derive(Debug)]
pub struct Responder {
    port: Mutex<Option<ReplyPort>>,
    embed_id: EmbedId,
    event_type: EmbedEvent,
}

impl Responder {
    pub fn new(port: ReplyPort, embed_id: EmbedId, event_type: EmbedEvent) -> Self {
        Self {
            port: Mutex::new(Some(port)),
            embed_id,
            event_type,
        }
    }

    /// Post `data` back to the requester.
    ///
    /// Returns `true` only for the call that actually posted and reached a
    /// listener.
    pub fn respond(&self, data: Value) -> bool {
        let Some(port) = self.port.lock().take() else {
            debug!(
                embed_id = %self.embed_id,
                event_type = %self.event_type,
                "Responder already used, reply ignored"
            );
            return false;
        };

        let delivered = port.post(ReplyEnvelope::new(data));
        debug!(
            embed_id = %self.embed_id,
            event_type = %self.event_type,
            delivered,
            "Posted reply to inbound request"
        );
        delivered
    }

    /// Whether `respond` has already been called.
    pub fn is_spent(&self) -> bool {
        self.port.lock().is_none()
    }

    pub fn event_type(&self) -> &EmbedEvent {
        &self.event_type
    }
}
