//! # Inbound Messages
//!
//! What the host's messaging surface hands to the registry: the sender's
//! origin as reported by the transport, the raw payload, and the reply port
//! that came with it, if any.

use relay_types::{EnvelopeError, EventEnvelope, ReplyPort, TransportError};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::warn;

/// One message received on the shared inbound surface.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    /// Origin of the sending document, as reported by the transport.
    pub origin: String,
    /// Raw payload; expected to be an envelope but not trusted to be one.
    pub data: Value,
    /// Private reply port transferred with the message.
    pub port: Option<ReplyPort>,
}

impl InboundMessage {
    pub fn new(origin: impl Into<String>, data: Value) -> Self {
        Self {
            origin: origin.into(),
            data,
            port: None,
        }
    }

    /// Build a message from a typed envelope.
    pub fn from_envelope(
        origin: impl Into<String>,
        envelope: &EventEnvelope,
    ) -> Result<Self, EnvelopeError> {
        Ok(Self::new(origin, envelope.to_value()?))
    }

    /// Attach the reply port the remote side transferred.
    #[must_use]
    pub fn with_port(mut self, port: ReplyPort) -> Self {
        self.port = Some(port);
        self
    }
}

/// Cloneable sending handle onto the registry's inbound surface.
///
/// This is what a transport adapter holds to feed messages into the host.
#[derive(Debug, Clone)]
pub struct Inbox {
    sender: mpsc::Sender<InboundMessage>,
    capacity: usize,
}

impl Inbox {
    pub(crate) fn new(sender: mpsc::Sender<InboundMessage>, capacity: usize) -> Self {
        Self { sender, capacity }
    }

    /// Enqueue without waiting. A full inbox drops the message: delivery is
    /// not guaranteed across the boundary.
    pub fn post(&self, message: InboundMessage) -> Result<(), TransportError> {
        self.sender.try_send(message).map_err(|e| match e {
            mpsc::error::TrySendError::Full(dropped) => {
                warn!(
                    origin = %dropped.origin,
                    capacity = self.capacity,
                    "Inbound surface full, message dropped"
                );
                TransportError::Full {
                    capacity: self.capacity,
                }
            }
            mpsc::error::TrySendError::Closed(_) => TransportError::Closed,
        })
    }

    /// Enqueue, waiting for room.
    pub async fn send(&self, message: InboundMessage) -> Result<(), TransportError> {
        self.sender
            .send(message)
            .await
            .map_err(|_| TransportError::Closed)
    }

    /// Whether the registry stopped listening.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
