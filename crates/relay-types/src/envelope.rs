//! # Wire Envelope
//!
//! The one shape every boundary message takes:
//!
//! ```text
//! { "type": string, "data": any, "status"?: "start" | "end", "embedId"?: string }
//! ```
//!
//! Replies over a private port use `{ "data": any }`; a `data.error` field
//! marks a remote-side failure.

use crate::errors::EnvelopeError;
use crate::events::{EmbedEvent, HostEvent};
use crate::id::EmbedId;
use crate::phase::{ActionPhase, EventStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A message crossing the embed boundary, keyed by its kind `K`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<K> {
    /// Message kind. Older remote builds send `__type`.
    #[serde(rename = "type", alias = "__type")]
    pub kind: K,

    /// Opaque payload.
    #[serde(default)]
    pub data: Value,

    /// Two-phase marker; absent means terminal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<EventStatus>,

    /// Routing key naming the embed instance.
    #[serde(rename = "embedId", default, skip_serializing_if = "Option::is_none")]
    pub embed_id: Option<EmbedId>,
}

/// Envelope emitted by an embedded document.
pub type EventEnvelope = Envelope<EmbedEvent>;

/// Envelope of a command posted by the host.
pub type CommandEnvelope = Envelope<HostEvent>;

impl<K> Envelope<K> {
    /// Envelope with no status and no embed id.
    pub fn new(kind: K, data: Value) -> Self {
        Self {
            kind,
            data,
            status: None,
            embed_id: None,
        }
    }

    /// Address the envelope to an embed instance.
    #[must_use]
    pub fn with_embed_id(mut self, embed_id: EmbedId) -> Self {
        self.embed_id = Some(embed_id);
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: EventStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Phase this envelope announces.
    pub fn phase(&self) -> ActionPhase {
        ActionPhase::from_status(self.status)
    }

    /// Routing key, or an error for unaddressed messages.
    pub fn require_embed_id(&self) -> Result<&EmbedId, EnvelopeError> {
        self.embed_id.as_ref().ok_or(EnvelopeError::MissingEmbedId)
    }
}

impl<K: Serialize> Envelope<K> {
    pub fn to_value(&self) -> Result<Value, EnvelopeError> {
        Ok(serde_json::to_value(self)?)
    }
}

impl<K: for<'de> Deserialize<'de>> Envelope<K> {
    /// Decode an envelope from a raw message payload.
    pub fn from_value(value: Value) -> Result<Self, EnvelopeError> {
        Ok(serde_json::from_value(value)?)
    }
}

/// A reply posted over a private reply port.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyEnvelope {
    #[serde(default)]
    pub data: Value,
}

impl ReplyEnvelope {
    pub fn new(data: Value) -> Self {
        Self { data }
    }

    /// Remote-reported failure carried in `data.error`, if any.
    pub fn error(&self) -> Option<&Value> {
        self.data.get("error")
    }

    /// Split into the success payload or the remote error value.
    pub fn into_result(self) -> Result<Value, Value> {
        match self.data {
            Value::Object(mut map) if map.contains_key("error") => {
                Err(map.remove("error").unwrap_or(Value::Null))
            }
            data => Ok(data),
        }
    }
}
