//! # Relay Types Crate
//!
//! Everything that crosses the boundary between a host and the sandboxed
//! documents it embeds.
//!
//! ## Design Principles
//!
//! - **Envelope First**: every message is an [`Envelope`] keyed by a typed
//!   event kind, with an `Unknown` passthrough for kinds this build does not
//!   know about.
//! - **Identity on the Envelope**: the `embedId` field is the only routing key;
//!   payloads are opaque JSON.
//! - **Ports, not Callbacks**: a reply travels over a [`ReplyPort`], a private
//!   single-use channel handed across the boundary with the request.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod envelope;
pub mod errors;
pub mod events;
pub mod id;
pub mod origin;
pub mod phase;
pub mod port;

pub use envelope::{CommandEnvelope, Envelope, EventEnvelope, ReplyEnvelope};
pub use errors::{EnvelopeError, OriginError, TransportError};
pub use events::{EmbedEvent, HostEvent};
pub use id::{CorrelationId, EmbedId};
pub use origin::Origin;
pub use phase::{should_deliver, ActionPhase, EventStatus};
pub use port::{reply_channel, ReplyPort, ReplyReceiver, ReplySink};
