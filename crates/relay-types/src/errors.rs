//! # Error Types
//!
//! Errors raised while parsing or moving messages across the embed boundary.

use thiserror::Error;

/// Errors from decoding a wire envelope.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// The payload is not a JSON object with a `type` key.
    #[error("Malformed envelope: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The envelope was addressed without an embed id.
    #[error("Envelope carries no embedId")]
    MissingEmbedId,
}

/// Errors from parsing an origin string.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OriginError {
    /// Empty input.
    #[error("Origin is empty")]
    Empty,

    /// Opaque origins (`"null"`, `file:`, `data:`) cannot be targeted.
    #[error("Opaque origin cannot be targeted")]
    Opaque,

    /// Not an absolute URL with a host.
    #[error("Origin {origin:?} is not a valid URL: {source}")]
    Invalid {
        origin: String,
        #[source]
        source: url::ParseError,
    },
}

/// Errors from posting to a remote document or a reply port.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The remote document is gone (frame removed from the page).
    #[error("Remote document detached")]
    Detached,

    /// The remote endpoint refused the message.
    #[error("Post rejected: {0}")]
    Rejected(String),

    /// The channel is closed.
    #[error("Channel closed")]
    Closed,

    /// A bounded channel is full.
    #[error("Channel full (capacity {capacity})")]
    Full { capacity: usize },
}
