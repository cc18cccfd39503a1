//! Error types for the host side.
//!
//! Three failure channels, kept apart on purpose:
//!
//! - [`ConfigError`]: returned synchronously by `build()` and `trigger()`.
//! - [`RemoteError`]: the remote document answered with `data.error`.
//! - [`TimeoutError`]: not an `Err` at all; carried inside
//!   `TriggerResponse::TimedOut`.

use relay_bus::RegistryError;
use relay_types::{EmbedId, HostEvent, OriginError, TransportError};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Errors detected before anything is awaited.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No target frame to embed into")]
    MissingTarget,

    #[error("No expected origin for the embedded document")]
    MissingOrigin,

    #[error("Invalid expected origin: {0}")]
    InvalidOrigin(#[from] OriginError),

    #[error("Embed {0} is not rendered")]
    NotRendered(EmbedId),

    #[error("Embed {0} has been destroyed")]
    Destroyed(EmbedId),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("Failed to read config file {path}: {error}")]
    Io { path: String, error: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),
}

/// Failure reported by the remote document in a reply's `data.error`.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Remote error: {0}")]
pub struct RemoteError(pub Value);

impl RemoteError {
    pub fn value(&self) -> &Value {
        &self.0
    }

    /// The error as text when the remote sent a plain string.
    pub fn message(&self) -> Option<&str> {
        self.0.as_str()
    }
}

/// No reply arrived before the trigger timeout.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{command} got no reply within {timeout:?}")]
pub struct TimeoutError {
    pub command: HostEvent,
    pub timeout: Duration,
}
