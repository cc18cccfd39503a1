//! # Relay Host - Embed Instances and Request/Response over Message Passing
//!
//! The host side of the embed boundary. An [`EmbedInstance`] wraps one
//! embedded document: it subscribes to the events the document emits and
//! triggers commands on it, turning one-way posts into awaitable replies.
//!
//! ## Trigger Flow
//!
//! ```text
//! trigger(command, payload)
//!     │
//!     ├─ destroyed / not rendered ──────────────▶ Err(ConfigError)
//!     ├─ CommandSpec::resolve(command)
//!     │     ├─ gate disabled ───────────────────▶ Suppressed
//!     │     ├─ SourceReissue ─ reissue_source() ▶ Dispatched
//!     │     └─ Reply
//!     │          register pending (CorrelationId, ReplyPort)
//!     │          post_message(envelope, expected_origin, port)
//!     ▼
//! PendingTrigger ── reply ─────────▶ Reply(data) | Err(RemoteError)
//!                └─ timer ─────────▶ TimedOut
//! ```
//!
//! Inbound events travel the other way through the shared
//! [`Registry`](relay_bus::Registry), which every instance registers with.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod command;
pub mod config;
pub mod error;
pub mod frame;
pub mod instance;
pub mod pending;
pub mod trigger;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use command::{CommandSpec, Delivery, FeatureGate};
pub use config::{EmbedConfig, HostConfig, DEFAULT_TRIGGER_TIMEOUT_MS};
pub use error::{ConfigError, RemoteError, TimeoutError};
pub use frame::RemoteFrame;
pub use instance::{EmbedInstance, EmbedInstanceBuilder};
pub use pending::{PendingRequestStore, PendingStats, PendingStatsSnapshot};
pub use trigger::{PendingTrigger, TriggerResponse, DEFAULT_TRIGGER_TIMEOUT};

/// Registry built from host configuration.
pub fn registry_for(config: &HostConfig) -> Result<relay_bus::Registry, ConfigError> {
    config.validate()?;
    Ok(relay_bus::Registry::new(config.registry_config()))
}
