//! # Relay Bus - Inbound Dispatch for Embed Instances
//!
//! One host page, many embedded documents, one inbound message surface.
//! The [`Registry`] owns that surface and demultiplexes every message to the
//! embed instance it names.
//!
//! ## Routing
//!
//! ```text
//! ┌──────────────┐   post    ┌──────────────┐
//! │ Embed A      │ ────────▶ │              │      ┌──────────────────┐
//! └──────────────┘           │   Inbox      │      │ Route A          │
//! ┌──────────────┐   post    │ (one shared  │ ───▶ │  SubscriptionTbl │
//! │ Embed B      │ ────────▶ │  listener)   │      ├──────────────────┤
//! └──────────────┘           │              │ ───▶ │ Route B          │
//!                            └──────────────┘      │  SubscriptionTbl │
//!                                   │              └──────────────────┘
//!                             Registry::dispatch
//!                  embedId → origin check → type (+ "*") → phase filter
//! ```
//!
//! ## Guarantees
//!
//! - Messages without a live `embedId`, from a foreign origin, or not shaped
//!   like an envelope are discarded and counted, never surfaced as errors.
//! - Callbacks run synchronously in registration order; a panicking callback
//!   is isolated and delivery continues.
//! - Tearing down one route never detaches the shared listener.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod inbound;
pub mod registry;
pub mod responder;
pub mod stats;
pub mod subscription;

// Re-export main types
pub use inbound::{InboundMessage, Inbox};
pub use registry::{DispatchOutcome, Registry, RegistryConfig, RegistryError, Route};
pub use responder::Responder;
pub use stats::{DispatchStats, DispatchStatsSnapshot};
pub use subscription::{callback, Callback, SubscribeOptions, Subscription, SubscriptionTable};

/// Default bound of the shared inbound channel.
pub const DEFAULT_INBOX_CAPACITY: usize = 1024;
