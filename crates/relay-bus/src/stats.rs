//! Dispatch counters.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters maintained by the registry's dispatcher.
#[derive(Debug, Default)]
pub struct DispatchStats {
    /// Messages that reached a live route and passed the origin check
    pub routed: AtomicU64,
    /// Individual callback invocations
    pub callbacks_invoked: AtomicU64,
    /// Callbacks skipped by the two-phase filter
    pub filtered_by_phase: AtomicU64,
    /// Payloads that were not envelopes
    pub malformed: AtomicU64,
    /// Envelopes naming no live embed instance
    pub unknown_embed: AtomicU64,
    /// Envelopes from an unexpected origin
    pub foreign_origin: AtomicU64,
    /// Callbacks that panicked
    pub callback_panics: AtomicU64,
}

/// Point-in-time copy of [`DispatchStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchStatsSnapshot {
    pub routed: u64,
    pub callbacks_invoked: u64,
    pub filtered_by_phase: u64,
    pub malformed: u64,
    pub unknown_embed: u64,
    pub foreign_origin: u64,
    pub callback_panics: u64,
}

impl DispatchStats {
    pub fn snapshot(&self) -> DispatchStatsSnapshot {
        DispatchStatsSnapshot {
            routed: self.routed.load(Ordering::Relaxed),
            callbacks_invoked: self.callbacks_invoked.load(Ordering::Relaxed),
            filtered_by_phase: self.filtered_by_phase.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            unknown_embed: self.unknown_embed.load(Ordering::Relaxed),
            foreign_origin: self.foreign_origin.load(Ordering::Relaxed),
            callback_panics: self.callback_panics.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

impl DispatchStatsSnapshot {
    /// Messages discarded before reaching any subscription table.
    pub fn discarded(&self) -> u64 {
        self.malformed + self.unknown_embed + self.foreign_origin
    }
}
