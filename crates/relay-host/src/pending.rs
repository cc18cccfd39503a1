//! Pending Request Store - correlates triggers with the replies they await.
//!
//! Flow:
//! 1. `trigger` calls `register()` and gets a correlation id, a reply port
//!    bound to that id, and a oneshot receiver
//! 2. The reply port travels to the remote document with the command
//! 3. A reply posted on the port calls `complete()`, which removes the entry
//!    and wakes the receiver
//! 4. If the timer fires first, `expire()` removes the entry; a reply that
//!    arrives afterwards finds nothing and is counted as late
//!
//! An entry is removed exactly once, so a request is never settled twice.

use dashmap::DashMap;
use relay_types::{CorrelationId, HostEvent, ReplyEnvelope, ReplyPort, ReplySink};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Instant;
use tokio::sync::oneshot;
use tracing::debug;

/// A trigger waiting for its reply
struct PendingRequest {
    /// Channel to hand the reply to the awaiting trigger
    sender: oneshot::Sender<ReplyEnvelope>,
    /// When the trigger was registered
    created_at: Instant,
    /// Command name (for logging)
    command: HostEvent,
}

/// Statistics for pending request store
#[derive(Debug, Default)]
pub struct PendingStats {
    /// Total requests registered
    pub total_registered: AtomicU64,
    /// Total requests settled by a reply
    pub total_completed: AtomicU64,
    /// Total requests settled by the timer
    pub total_timeouts: AtomicU64,
    /// Total requests dropped without settling (future dropped, instance destroyed)
    pub total_cancelled: AtomicU64,
    /// Replies that arrived after their request was gone
    pub late_replies: AtomicU64,
}

/// Point-in-time copy of [`PendingStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PendingStatsSnapshot {
    pub total_registered: u64,
    pub total_completed: u64,
    pub total_timeouts: u64,
    pub total_cancelled: u64,
    pub late_replies: u64,
}

impl PendingStats {
    pub fn snapshot(&self) -> PendingStatsSnapshot {
        PendingStatsSnapshot {
            total_registered: self.total_registered.load(Ordering::Relaxed),
            total_completed: self.total_completed.load(Ordering::Relaxed),
            total_timeouts: self.total_timeouts.load(Ordering::Relaxed),
            total_cancelled: self.total_cancelled.load(Ordering::Relaxed),
            late_replies: self.late_replies.load(Ordering::Relaxed),
        }
    }
}

/// Outstanding triggers of one embed instance.
#[derive(Default)]
pub struct PendingRequestStore {
    pending: DashMap<CorrelationId, PendingRequest>,
    stats: PendingStats,
}

impl PendingRequestStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pending request.
    ///
    /// Returns the correlation id, the reply port to send along with the
    /// command, and the receiver the reply will arrive on.
    pub fn register(
        self: &Arc<Self>,
        command: &HostEvent,
    ) -> (CorrelationId, ReplyPort, oneshot::Receiver<ReplyEnvelope>) {
        let correlation_id = CorrelationId::new();
        let (tx, rx) = oneshot::channel();

        self.pending.insert(
            correlation_id,
            PendingRequest {
                sender: tx,
                created_at: Instant::now(),
                command: command.clone(),
            },
        );
        self.stats.total_registered.fetch_add(1, Ordering::Relaxed);

        debug!(
            correlation_id = %correlation_id,
            command = %command,
            "Registered pending request"
        );

        let port = ReplyPort::new(Arc::new(PendingSlot {
            store: Arc::downgrade(self),
            correlation_id,
        }));

        (correlation_id, port, rx)
    }

    /// Settle a pending request with the remote's reply.
    ///
    /// Returns false when the request is already gone (late reply) or the
    /// awaiting trigger was dropped.
    pub fn complete(&self, correlation_id: CorrelationId, reply: ReplyEnvelope) -> bool {
        let Some((_, pending)) = self.pending.remove(&correlation_id) else {
            self.stats.late_replies.fetch_add(1, Ordering::Relaxed);
            debug!(
                correlation_id = %correlation_id,
                "Reply for unknown or expired request dropped"
            );
            return false;
        };

        let response_time = pending.created_at.elapsed();
        match pending.sender.send(reply) {
            Ok(()) => {
                self.stats.total_completed.fetch_add(1, Ordering::Relaxed);
                debug!(
                    correlation_id = %correlation_id,
                    command = %pending.command,
                    response_time_ms = response_time.as_millis(),
                    "Completed pending request"
                );
                true
            }
            Err(_) => {
                // Receiver was dropped (trigger future dropped)
                self.stats.total_cancelled.fetch_add(1, Ordering::Relaxed);
                debug!(
                    correlation_id = %correlation_id,
                    command = %pending.command,
                    "Pending request receiver dropped"
                );
                false
            }
        }
    }

    /// Remove a request whose timer fired.
    pub fn expire(&self, correlation_id: &CorrelationId) -> bool {
        match self.pending.remove(correlation_id) {
            Some((_, pending)) => {
                self.stats.total_timeouts.fetch_add(1, Ordering::Relaxed);
                debug!(
                    correlation_id = %correlation_id,
                    command = %pending.command,
                    elapsed_ms = pending.created_at.elapsed().as_millis(),
                    "Pending request expired"
                );
                true
            }
            None => false,
        }
    }

    /// Cancel a pending request
    pub fn cancel(&self, correlation_id: &CorrelationId) -> bool {
        if self.pending.remove(correlation_id).is_some() {
            self.stats.total_cancelled.fetch_add(1, Ordering::Relaxed);
            true
        } else {
            false
        }
    }

    /// Cancel every pending request. Awaiting triggers wake up abandoned.
    pub fn cancel_all(&self) -> usize {
        let ids: Vec<CorrelationId> = self.pending.iter().map(|entry| *entry.key()).collect();
        ids.iter().filter(|id| self.cancel(id)).count()
    }

    /// Check if a correlation ID is pending
    pub fn is_pending(&self, correlation_id: &CorrelationId) -> bool {
        self.pending.contains_key(correlation_id)
    }

    /// Get number of currently pending requests
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Get statistics
    pub fn stats(&self) -> &PendingStats {
        &self.stats
    }
}

/// Reply sink bound to one pending entry.
///
/// Holds the store weakly: a port that outlives its instance just reports
/// itself closed.
struct PendingSlot {
    store: Weak<PendingRequestStore>,
    correlation_id: CorrelationId,
}

impl ReplySink for PendingSlot {
    fn deliver(&self, reply: ReplyEnvelope) -> bool {
        match self.store.upgrade() {
            Some(store) => store.complete(self.correlation_id, reply),
            None => false,
        }
    }

    fn is_closed(&self) -> bool {
        self.store
            .upgrade()
            .map_or(true, |store| !store.is_pending(&self.correlation_id))
    }
}
