//! # Two-Phase Events
//!
//! A remote action may be announced twice: once when it starts and once when
//! it completes. The wire carries this as an optional `status` field; the host
//! reduces it to an [`ActionPhase`] and decides delivery with the pure
//! [`should_deliver`] filter.
//!
//! ```text
//! Unstarted ──status:"start"──▶ Started ──status:"end" / absent──▶ Ended
//! ```
//!
//! Transitions are not validated. An `end` without a preceding `start` is
//! still terminal; the only cost of misordering is a missed start callback.

use serde::{Deserialize, Serialize};

/// Wire value of the envelope's `status` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Start,
    End,
}

/// Phase of one logical remote action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ActionPhase {
    /// Nothing announced yet.
    #[default]
    Unstarted,
    /// The remote side reported the action began.
    Started,
    /// The remote side reported the action finished.
    Ended,
}

impl ActionPhase {
    /// Phase announced by an inbound message. Untagged messages are terminal.
    pub fn from_status(status: Option<EventStatus>) -> Self {
        match status {
            Some(EventStatus::Start) => Self::Started,
            Some(EventStatus::End) | None => Self::Ended,
        }
    }
}

/// Whether a subscription receives a message in the given phase.
///
/// `Started` reaches only subscriptions that opted into start delivery;
/// `Ended` reaches every subscription; `Unstarted` reaches none.
pub fn should_deliver(phase: ActionPhase, deliver_on_start: bool) -> bool {
    match phase {
        ActionPhase::Unstarted => false,
        ActionPhase::Started => deliver_on_start,
        ActionPhase::Ended => true,
    }
}
