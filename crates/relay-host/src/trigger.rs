//! # Trigger Settlement
//!
//! A reply-expecting trigger settles exactly once:
//!
//! | first event            | result                                  |
//! |------------------------|-----------------------------------------|
//! | reply `{data}`         | `Ok(TriggerResponse::Reply(data))`      |
//! | reply `{data: {error}}`| `Err(RemoteError(error))`               |
//! | timer                  | `Ok(TriggerResponse::TimedOut(..))`     |
//! | instance destroyed     | `Ok(TriggerResponse::Abandoned)`        |
//!
//! Timeouts are a soft outcome, not an `Err`: callers that only care about
//! remote failures can `?` the future and inspect the response.

use crate::error::{RemoteError, TimeoutError};
use crate::pending::PendingRequestStore;
use futures::future::BoxFuture;
use futures::FutureExt;
use relay_types::{CorrelationId, EmbedId, HostEvent, ReplyEnvelope};
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Default process-wide trigger timeout.
pub const DEFAULT_TRIGGER_TIMEOUT: Duration = Duration::from_secs(30);

/// How a trigger settled when it did not fail remotely.
#[derive(Debug, Clone, PartialEq)]
pub enum TriggerResponse {
    /// The remote answered.
    Reply(Value),
    /// No answer before the timeout.
    TimedOut(TimeoutError),
    /// Handled without a round trip (source reissue).
    Dispatched,
    /// Disabled by configuration; nothing reached the remote.
    Suppressed,
    /// The instance was destroyed while waiting.
    Abandoned,
}

impl TriggerResponse {
    pub fn is_timed_out(&self) -> bool {
        matches!(self, Self::TimedOut(_))
    }

    pub fn reply(&self) -> Option<&Value> {
        match self {
            Self::Reply(data) => Some(data),
            _ => None,
        }
    }

    /// Collapse to the reply payload, turning a timeout into an error.
    ///
    /// Outcomes without a payload map to `Ok(None)`.
    pub fn into_result(self) -> Result<Option<Value>, TimeoutError> {
        match self {
            Self::Reply(data) => Ok(Some(data)),
            Self::TimedOut(err) => Err(err),
            Self::Dispatched | Self::Suppressed | Self::Abandoned => Ok(None),
        }
    }
}

/// Future returned by `EmbedInstance::trigger`.
///
/// Dropping it before it settles removes the pending entry, whether or not it
/// was ever polled; a reply that arrives afterwards is discarded.
#[must_use = "a trigger settles only when awaited"]
pub struct PendingTrigger {
    inner: BoxFuture<'static, Result<TriggerResponse, RemoteError>>,
    cancel: Option<CancelOnDrop>,
}

impl PendingTrigger {
    /// Already settled.
    pub(crate) fn ready(response: TriggerResponse) -> Self {
        Self {
            inner: futures::future::ready(Ok(response)).boxed(),
            cancel: None,
        }
    }

    /// Settles on the reply for `correlation_id` or at `deadline`.
    pub(crate) fn awaiting(
        store: Arc<PendingRequestStore>,
        correlation_id: CorrelationId,
        receiver: oneshot::Receiver<ReplyEnvelope>,
        context: SettleContext,
    ) -> Self {
        let cancel = CancelOnDrop {
            store: Arc::clone(&store),
            correlation_id,
            armed: true,
        };
        Self {
            inner: settle(store, correlation_id, receiver, context).boxed(),
            cancel: Some(cancel),
        }
    }
}

impl Future for PendingTrigger {
    type Output = Result<TriggerResponse, RemoteError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let poll = self.inner.as_mut().poll(cx);
        if poll.is_ready() {
            if let Some(cancel) = self.cancel.take() {
                cancel.disarm();
            }
        }
        poll
    }
}

impl std::fmt::Debug for PendingTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingTrigger").finish_non_exhaustive()
    }
}

/// What a settling trigger needs to know besides its channel.
pub(crate) struct SettleContext {
    pub embed_id: EmbedId,
    pub command: HostEvent,
    pub timeout: Duration,
    /// Armed when the command was posted, not when first polled.
    pub deadline: Instant,
}

/// Removes the pending entry if the trigger is dropped unsettled.
struct CancelOnDrop {
    store: Arc<PendingRequestStore>,
    correlation_id: CorrelationId,
    armed: bool,
}

impl CancelOnDrop {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        if self.armed && self.store.cancel(&self.correlation_id) {
            debug!(
                correlation_id = %self.correlation_id,
                "Trigger dropped before settling"
            );
        }
    }
}

async fn settle(
    store: Arc<PendingRequestStore>,
    correlation_id: CorrelationId,
    receiver: oneshot::Receiver<ReplyEnvelope>,
    context: SettleContext,
) -> Result<TriggerResponse, RemoteError> {
    let outcome = tokio::time::timeout_at(context.deadline, receiver).await;

    match outcome {
        Ok(Ok(reply)) => match reply.into_result() {
            Ok(data) => Ok(TriggerResponse::Reply(data)),
            Err(error) => {
                debug!(
                    embed_id = %context.embed_id,
                    correlation_id = %correlation_id,
                    command = %context.command,
                    error = %error,
                    "Remote reported an error"
                );
                Err(RemoteError(error))
            }
        },
        Ok(Err(_)) => {
            debug!(
                embed_id = %context.embed_id,
                correlation_id = %correlation_id,
                command = %context.command,
                "Pending request cancelled"
            );
            Ok(TriggerResponse::Abandoned)
        }
        Err(_) => {
            store.expire(&correlation_id);
            warn!(
                embed_id = %context.embed_id,
                correlation_id = %correlation_id,
                command = %context.command,
                timeout_ms = context.timeout.as_millis(),
                "Trigger timed out waiting for a reply"
            );
            Ok(TriggerResponse::TimedOut(TimeoutError {
                command: context.command,
                timeout: context.timeout,
            }))
        }
    }
}
