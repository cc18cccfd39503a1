//! # Reply Ports
//!
//! A [`ReplyPort`] is one end of a private, single-use channel that travels
//! with a request. Whoever holds it can post a [`ReplyEnvelope`] back to the
//! requester; once the requester has stopped listening (reply received, timer
//! fired, instance gone) posting is a silent no-op.
//!
//! The port is a thin handle over a [`ReplySink`] so that the host can bind
//! ports straight into its pending-request store, while tests and remote-side
//! simulations use the standalone [`reply_channel`].

use crate::envelope::ReplyEnvelope;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tokio::sync::oneshot;

/// Receiving side behind a [`ReplyPort`].
pub trait ReplySink: Send + Sync {
    /// Deliver a reply. Returns `false` when nobody is listening anymore.
    fn deliver(&self, reply: ReplyEnvelope) -> bool;

    /// Whether the listening side has gone away.
    fn is_closed(&self) -> bool;
}

/// Sending end of a private reply channel.
#[derive(Clone)]
pub struct ReplyPort {
    sink: Arc<dyn ReplySink>,
}

impl ReplyPort {
    pub fn new(sink: Arc<dyn ReplySink>) -> Self {
        Self { sink }
    }

    /// Post a reply. Returns whether it reached a listener.
    pub fn post(&self, reply: ReplyEnvelope) -> bool {
        self.sink.deliver(reply)
    }

    pub fn is_closed(&self) -> bool {
        self.sink.is_closed()
    }
}

impl fmt::Debug for ReplyPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplyPort")
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Sink that forwards the first reply into a oneshot channel.
struct OneshotSink {
    sender: Mutex<Option<oneshot::Sender<ReplyEnvelope>>>,
}

impl ReplySink for OneshotSink {
    fn deliver(&self, reply: ReplyEnvelope) -> bool {
        match self.sender.lock().take() {
            Some(sender) => sender.send(reply).is_ok(),
            None => false,
        }
    }

    fn is_closed(&self) -> bool {
        self.sender
            .lock()
            .as_ref()
            .map_or(true, oneshot::Sender::is_closed)
    }
}

/// Receiving end of a standalone reply channel.
#[derive(Debug)]
pub struct ReplyReceiver {
    receiver: oneshot::Receiver<ReplyEnvelope>,
}

impl ReplyReceiver {
    /// Wait for the reply. `None` when the port was dropped unused.
    pub async fn recv(self) -> Option<ReplyEnvelope> {
        self.receiver.await.ok()
    }

    /// Take the reply if one has already arrived.
    pub fn try_recv(&mut self) -> Option<ReplyEnvelope> {
        self.receiver.try_recv().ok()
    }

    /// Stop listening; later posts on the port become no-ops.
    pub fn close(&mut self) {
        self.receiver.close();
    }
}

/// Create a standalone single-use reply channel.
pub fn reply_channel() -> (ReplyPort, ReplyReceiver) {
    let (sender, receiver) = oneshot::channel();
    let sink = OneshotSink {
        sender: Mutex::new(Some(sender)),
    };
    (
        ReplyPort::new(Arc::new(sink)),
        ReplyReceiver { receiver },
    )
}
