//! Scripted [`RemoteFrame`] for tests.
//!
//! `MockFrame` records every posted command and answers according to its
//! [`ReplyMode`], standing in for an embedded document without a browser.

use crate::frame::RemoteFrame;
use parking_lot::Mutex;
use relay_types::{CommandEnvelope, Origin, ReplyEnvelope, ReplyPort, TransportError};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;

/// How the mock answers reply-expecting commands.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyMode {
    /// Reply with the command's own payload.
    Echo,
    /// Reply with a fixed payload.
    Reply(Value),
    /// Reply with `{ "error": value }`.
    Error(Value),
    /// Hold the port and never answer; see [`MockFrame::reply_to_held`].
    Silent,
    /// Echo after a delay, from a spawned task.
    Delayed(Duration),
}

/// One command the mock received.
#[derive(Debug, Clone)]
pub struct PostedCommand {
    pub envelope: CommandEnvelope,
    pub target_origin: Origin,
    pub had_port: bool,
}

pub struct MockFrame {
    mode: Mutex<ReplyMode>,
    rendered: AtomicBool,
    source: Mutex<Option<String>>,
    actual_origin: Mutex<Option<Origin>>,
    failure: Mutex<Option<TransportError>>,
    posted: Mutex<Vec<PostedCommand>>,
    held: Mutex<VecDeque<ReplyPort>>,
    reissues: AtomicUsize,
}

impl MockFrame {
    pub fn new(mode: ReplyMode) -> Arc<Self> {
        Arc::new(Self {
            mode: Mutex::new(mode),
            rendered: AtomicBool::new(true),
            source: Mutex::new(None),
            actual_origin: Mutex::new(None),
            failure: Mutex::new(None),
            posted: Mutex::new(Vec::new()),
            held: Mutex::new(VecDeque::new()),
            reissues: AtomicUsize::new(0),
        })
    }

    pub fn echo() -> Arc<Self> {
        Self::new(ReplyMode::Echo)
    }

    /// Report `source` as the frame's source URL.
    pub fn with_source(self: Arc<Self>, source: impl Into<String>) -> Arc<Self> {
        *self.source.lock() = Some(source.into());
        self
    }

    /// Pretend the document is served from `origin`; posts scoped to any
    /// other origin are silently not delivered.
    pub fn with_actual_origin(self: Arc<Self>, origin: Origin) -> Arc<Self> {
        *self.actual_origin.lock() = Some(origin);
        self
    }

    pub fn set_mode(&self, mode: ReplyMode) {
        *self.mode.lock() = mode;
    }

    pub fn set_rendered(&self, rendered: bool) {
        self.rendered.store(rendered, Ordering::Release);
    }

    /// Make every following post fail with `error`.
    pub fn fail_posts(&self, error: TransportError) {
        *self.failure.lock() = Some(error);
    }

    pub fn clear_failure(&self) {
        *self.failure.lock() = None;
    }

    pub fn posted(&self) -> Vec<PostedCommand> {
        self.posted.lock().clone()
    }

    pub fn reissue_count(&self) -> usize {
        self.reissues.load(Ordering::Acquire)
    }

    /// Ports held in [`ReplyMode::Silent`] and not yet answered.
    pub fn held_count(&self) -> usize {
        self.held.lock().len()
    }

    /// Answer the oldest held port. Returns whether the reply reached a
    /// waiting trigger.
    pub fn reply_to_held(&self, data: Value) -> bool {
        let port = self.held.lock().pop_front();
        port.is_some_and(|port| port.post(ReplyEnvelope::new(data)))
    }
}

impl RemoteFrame for MockFrame {
    fn is_rendered(&self) -> bool {
        self.rendered.load(Ordering::Acquire)
    }

    fn post_message(
        &self,
        envelope: CommandEnvelope,
        target_origin: &Origin,
        port: Option<ReplyPort>,
    ) -> Result<(), TransportError> {
        if let Some(error) = self.failure.lock().clone() {
            return Err(error);
        }

        let data = envelope.data.clone();
        self.posted.lock().push(PostedCommand {
            envelope,
            target_origin: target_origin.clone(),
            had_port: port.is_some(),
        });

        if let Some(actual) = self.actual_origin.lock().as_ref() {
            if actual != target_origin {
                return Ok(());
            }
        }

        let Some(port) = port else {
            return Ok(());
        };

        let mode = self.mode.lock().clone();
        match mode {
            ReplyMode::Echo => {
                port.post(ReplyEnvelope::new(data));
            }
            ReplyMode::Reply(value) => {
                port.post(ReplyEnvelope::new(value));
            }
            ReplyMode::Error(error) => {
                port.post(ReplyEnvelope::new(json!({ "error": error })));
            }
            ReplyMode::Silent => self.held.lock().push_back(port),
            ReplyMode::Delayed(delay) => match Handle::try_current() {
                Ok(runtime) => {
                    runtime.spawn(async move {
                        tokio::time::sleep(delay).await;
                        port.post(ReplyEnvelope::new(data));
                    });
                }
                Err(_) => self.held.lock().push_back(port),
            },
        }
        Ok(())
    }

    fn reissue_source(&self) -> Result<(), TransportError> {
        if let Some(error) = self.failure.lock().clone() {
            return Err(error);
        }
        self.reissues.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    fn source(&self) -> Option<String> {
        self.source.lock().clone()
    }
}

impl std::fmt::Debug for MockFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockFrame")
            .field("mode", &*self.mode.lock())
            .field("rendered", &self.is_rendered())
            .field("posted", &self.posted.lock().len())
            .finish_non_exhaustive()
    }
}
