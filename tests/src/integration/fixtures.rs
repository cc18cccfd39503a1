//! Shared test fixtures.

use parking_lot::Mutex;
use relay_bus::{InboundMessage, Registry, Responder};
use relay_host::testing::MockFrame;
use relay_host::{EmbedInstance, HostConfig, RemoteFrame};
use relay_types::{EmbedEvent, EmbedId, EventEnvelope, EventStatus};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

pub const ORIGIN: &str = "https://embed.example.com";

pub fn embed(registry: &Registry, frame: &Arc<MockFrame>) -> EmbedInstance {
    embed_with(registry, frame, HostConfig::default())
}

pub fn embed_with(registry: &Registry, frame: &Arc<MockFrame>, host: HostConfig) -> EmbedInstance {
    EmbedInstance::builder(registry)
        .target(Arc::clone(frame) as Arc<dyn RemoteFrame>)
        .expected_origin(ORIGIN)
        .host_config(host)
        .build()
        .expect("embed instance")
}

/// An inbound event from `ORIGIN` addressed to `embed_id`.
pub fn event(embed_id: &EmbedId, kind: EmbedEvent, status: Option<EventStatus>, data: Value) -> InboundMessage {
    let mut envelope = EventEnvelope::new(kind, data).with_embed_id(embed_id.clone());
    envelope.status = status;
    InboundMessage::from_envelope(ORIGIN, &envelope).expect("encodable envelope")
}

/// Records which subscriptions fired, in order.
#[derive(Clone, Default)]
pub struct Recorder {
    log: Arc<Mutex<Vec<(&'static str, Value)>>>,
}

impl Recorder {
    pub fn callback(&self, tag: &'static str) -> impl Fn(&Value, Option<&Responder>) + Send + Sync + 'static {
        let log = Arc::clone(&self.log);
        move |data, _| log.lock().push((tag, data.clone()))
    }

    pub fn tags(&self) -> Vec<&'static str> {
        self.log.lock().iter().map(|(tag, _)| *tag).collect()
    }

    pub fn payloads(&self) -> Vec<Value> {
        self.log.lock().iter().map(|(_, data)| data.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.log.lock().len()
    }
}

/// Wait (bounded) until `condition` holds, yielding to the listener task.
pub async fn eventually(condition: impl Fn() -> bool) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while !condition() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("condition not reached");
}
