//! # Embed Instance
//!
//! One embedded document as seen by the host: its identity, the frame it is
//! rendered in, the origin it is trusted from, its subscriptions, and its
//! outstanding triggers.
//!
//! ```rust,ignore
//! let registry = Registry::default();
//! registry.init()?;
//!
//! let embed = EmbedInstance::builder(&registry)
//!     .target(frame)
//!     .expected_origin("https://embed.example.com")
//!     .build()?;
//!
//! embed
//!     .on(EmbedEvent::Load, |data, _| info!(?data, "loaded"), SubscribeOptions::default())
//!     .on(EmbedEvent::Save, on_save, SubscribeOptions::start());
//!
//! let response = embed.trigger(HostEvent::Search, json!({ "q": "sales" }))?.await?;
//! ```

use crate::command::{CommandSpec, Delivery};
use crate::config::{EmbedConfig, HostConfig};
use crate::error::ConfigError;
use crate::frame::RemoteFrame;
use crate::pending::{PendingRequestStore, PendingStatsSnapshot};
use crate::trigger::{PendingTrigger, SettleContext, TriggerResponse};
use relay_bus::{Registry, Responder, Route, SubscribeOptions, SubscriptionTable};
use relay_types::{CommandEnvelope, EmbedEvent, EmbedId, HostEvent, Origin};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Handle to one live embedded document.
///
/// Dropping the handle destroys the instance.
pub struct EmbedInstance {
    id: EmbedId,
    target: Arc<dyn RemoteFrame>,
    expected_origin: Origin,
    config: HostConfig,
    registry: Registry,
    subscriptions: Arc<SubscriptionTable>,
    pending: Arc<PendingRequestStore>,
    destroyed: AtomicBool,
}

/// Builder for [`EmbedInstance`].
#[must_use]
pub struct EmbedInstanceBuilder {
    registry: Registry,
    target: Option<Arc<dyn RemoteFrame>>,
    config: EmbedConfig,
}

impl EmbedInstanceBuilder {
    /// Frame the document is rendered in.
    pub fn target(mut self, target: Arc<dyn RemoteFrame>) -> Self {
        self.target = Some(target);
        self
    }

    /// Origin the document is served from.
    pub fn expected_origin(mut self, origin: impl Into<String>) -> Self {
        self.config.expected_origin = Some(origin.into());
        self
    }

    pub fn host_config(mut self, host: HostConfig) -> Self {
        self.config.host = host;
        self
    }

    /// Replace the whole per-instance configuration.
    pub fn config(mut self, config: EmbedConfig) -> Self {
        self.config = config;
        self
    }

    /// Resolve target and origin, then register with the registry.
    ///
    /// Fails if the host configuration disagrees with the registry on
    /// origin enforcement or inbox capacity.
    pub fn build(self) -> Result<EmbedInstance, ConfigError> {
        let target = self.target.ok_or(ConfigError::MissingTarget)?;
        let raw_origin = self
            .config
            .expected_origin
            .or_else(|| target.source())
            .ok_or(ConfigError::MissingOrigin)?;
        let expected_origin = Origin::parse(&raw_origin)?;
        self.config.host.validate()?;
        self.config.host.check_registry(&self.registry.config())?;

        let id = EmbedId::generate();
        let subscriptions = Arc::new(SubscriptionTable::new());
        self.registry.register(Route {
            embed_id: id.clone(),
            expected_origin: expected_origin.clone(),
            table: Arc::clone(&subscriptions),
        })?;

        info!(
            embed_id = %id,
            expected_origin = %expected_origin,
            trigger_timeout_ms = self.config.host.trigger_timeout_ms,
            "Embed instance created"
        );

        Ok(EmbedInstance {
            id,
            target,
            expected_origin,
            config: self.config.host,
            registry: self.registry,
            subscriptions,
            pending: Arc::new(PendingRequestStore::new()),
            destroyed: AtomicBool::new(false),
        })
    }
}

impl EmbedInstance {
    pub fn builder(registry: &Registry) -> EmbedInstanceBuilder {
        EmbedInstanceBuilder {
            registry: registry.clone(),
            target: None,
            config: EmbedConfig::default(),
        }
    }

    /// Subscribe to an event kind. `EmbedEvent::All` receives every message.
    ///
    /// Callbacks run in registration order; registering the same callback
    /// twice makes it fire twice.
    pub fn on<F>(&self, event_type: EmbedEvent, callback: F, options: SubscribeOptions) -> &Self
    where
        F: Fn(&Value, Option<&Responder>) + Send + Sync + 'static,
    {
        if self.is_destroyed() {
            warn!(
                embed_id = %self.id,
                event_type = %event_type,
                "Subscription on destroyed embed ignored"
            );
            return self;
        }

        debug!(
            embed_id = %self.id,
            event_type = %event_type,
            start = options.start,
            "Subscribed"
        );
        self.subscriptions
            .add(event_type, relay_bus::callback(callback), options);
        self
    }

    /// Send a command to the embedded document.
    ///
    /// Fails synchronously when the instance cannot post at all. Otherwise
    /// returns a future that settles per [`TriggerResponse`].
    pub fn trigger(&self, command: HostEvent, payload: Value) -> Result<PendingTrigger, ConfigError> {
        if self.is_destroyed() {
            return Err(ConfigError::Destroyed(self.id.clone()));
        }
        if !self.target.is_rendered() {
            return Err(ConfigError::NotRendered(self.id.clone()));
        }

        let spec = CommandSpec::resolve(&command);
        if spec.is_suppressed(&self.config) {
            warn!(
                embed_id = %self.id,
                command = %command,
                "Command disabled by configuration, not sent"
            );
            return Ok(PendingTrigger::ready(TriggerResponse::Suppressed));
        }

        match spec.delivery {
            Delivery::SourceReissue => {
                self.target.reissue_source()?;
                info!(embed_id = %self.id, command = %command, "Reissued embed source");
                Ok(PendingTrigger::ready(TriggerResponse::Dispatched))
            }
            Delivery::Reply => self.post_with_reply(command, payload),
        }
    }

    fn post_with_reply(&self, command: HostEvent, payload: Value) -> Result<PendingTrigger, ConfigError> {
        let timeout = self.config.trigger_timeout();
        let envelope = CommandEnvelope::new(command.clone(), payload).with_embed_id(self.id.clone());
        let (correlation_id, port, receiver) = self.pending.register(&command);

        if let Err(e) = self
            .target
            .post_message(envelope, &self.expected_origin, Some(port))
        {
            self.pending.cancel(&correlation_id);
            warn!(
                embed_id = %self.id,
                correlation_id = %correlation_id,
                command = %command,
                error = %e,
                "Failed to post command"
            );
            return Err(ConfigError::Transport(e));
        }

        debug!(
            embed_id = %self.id,
            correlation_id = %correlation_id,
            command = %command,
            "Posted command"
        );

        Ok(PendingTrigger::awaiting(
            Arc::clone(&self.pending),
            correlation_id,
            receiver,
            SettleContext {
                embed_id: self.id.clone(),
                command,
                timeout,
                deadline: Instant::now() + timeout,
            },
        ))
    }

    /// Tear the instance down: drop its route and subscriptions, and abandon
    /// outstanding triggers. The registry's listener is left running.
    ///
    /// Returns false if it was already destroyed.
    pub fn destroy(&self) -> bool {
        if self.destroyed.swap(true, Ordering::AcqRel) {
            return false;
        }

        self.registry.deregister(&self.id);
        let subscriptions = self.subscriptions.clear();
        let abandoned = self.pending.cancel_all();

        info!(
            embed_id = %self.id,
            subscriptions,
            abandoned,
            "Embed instance destroyed"
        );
        true
    }

    pub fn id(&self) -> &EmbedId {
        &self.id
    }

    pub fn expected_origin(&self) -> &Origin {
        &self.expected_origin
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::Acquire)
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Triggers still waiting for a reply.
    pub fn pending_count(&self) -> usize {
        self.pending.pending_count()
    }

    pub fn pending_stats(&self) -> PendingStatsSnapshot {
        self.pending.stats().snapshot()
    }
}

impl Drop for EmbedInstance {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl std::fmt::Debug for EmbedInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbedInstance")
            .field("id", &self.id)
            .field("expected_origin", &self.expected_origin)
            .field("destroyed", &self.is_destroyed())
            .finish_non_exhaustive()
    }
}
