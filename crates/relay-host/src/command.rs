//! How each host command is delivered.
//!
//! Resolved once at the top of `trigger`, so the rest of the path never
//! special-cases command names.

use crate::config::HostConfig;
use relay_types::HostEvent;

/// Delivery strategy for one command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Post an envelope with a private reply port and await the answer.
    Reply,
    /// Reload the embedded document by reissuing its source. Nothing is
    /// posted and no reply is expected.
    SourceReissue,
}

/// Configuration switch that can suppress a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureGate {
    FullscreenPresentation,
}

impl FeatureGate {
    pub fn is_disabled(self, config: &HostConfig) -> bool {
        match self {
            Self::FullscreenPresentation => config.disable_fullscreen_presentation,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSpec {
    pub delivery: Delivery,
    pub gate: Option<FeatureGate>,
}

impl CommandSpec {
    pub fn resolve(command: &HostEvent) -> Self {
        match command {
            HostEvent::Reload => Self {
                delivery: Delivery::SourceReissue,
                gate: None,
            },
            HostEvent::Present => Self {
                delivery: Delivery::Reply,
                gate: Some(FeatureGate::FullscreenPresentation),
            },
            _ => Self {
                delivery: Delivery::Reply,
                gate: None,
            },
        }
    }

    /// Whether configuration suppresses this command.
    pub fn is_suppressed(&self, config: &HostConfig) -> bool {
        self.gate.is_some_and(|gate| gate.is_disabled(config))
    }
}
