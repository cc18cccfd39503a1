//! Host configuration.
//!
//! # Config File Format
//!
//! ```toml
//! trigger_timeout_ms = 30000
//! disable_fullscreen_presentation = false
//! strict_origin = true
//! inbox_capacity = 1024
//! ```
//!
//! Every key is optional. Environment overrides are applied on top with
//! [`HostConfig::apply_env`].

use crate::error::ConfigError;
use relay_bus::{RegistryConfig, DEFAULT_INBOX_CAPACITY};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Default process-wide trigger timeout in milliseconds.
pub const DEFAULT_TRIGGER_TIMEOUT_MS: u64 = 30_000;

/// Process-wide host settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// How long a reply-expecting trigger waits before settling as timed out.
    pub trigger_timeout_ms: u64,
    /// Suppress commands gated on fullscreen presentation.
    pub disable_fullscreen_presentation: bool,
    /// Discard inbound messages from an unexpected origin. Turn off only
    /// for local development frames.
    pub strict_origin: bool,
    /// Bound of the registry's inbound channel.
    pub inbox_capacity: usize,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            trigger_timeout_ms: DEFAULT_TRIGGER_TIMEOUT_MS,
            disable_fullscreen_presentation: false,
            strict_origin: true,
            inbox_capacity: DEFAULT_INBOX_CAPACITY,
        }
    }
}

impl HostConfig {
    pub fn trigger_timeout(&self) -> Duration {
        Duration::from_millis(self.trigger_timeout_ms)
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.trigger_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "trigger_timeout_ms",
                reason: "cannot be 0".into(),
            });
        }

        if self.inbox_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "inbox_capacity",
                reason: "cannot be 0".into(),
            });
        }

        Ok(())
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, parsed, or fails validation.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;

        Self::from_toml_str(&content)
    }

    /// Apply overrides from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `RELAY_TRIGGER_TIMEOUT_MS`: trigger timeout in milliseconds
    /// - `RELAY_DISABLE_FULLSCREEN`: suppress fullscreen presentation
    /// - `RELAY_STRICT_ORIGIN`: discard foreign-origin messages
    pub fn apply_env(self) -> Result<Self, ConfigError> {
        self.apply_overrides(|key| env::var(key).ok())
    }

    fn apply_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup("RELAY_TRIGGER_TIMEOUT_MS") {
            self.trigger_timeout_ms = raw.trim().parse().map_err(|_| ConfigError::Invalid {
                field: "RELAY_TRIGGER_TIMEOUT_MS",
                reason: format!("{raw:?} is not a number of milliseconds"),
            })?;
        }

        if let Some(raw) = lookup("RELAY_DISABLE_FULLSCREEN") {
            self.disable_fullscreen_presentation = parse_flag(&raw);
        }

        if let Some(raw) = lookup("RELAY_STRICT_ORIGIN") {
            self.strict_origin = parse_flag(&raw);
        }

        self.validate()?;
        Ok(self)
    }

    /// Settings for the registry this host feeds.
    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig {
            inbox_capacity: self.inbox_capacity,
            strict_origin: self.strict_origin,
        }
    }

    /// Fail when the registry-level settings differ from the registry's own.
    ///
    /// Origin enforcement and the inbox bound belong to the shared registry,
    /// so an instance cannot override them.
    pub fn check_registry(&self, registry: &RegistryConfig) -> Result<(), ConfigError> {
        if self.strict_origin != registry.strict_origin {
            return Err(ConfigError::Invalid {
                field: "strict_origin",
                reason: format!(
                    "is {} but the registry was built with {}",
                    self.strict_origin, registry.strict_origin
                ),
            });
        }

        if self.inbox_capacity != registry.inbox_capacity {
            return Err(ConfigError::Invalid {
                field: "inbox_capacity",
                reason: format!(
                    "is {} but the registry was built with {}",
                    self.inbox_capacity, registry.inbox_capacity
                ),
            });
        }

        Ok(())
    }
}

fn parse_flag(raw: &str) -> bool {
    let raw = raw.trim().to_lowercase();
    raw == "true" || raw == "1" || raw == "yes"
}

/// Per-instance settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbedConfig {
    /// Origin the embedded document is served from. When absent it is
    /// derived from the target frame's source.
    pub expected_origin: Option<String>,
    /// Host-wide settings this instance inherits.
    pub host: HostConfig,
}

impl EmbedConfig {
    pub fn new(expected_origin: impl Into<String>) -> Self {
        Self {
            expected_origin: Some(expected_origin.into()),
            host: HostConfig::default(),
        }
    }

    #[must_use]
    pub fn with_host(mut self, host: HostConfig) -> Self {
        self.host = host;
        self
    }
}
