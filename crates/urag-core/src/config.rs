//! Configuration types for urag
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::traits::DEFAULT_PROXY_BASE;

/// Main urag configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UragConfig {
    /// Resolver settings
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Key/value store backing the local caches
    #[serde(default)]
    pub store: StoreConfig,

    /// Where the shareable state is written
    #[serde(default)]
    pub share: ShareConfig,

    /// Upstream transport settings
    #[serde(default)]
    pub sources: SourcesConfig,
}

impl UragConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.resolver.validate()?;
        self.store.validate()?;
        self.share.validate()?;
        self.sources.validate()?;
        Ok(())
    }
}

/// Resolver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Slots per batch when the request does not say
    #[serde(default = "default_count")]
    pub default_count: usize,

    /// Largest accepted slot count
    #[serde(default = "default_max_count")]
    pub max_count: usize,

    /// Optional per-slot timeout in seconds
    ///
    /// Unset means fetches are bounded only by the transport's own behavior.
    #[serde(default)]
    pub slot_timeout_secs: Option<u64>,

    /// Capacity of the resolver event channel
    ///
    /// When full, new events are dropped with a warning log.
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl ResolverConfig {
    /// Validate the resolver configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.default_count == 0 {
            return Err(crate::Error::config("Default slot count must be > 0"));
        }
        if self.default_count > self.max_count {
            return Err(crate::Error::config(format!(
                "Default slot count {} exceeds maximum {}",
                self.default_count, self.max_count
            )));
        }
        if self.slot_timeout_secs == Some(0) {
            return Err(crate::Error::config("Slot timeout must be > 0 when set"));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }
        Ok(())
    }

    /// Per-slot timeout as a duration
    pub fn slot_timeout(&self) -> Option<Duration> {
        self.slot_timeout_secs.map(Duration::from_secs)
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            default_count: default_count(),
            max_count: default_max_count(),
            slot_timeout_secs: None,
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

/// Key/value store configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreConfig {
    /// File-based store
    File {
        /// Path to the store file
        path: String,
    },

    /// In-memory store (not persistent)
    #[default]
    Memory,
}

impl StoreConfig {
    /// Validate the store configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            StoreConfig::File { path } if path.is_empty() => {
                Err(crate::Error::config("Store file path cannot be empty"))
            }
            _ => Ok(()),
        }
    }
}

/// Share channel configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShareConfig {
    /// Share state written to a file
    File {
        /// Path to the share file
        path: String,
    },

    /// Share state kept in memory
    #[default]
    Memory,
}

impl ShareConfig {
    /// Validate the share configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            ShareConfig::File { path } if path.is_empty() => {
                Err(crate::Error::config("Share file path cannot be empty"))
            }
            _ => Ok(()),
        }
    }
}

/// Upstream transport configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// CORS relay prefix; the target URL is appended verbatim
    #[serde(default = "default_proxy_base")]
    pub proxy_base: String,
}

impl SourcesConfig {
    /// Validate the sources configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if !self.proxy_base.starts_with("https://") && !self.proxy_base.starts_with("http://") {
            return Err(crate::Error::config(format!(
                "Proxy base must use HTTP or HTTPS scheme. Got: {}",
                self.proxy_base
            )));
        }
        Ok(())
    }
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            proxy_base: default_proxy_base(),
        }
    }
}

fn default_count() -> usize {
    1
}

fn default_max_count() -> usize {
    12
}

fn default_event_channel_capacity() -> usize {
    256
}

fn default_proxy_base() -> String {
    DEFAULT_PROXY_BASE.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(UragConfig::new().validate().is_ok());
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: UragConfig = serde_json::from_str(
            r#"{ "store": { "type": "file", "path": "/tmp/urag.json" }, "resolver": { "slot_timeout_secs": 5 } }"#,
        )
        .unwrap();

        assert!(matches!(config.store, StoreConfig::File { .. }));
        assert_eq!(config.resolver.default_count, 1);
        assert_eq!(config.resolver.slot_timeout(), Some(Duration::from_secs(5)));
        assert_eq!(config.sources.proxy_base, DEFAULT_PROXY_BASE);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = UragConfig::new();
        config.resolver.default_count = 0;
        assert!(config.validate().is_err());

        let mut config = UragConfig::new();
        config.resolver.default_count = 20;
        assert!(config.validate().is_err());

        let mut config = UragConfig::new();
        config.store = StoreConfig::File {
            path: String::new(),
        };
        assert!(config.validate().is_err());

        let mut config = UragConfig::new();
        config.sources.proxy_base = "ftp://relay".to_string();
        assert!(config.validate().is_err());
    }
}
