//! Client configuration loaded from environment variables.
//!
//! Every setting has a default matching the shipped product, so nothing
//! needs to be set for normal use.

use causerie_shared::constants::{
    DISCOVER_CHANNEL_LIMIT, POPULAR_CHANNEL_LIMIT, TOPIC_NEW_NOTIFICATIONS,
};

use crate::projector::SectionLimits;

/// Default `tracing` filter when neither `RUST_LOG` nor `CAUSERIE_LOG` is set.
pub const DEFAULT_LOG_FILTER: &str = "causerie_client=debug,causerie_store=info,warn";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Event bus topic carrying notification pushes.
    /// Env: `CAUSERIE_NOTIFICATION_TOPIC`
    /// Default: `"newNotifications"`
    pub notification_topic: String,

    /// Size of the popular channel strip.
    /// Env: `CAUSERIE_POPULAR_LIMIT`
    /// Default: `8`
    pub popular_limit: usize,

    /// Discoverable channels shown once the user has joined something.
    /// Env: `CAUSERIE_DISCOVER_LIMIT`
    /// Default: `8`
    pub discover_limit: usize,

    /// `tracing` filter directive.  `RUST_LOG` takes precedence.
    /// Env: `CAUSERIE_LOG`
    pub log_filter: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            notification_topic: TOPIC_NEW_NOTIFICATIONS.to_string(),
            popular_limit: POPULAR_CHANNEL_LIMIT,
            discover_limit: DISCOVER_CHANNEL_LIMIT,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the environment in production).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(topic) = lookup("CAUSERIE_NOTIFICATION_TOPIC") {
            if topic.trim().is_empty() {
                tracing::warn!("Empty CAUSERIE_NOTIFICATION_TOPIC, using default");
            } else {
                config.notification_topic = topic;
            }
        }

        if let Some(val) = lookup("CAUSERIE_POPULAR_LIMIT") {
            match parse_limit(&val) {
                Ok(n) => config.popular_limit = n,
                Err(e) => tracing::warn!(value = %val, error = %e, "Invalid CAUSERIE_POPULAR_LIMIT, using default"),
            }
        }

        if let Some(val) = lookup("CAUSERIE_DISCOVER_LIMIT") {
            match parse_limit(&val) {
                Ok(n) => config.discover_limit = n,
                Err(e) => tracing::warn!(value = %val, error = %e, "Invalid CAUSERIE_DISCOVER_LIMIT, using default"),
            }
        }

        if let Some(filter) = lookup("CAUSERIE_LOG") {
            if !filter.is_empty() {
                config.log_filter = filter;
            }
        }

        config
    }

    pub fn limits(&self) -> SectionLimits {
        SectionLimits {
            popular: self.popular_limit,
            discover: self.discover_limit,
        }
    }
}

/// Section caps must be positive integers.
fn parse_limit(value: &str) -> Result<usize, String> {
    match value.trim().parse::<usize>() {
        Ok(0) => Err("limit must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}
