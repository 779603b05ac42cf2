//! Cache layer configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::policy::FreshnessPolicy;

/// Invalid cache configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("alt_hostname must not be empty")]
    EmptyAltHostname,

    #[error("alt_hostname {host:?} is not a valid host: {reason}")]
    InvalidAltHostname { host: String, reason: String },
}

/// Settings for the cache orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Hostname substituted into keys for idempotent requests.
    pub alt_hostname: String,
    /// `max-age` appended to idempotent origin responses.
    #[serde(default = "default_freshness_ttl_secs")]
    pub freshness_ttl_secs: u64,
    /// Allow `X-Debug-Cache: 1` requests to receive cache debug headers.
    #[serde(default)]
    pub debug_headers: bool,
    /// Retention for stored responses that carry no `max-age`.
    #[serde(default = "default_retention_secs")]
    pub default_retention_secs: u64,
}

fn default_freshness_ttl_secs() -> u64 {
    10
}

fn default_retention_secs() -> u64 {
    60
}

impl CacheConfig {
    /// Create a configuration with default freshness and retention.
    pub fn new(alt_hostname: impl Into<String>) -> Self {
        Self {
            alt_hostname: alt_hostname.into(),
            freshness_ttl_secs: default_freshness_ttl_secs(),
            debug_headers: false,
            default_retention_secs: default_retention_secs(),
        }
    }

    pub fn freshness_policy(&self) -> FreshnessPolicy {
        FreshnessPolicy::new(Duration::from_secs(self.freshness_ttl_secs))
    }

    pub fn default_retention(&self) -> Duration {
        Duration::from_secs(self.default_retention_secs)
    }

    /// Check the alternate hostname can be put into a URL.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let host = self.alt_hostname.trim();
        if host.is_empty() {
            return Err(ConfigError::EmptyAltHostname);
        }
        url::Host::parse(host).map_err(|e| ConfigError::InvalidAltHostname {
            host: self.alt_hostname.clone(),
            reason: e.to_string(),
        })?;
        Ok(())
    }
}
