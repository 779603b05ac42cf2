//! Workload configuration.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use edge_sdk::edge_cache::CacheConfig;
use edge_sdk::edge_data::OriginMap;
use edge_sdk::edge_observability::LoggingConfig;
use edge_sdk::edge_security::RuleSet;

/// Configuration embedded at build time.
pub const EMBEDDED_CONFIG: &str = include_str!("../edge.toml");

/// Edge router configuration file (`edge.toml`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeConfig {
    /// Cache keying and freshness.
    pub cache: CacheConfig,

    /// Hostname rewrites applied to origin fetches.
    #[serde(default)]
    pub origins: OriginMap,

    /// Conditional responses evaluated before the cache.
    #[serde(default)]
    pub rules: RuleSet,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl EdgeConfig {
    /// Parse and validate TOML.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse edge config")?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// The configuration compiled into the component.
    pub fn embedded() -> Result<Self> {
        Self::from_toml_str(EMBEDDED_CONFIG)
    }

    pub fn validate(&self) -> Result<()> {
        self.cache.validate().context("Invalid [cache] section")?;
        self.rules.validate().context("Invalid [[rules]]")?;
        Ok(())
    }
}
