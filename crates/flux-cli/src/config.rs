//! Workspace configuration, read from `.flux/config.toml`.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CliConfig {
    #[serde(default)]
    pub quote: QuoteConfig,
    #[serde(default)]
    pub webhook: WebhookConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteConfig {
    /// Default tax rate, percent.
    #[serde(default = "default_tax_rate")]
    pub tax_rate: f64,
    /// Default validity window for new quotes, days.
    #[serde(default = "default_valid_days")]
    pub valid_days: i64,
}

impl Default for QuoteConfig {
    fn default() -> Self {
        Self {
            tax_rate: default_tax_rate(),
            valid_days: default_valid_days(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Per-request delivery timeout, seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Delivery records older than this are pruned by `webhook prune`.
    #[serde(default = "default_retention_days")]
    pub retention_days: i64,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            retention_days: default_retention_days(),
        }
    }
}

fn default_tax_rate() -> f64 {
    10.0
}

fn default_valid_days() -> i64 {
    flux_core::quote::DEFAULT_VALID_DAYS
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_retention_days() -> i64 {
    flux_core::store::DEFAULT_RETENTION_DAYS
}

impl CliConfig {
    /// Load from `config.toml` in the workspace dir; missing file means
    /// defaults.
    pub fn load(flux_dir: &Path) -> anyhow::Result<Self> {
        let path = flux_dir.join("config.toml");
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
    }

    /// Write the default config, used by `flux init`.
    pub fn write_default(flux_dir: &Path) -> anyhow::Result<()> {
        let path = flux_dir.join("config.toml");
        let body = toml::to_string_pretty(&Self::default())?;
        std::fs::write(&path, body).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }
}
