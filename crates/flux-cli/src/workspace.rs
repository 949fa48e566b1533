//! Workspace discovery and store/dispatcher wiring.
//!
//! A flux workspace is a `.flux/` directory found by walking up from the
//! current directory: `flux.json` (data), `flux.lock` (advisory lock),
//! `config.toml` (settings).

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, bail};
use serde_json::Value;

use flux_core::Store;
use flux_core::hook::{Dispatcher, HttpDeliveryHandler};
use flux_core::model::EventKind;
use flux_core::storage::JsonFileStorage;

use crate::config::CliConfig;

pub const FLUX_DIR: &str = ".flux";
pub const DATA_FILE: &str = "flux.json";

/// An opened workspace: store, config, and an HTTP dispatcher.
pub struct Workspace {
    pub store: Store,
    pub config: CliConfig,
    dispatcher: Dispatcher,
}

impl Workspace {
    /// Walk up from the current directory and open the nearest workspace.
    pub fn discover() -> anyhow::Result<Self> {
        let cwd = std::env::current_dir().context("resolving current directory")?;
        let Some(flux_dir) = find_flux_dir(&cwd) else {
            bail!("not a flux workspace (run `flux init` first)");
        };
        Self::open(&flux_dir)
    }

    /// Open the workspace rooted at the given `.flux` directory.
    pub fn open(flux_dir: &Path) -> anyhow::Result<Self> {
        let config = CliConfig::load(flux_dir)?;
        let storage = JsonFileStorage::new(flux_dir.join(DATA_FILE));
        let store = Store::open(Box::new(storage))
            .with_context(|| format!("opening {}", flux_dir.display()))?;
        let handler =
            HttpDeliveryHandler::with_timeout(Duration::from_secs(config.webhook.timeout_secs));
        Ok(Self {
            store,
            config,
            dispatcher: Dispatcher::new(Box::new(handler)),
        })
    }

    /// Fire a synthetic payload at one webhook through the delivery path.
    pub fn send_test(
        &mut self,
        webhook_id: &str,
    ) -> anyhow::Result<Option<flux_core::model::WebhookDelivery>> {
        Ok(self.dispatcher.send_test(&mut self.store, webhook_id)?)
    }

    /// Fire a domain event at matching webhooks. Delivery failures are
    /// recorded per webhook and never fail the command; only a store
    /// persistence failure propagates.
    pub fn notify(
        &mut self,
        event: EventKind,
        data: Value,
        project_id: Option<&str>,
    ) -> anyhow::Result<()> {
        if self.store.webhooks().is_empty() {
            return Ok(());
        }
        let summary = self.dispatcher.trigger(&mut self.store, event, data, project_id)?;
        if summary.matched > 0 {
            tracing::debug!(
                event = %event,
                delivered = summary.delivered,
                failed = summary.failed,
                "webhooks notified"
            );
        }
        Ok(())
    }
}

/// Find the nearest `.flux` directory at or above `start`.
pub fn find_flux_dir(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        let candidate = current.join(FLUX_DIR);
        if candidate.is_dir() {
            return Some(candidate);
        }
        if !current.pop() {
            return None;
        }
    }
}
