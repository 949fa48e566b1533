//! `flux webhook` — subscriptions, test deliveries, and history.

use anyhow::bail;
use clap::{Args, Subcommand};
use serde_json::json;
use std::io::Write;

use flux_core::model::{DeliveryStatus, EventKind};
use flux_core::store::{NewWebhook, WebhookPatch};

use crate::output::{OutputMode, kv, render};
use crate::workspace::Workspace;

#[derive(Subcommand, Debug)]
pub enum WebhookCmd {
    /// Register a webhook subscription.
    Add(AddArgs),
    /// List webhook subscriptions.
    List,
    /// Enable or disable a webhook.
    Enable(EnableArgs),
    /// Delete a webhook subscription.
    Rm(IdArg),
    /// Fire a synthetic payload at one webhook.
    Test(IdArg),
    /// Show delivery history, most recent first.
    Deliveries(DeliveriesArgs),
    /// Prune delivery records past the retention window.
    Prune(PruneArgs),
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Webhook name.
    pub name: String,

    /// Endpoint URL.
    #[arg(long)]
    pub url: String,

    /// Events to subscribe to (e.g. task.created), repeatable.
    #[arg(long = "event", required = true)]
    pub events: Vec<EventKind>,

    /// Signing secret for the `x-flux-signature` header.
    #[arg(long)]
    pub secret: Option<String>,

    /// Restrict to one project's events.
    #[arg(long)]
    pub project: Option<String>,
}

#[derive(Args, Debug)]
pub struct EnableArgs {
    /// Webhook id.
    pub id: String,

    /// true to enable, false to disable.
    pub enabled: bool,
}

#[derive(Args, Debug)]
pub struct IdArg {
    /// Webhook id.
    pub id: String,
}

#[derive(Args, Debug)]
pub struct DeliveriesArgs {
    /// Restrict to one webhook.
    #[arg(long)]
    pub webhook: Option<String>,

    /// Show at most this many records.
    #[arg(long, default_value_t = 20)]
    pub limit: usize,
}

#[derive(Args, Debug)]
pub struct PruneArgs {
    /// Override the configured retention window, in days.
    #[arg(long)]
    pub days: Option<i64>,
}

pub fn run(cmd: WebhookCmd, mode: OutputMode) -> anyhow::Result<()> {
    let mut ws = Workspace::discover()?;
    match cmd {
        WebhookCmd::Add(args) => {
            let webhook = ws.store.create_webhook(NewWebhook {
                name: args.name,
                url: args.url,
                secret: args.secret,
                events: args.events,
                project_id: args.project,
                enabled: None,
            })?;
            render(mode, &webhook, |h, w| {
                kv(w, "created", format!("{} ({})", h.name, h.id))
            })
        }
        WebhookCmd::List => {
            let webhooks = ws.store.webhooks().to_vec();
            render(mode, &webhooks, |webhooks, w| {
                for h in webhooks {
                    let events: Vec<&str> = h.events.iter().map(|e| e.as_str()).collect();
                    let state = if h.enabled { "on " } else { "off" };
                    let scope = h.project_id.as_deref().unwrap_or("*");
                    writeln!(
                        w,
                        "{}  {}  {:<20}  {}  [{}]",
                        h.id,
                        state,
                        h.name,
                        scope,
                        events.join(", ")
                    )?;
                }
                Ok(())
            })
        }
        WebhookCmd::Enable(args) => {
            let Some(webhook) = ws.store.update_webhook(
                &args.id,
                WebhookPatch {
                    enabled: Some(args.enabled),
                    ..WebhookPatch::default()
                },
            )?
            else {
                bail!("webhook '{}' not found", args.id);
            };
            render(mode, &webhook, |h, w| {
                kv(w, "enabled", if h.enabled { "true" } else { "false" })
            })
        }
        WebhookCmd::Rm(args) => {
            if !ws.store.delete_webhook(&args.id)? {
                bail!("webhook '{}' not found", args.id);
            }
            render(mode, &json!({ "deleted": args.id }), |v, w| {
                kv(w, "deleted", v["deleted"].as_str().unwrap_or(""))
            })
        }
        WebhookCmd::Test(args) => {
            let Some(delivery) = ws.send_test(&args.id)? else {
                bail!("webhook '{}' not found", args.id);
            };
            render(mode, &delivery, |d, w| {
                kv(w, "delivery", &d.id)?;
                kv(w, "status", d.status.to_string())?;
                match (&d.response_code, &d.error) {
                    (Some(code), _) => kv(w, "response", code.to_string()),
                    (None, Some(error)) => kv(w, "error", error),
                    (None, None) => Ok(()),
                }
            })
        }
        WebhookCmd::Deliveries(args) => {
            let mut records = ws.store.deliveries(args.webhook.as_deref());
            records.truncate(args.limit);
            render(mode, &records, |records, w| {
                for d in records {
                    let outcome = match d.status {
                        DeliveryStatus::Success => {
                            format!("{}", d.response_code.unwrap_or(0))
                        }
                        DeliveryStatus::Failed => {
                            d.error.clone().unwrap_or_else(|| "failed".to_string())
                        }
                        DeliveryStatus::Pending => "pending".to_string(),
                    };
                    writeln!(
                        w,
                        "{}  {}  {:<22}  {:<8}  {}",
                        d.id,
                        d.created_at.format("%Y-%m-%d %H:%M:%S"),
                        d.event.to_string(),
                        d.status.to_string(),
                        outcome
                    )?;
                }
                Ok(())
            })
        }
        WebhookCmd::Prune(args) => {
            let days = args.days.unwrap_or(ws.config.webhook.retention_days);
            let removed = ws
                .store
                .cleanup_old_deliveries(chrono::Duration::days(days))?;
            render(mode, &json!({ "removed": removed, "days": days }), |v, w| {
                kv(w, "removed", v["removed"].to_string())
            })
        }
    }
}
