use chrono::{DateTime, Duration, Utc};
use tracing::info;

use super::Store;
use crate::error::CoreError;
use crate::id::{self, prefix};
use crate::model::{DeliveryStatus, EventKind, Webhook, WebhookDelivery};

/// Delivery records older than this are pruned by default.
pub const DEFAULT_RETENTION_DAYS: i64 = 7;

/// Fields for a new webhook subscription. Enabled by default.
#[derive(Debug, Clone)]
pub struct NewWebhook {
    pub name: String,
    pub url: String,
    pub secret: Option<String>,
    pub events: Vec<EventKind>,
    pub project_id: Option<String>,
    pub enabled: Option<bool>,
}

/// Partial update; `None` fields keep their current value.
///
/// `secret` and `project_id` are doubly optional: `Some(None)` clears the
/// secret / unscopes the webhook.
#[derive(Debug, Clone, Default)]
pub struct WebhookPatch {
    pub name: Option<String>,
    pub url: Option<String>,
    pub secret: Option<Option<String>>,
    pub events: Option<Vec<EventKind>>,
    pub project_id: Option<Option<String>>,
    pub enabled: Option<bool>,
}

/// Bookkeeping written back onto a delivery record after an attempt.
#[derive(Debug, Clone, Default)]
pub struct DeliveryUpdate {
    pub status: Option<DeliveryStatus>,
    pub response_code: Option<u16>,
    pub response_body: Option<String>,
    pub error: Option<String>,
    pub attempts: Option<u32>,
    pub delivered_at: Option<DateTime<Utc>>,
}

impl Store {
    #[must_use]
    pub fn webhooks(&self) -> &[Webhook] {
        &self.data.webhooks
    }

    #[must_use]
    pub fn webhook(&self, id: &str) -> Option<&Webhook> {
        self.data.webhooks.iter().find(|w| w.id == id)
    }

    /// Webhooks whose subscription filter matches the event, cloned so the
    /// dispatcher can mutate the store while iterating.
    #[must_use]
    pub fn webhooks_matching(&self, event: EventKind, project_id: Option<&str>) -> Vec<Webhook> {
        self.data
            .webhooks
            .iter()
            .filter(|w| w.matches(event, project_id))
            .cloned()
            .collect()
    }

    pub fn create_webhook(&mut self, new: NewWebhook) -> Result<Webhook, CoreError> {
        let now = Utc::now();
        let webhook = Webhook {
            id: id::new_id(prefix::WEBHOOK),
            name: new.name,
            url: new.url,
            secret: new.secret,
            events: new.events,
            enabled: new.enabled.unwrap_or(true),
            project_id: new.project_id,
            created_at: now,
            updated_at: now,
        };
        info!(webhook = %webhook.id, url = %webhook.url, "create webhook");
        self.commit(|data| {
            data.webhooks.push(webhook.clone());
            webhook
        })
    }

    /// Returns `Ok(None)` when the id is unknown.
    pub fn update_webhook(
        &mut self,
        id: &str,
        patch: WebhookPatch,
    ) -> Result<Option<Webhook>, CoreError> {
        if self.webhook(id).is_none() {
            return Ok(None);
        }
        let id = id.to_string();
        self.commit(move |data| {
            let webhook = data.webhooks.iter_mut().find(|w| w.id == id)?;
            if let Some(name) = patch.name {
                webhook.name = name;
            }
            if let Some(url) = patch.url {
                webhook.url = url;
            }
            if let Some(secret) = patch.secret {
                webhook.secret = secret;
            }
            if let Some(events) = patch.events {
                webhook.events = events;
            }
            if let Some(project_id) = patch.project_id {
                webhook.project_id = project_id;
            }
            if let Some(enabled) = patch.enabled {
                webhook.enabled = enabled;
            }
            webhook.updated_at = Utc::now();
            Some(webhook.clone())
        })
    }

    /// Hard delete of the subscription. Its delivery history is left for
    /// the age-based cleanup to collect.
    pub fn delete_webhook(&mut self, id: &str) -> Result<bool, CoreError> {
        if self.webhook(id).is_none() {
            return Ok(false);
        }
        let id = id.to_string();
        self.commit(move |data| {
            data.webhooks.retain(|w| w.id != id);
            true
        })
    }

    /// Append a pending delivery record for an attempt about to be made.
    pub fn create_delivery(
        &mut self,
        webhook_id: &str,
        event: EventKind,
        payload: serde_json::Value,
    ) -> Result<WebhookDelivery, CoreError> {
        let delivery = WebhookDelivery {
            id: id::new_id(prefix::DELIVERY),
            webhook_id: webhook_id.to_string(),
            event,
            payload,
            status: DeliveryStatus::Pending,
            response_code: None,
            response_body: None,
            error: None,
            attempts: 0,
            created_at: Utc::now(),
            delivered_at: None,
        };
        self.commit(|data| {
            data.webhook_deliveries.push(delivery.clone());
            delivery
        })
    }

    /// Write attempt bookkeeping back onto a delivery record.
    /// Returns `Ok(None)` when the id is unknown.
    pub fn update_delivery(
        &mut self,
        id: &str,
        update: DeliveryUpdate,
    ) -> Result<Option<WebhookDelivery>, CoreError> {
        if !self.data.webhook_deliveries.iter().any(|d| d.id == id) {
            return Ok(None);
        }
        let id = id.to_string();
        self.commit(move |data| {
            let delivery = data.webhook_deliveries.iter_mut().find(|d| d.id == id)?;
            if let Some(status) = update.status {
                delivery.status = status;
            }
            if let Some(code) = update.response_code {
                delivery.response_code = Some(code);
            }
            if let Some(body) = update.response_body {
                delivery.response_body = Some(body);
            }
            if let Some(error) = update.error {
                delivery.error = Some(error);
            }
            if let Some(attempts) = update.attempts {
                delivery.attempts = attempts;
            }
            if let Some(delivered_at) = update.delivered_at {
                delivery.delivered_at = Some(delivered_at);
            }
            Some(delivery.clone())
        })
    }

    /// Delivery history, optionally for one webhook, most recent first.
    #[must_use]
    pub fn deliveries(&self, webhook_id: Option<&str>) -> Vec<WebhookDelivery> {
        let mut records: Vec<WebhookDelivery> = self
            .data
            .webhook_deliveries
            .iter()
            .filter(|d| webhook_id.is_none_or(|w| d.webhook_id == w))
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        records
    }

    /// Prune delivery records older than `max_age`, returning the count
    /// removed.
    pub fn cleanup_old_deliveries(&mut self, max_age: Duration) -> Result<usize, CoreError> {
        let cutoff = Utc::now() - max_age;
        let stale = self
            .data
            .webhook_deliveries
            .iter()
            .filter(|d| d.created_at < cutoff)
            .count();
        if stale == 0 {
            return Ok(0);
        }
        info!(count = stale, "pruning old webhook deliveries");
        self.commit(move |data| {
            data.webhook_deliveries.retain(|d| d.created_at >= cutoff);
            stale
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_RETENTION_DAYS, DeliveryUpdate, NewWebhook, WebhookPatch};
    use crate::model::{DeliveryStatus, EventKind};
    use crate::store::Store;
    use chrono::{Duration, Utc};

    fn new_webhook(name: &str, events: Vec<EventKind>) -> NewWebhook {
        NewWebhook {
            name: name.to_string(),
            url: "https://example.com/hook".to_string(),
            secret: None,
            events,
            project_id: None,
            enabled: None,
        }
    }

    #[test]
    fn matching_respects_enabled_events_and_project() {
        let mut store = Store::in_memory();
        let hook = store
            .create_webhook(NewWebhook {
                project_id: Some("pr-1".to_string()),
                ..new_webhook("scoped", vec![EventKind::TaskCreated])
            })
            .unwrap();

        assert_eq!(
            store
                .webhooks_matching(EventKind::TaskCreated, Some("pr-1"))
                .len(),
            1
        );
        assert!(
            store
                .webhooks_matching(EventKind::TaskCreated, Some("pr-2"))
                .is_empty()
        );

        store
            .update_webhook(
                &hook.id,
                WebhookPatch {
                    enabled: Some(false),
                    ..WebhookPatch::default()
                },
            )
            .unwrap();
        assert!(
            store
                .webhooks_matching(EventKind::TaskCreated, Some("pr-1"))
                .is_empty()
        );
    }

    #[test]
    fn unscoping_a_webhook_with_inner_none() {
        let mut store = Store::in_memory();
        let hook = store
            .create_webhook(NewWebhook {
                project_id: Some("pr-1".to_string()),
                ..new_webhook("scoped", vec![EventKind::TaskCreated])
            })
            .unwrap();

        let updated = store
            .update_webhook(
                &hook.id,
                WebhookPatch {
                    project_id: Some(None),
                    ..WebhookPatch::default()
                },
            )
            .unwrap()
            .expect("exists");
        assert_eq!(updated.project_id, None);
        assert_eq!(
            store
                .webhooks_matching(EventKind::TaskCreated, Some("pr-9"))
                .len(),
            1
        );
    }

    #[test]
    fn deliveries_sort_most_recent_first() {
        let mut store = Store::in_memory();
        let hook = store
            .create_webhook(new_webhook("h", vec![EventKind::TaskCreated]))
            .unwrap();

        let first = store
            .create_delivery(&hook.id, EventKind::TaskCreated, serde_json::json!({"n": 1}))
            .unwrap();
        let second = store
            .create_delivery(&hook.id, EventKind::TaskCreated, serde_json::json!({"n": 2}))
            .unwrap();

        // Force distinct timestamps regardless of clock resolution.
        store
            .commit(|data| {
                for d in &mut data.webhook_deliveries {
                    if d.id == first.id {
                        d.created_at = Utc::now() - Duration::seconds(10);
                    }
                }
            })
            .unwrap();

        let records = store.deliveries(Some(&hook.id));
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, second.id);
        assert_eq!(records[1].id, first.id);
    }

    #[test]
    fn delivery_update_writes_bookkeeping() {
        let mut store = Store::in_memory();
        let hook = store
            .create_webhook(new_webhook("h", vec![EventKind::TaskCreated]))
            .unwrap();
        let delivery = store
            .create_delivery(&hook.id, EventKind::TaskCreated, serde_json::json!({}))
            .unwrap();
        assert_eq!(delivery.status, DeliveryStatus::Pending);
        assert_eq!(delivery.attempts, 0);

        let updated = store
            .update_delivery(
                &delivery.id,
                DeliveryUpdate {
                    status: Some(DeliveryStatus::Success),
                    response_code: Some(200),
                    response_body: Some("ok".to_string()),
                    attempts: Some(1),
                    delivered_at: Some(Utc::now()),
                    ..DeliveryUpdate::default()
                },
            )
            .unwrap()
            .expect("exists");
        assert_eq!(updated.status, DeliveryStatus::Success);
        assert_eq!(updated.response_code, Some(200));
        assert_eq!(updated.attempts, 1);
        assert!(updated.delivered_at.is_some());
    }

    #[test]
    fn cleanup_prunes_only_stale_records() {
        let mut store = Store::in_memory();
        let hook = store
            .create_webhook(new_webhook("h", vec![EventKind::TaskCreated]))
            .unwrap();
        let old = store
            .create_delivery(&hook.id, EventKind::TaskCreated, serde_json::json!({}))
            .unwrap();
        let fresh = store
            .create_delivery(&hook.id, EventKind::TaskCreated, serde_json::json!({}))
            .unwrap();

        store
            .commit(|data| {
                for d in &mut data.webhook_deliveries {
                    if d.id == old.id {
                        d.created_at = Utc::now() - Duration::days(DEFAULT_RETENTION_DAYS + 1);
                    }
                }
            })
            .unwrap();

        let removed = store
            .cleanup_old_deliveries(Duration::days(DEFAULT_RETENTION_DAYS))
            .unwrap();
        assert_eq!(removed, 1);
        let remaining = store.deliveries(None);
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, fresh.id);

        // Second run removes nothing.
        assert_eq!(
            store
                .cleanup_old_deliveries(Duration::days(DEFAULT_RETENTION_DAYS))
                .unwrap(),
            0
        );
    }
}
