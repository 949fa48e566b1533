use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::error::CoreError;
use crate::model::{DeliveryStatus, EventKind, Webhook, WebhookDelivery, WebhookPayload};
use crate::store::{DeliveryUpdate, Store};

/// What a handler saw back from the endpoint.
#[derive(Debug, Clone)]
pub struct DeliveryResponse {
    pub status_code: u16,
    pub body: String,
}

/// Transport-level delivery failures.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("payload serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Performs the actual delivery I/O for one matched webhook.
///
/// Implementations do not touch delivery records; the dispatcher owns that
/// lifecycle so every handler gets the same audit trail.
pub trait DeliveryHandler {
    fn deliver(
        &self,
        webhook: &Webhook,
        payload: &WebhookPayload,
    ) -> Result<DeliveryResponse, DeliveryError>;
}

/// Per-trigger bookkeeping.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct DispatchSummary {
    pub matched: usize,
    pub delivered: usize,
    pub failed: usize,
}

/// Matches events to webhook subscriptions and records delivery outcomes.
///
/// There is no process-wide dispatch hook: callers that want dispatch
/// construct a dispatcher and pass it where needed; callers that do not
/// simply never trigger one.
pub struct Dispatcher {
    handler: Box<dyn DeliveryHandler>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(handler: Box<dyn DeliveryHandler>) -> Self {
        Self { handler }
    }

    /// Dispatch one domain event to every matching webhook.
    ///
    /// Deliveries are sequential and independent: a handler failure for one
    /// webhook is caught, logged, and recorded on its delivery row without
    /// preventing dispatch to the remaining matches or failing the trigger.
    /// Only store persistence failures propagate.
    pub fn trigger(
        &self,
        store: &mut Store,
        event: EventKind,
        data: serde_json::Value,
        project_id: Option<&str>,
    ) -> Result<DispatchSummary, CoreError> {
        let matched = store.webhooks_matching(event, project_id);
        let mut summary = DispatchSummary {
            matched: matched.len(),
            ..DispatchSummary::default()
        };
        if matched.is_empty() {
            return Ok(summary);
        }
        debug!(event = %event, matched = matched.len(), "dispatching webhooks");

        for webhook in matched {
            let payload = WebhookPayload {
                event,
                timestamp: Utc::now(),
                webhook_id: webhook.id.clone(),
                data: data.clone(),
            };
            if self.deliver_one(store, &webhook, &payload)? {
                summary.delivered += 1;
            } else {
                summary.failed += 1;
            }
        }
        Ok(summary)
    }

    /// Fire a synthetic payload at one webhook through the normal delivery
    /// path, regardless of its event subscriptions. Disabled webhooks are a
    /// validation error; unknown ids return `Ok(None)`.
    pub fn send_test(
        &self,
        store: &mut Store,
        webhook_id: &str,
    ) -> Result<Option<WebhookDelivery>, CoreError> {
        let Some(webhook) = store.webhook(webhook_id).cloned() else {
            return Ok(None);
        };
        if !webhook.enabled {
            return Err(CoreError::Validation(format!(
                "webhook '{}' is disabled",
                webhook.name
            )));
        }
        let event = webhook
            .events
            .first()
            .copied()
            .unwrap_or(EventKind::ProjectUpdated);
        let payload = WebhookPayload {
            event,
            timestamp: Utc::now(),
            webhook_id: webhook.id.clone(),
            data: serde_json::json!({ "test": true, "webhook": webhook.name }),
        };
        self.deliver_one(store, &webhook, &payload)?;
        Ok(store.deliveries(Some(&webhook.id)).into_iter().next())
    }

    /// Returns whether the attempt ended in `success`.
    fn deliver_one(
        &self,
        store: &mut Store,
        webhook: &Webhook,
        payload: &WebhookPayload,
    ) -> Result<bool, CoreError> {
        let payload_json = match serde_json::to_value(payload) {
            Ok(value) => value,
            Err(err) => {
                warn!(webhook = %webhook.id, error = %err, "payload not serializable, skipping");
                return Ok(false);
            }
        };
        let record = store.create_delivery(&webhook.id, payload.event, payload_json)?;

        let (succeeded, update) = match self.handler.deliver(webhook, payload) {
            Ok(response) if (200..300).contains(&response.status_code) => (
                true,
                DeliveryUpdate {
                    status: Some(DeliveryStatus::Success),
                    response_code: Some(response.status_code),
                    response_body: Some(response.body),
                    attempts: Some(1),
                    delivered_at: Some(Utc::now()),
                    ..DeliveryUpdate::default()
                },
            ),
            Ok(response) => {
                warn!(
                    webhook = %webhook.id,
                    code = response.status_code,
                    "webhook endpoint rejected delivery"
                );
                (
                    false,
                    DeliveryUpdate {
                        status: Some(DeliveryStatus::Failed),
                        response_code: Some(response.status_code),
                        response_body: Some(response.body),
                        error: Some(format!("HTTP {}", response.status_code)),
                        attempts: Some(1),
                        ..DeliveryUpdate::default()
                    },
                )
            }
            Err(err) => {
                warn!(webhook = %webhook.id, error = %err, "webhook delivery failed");
                (
                    false,
                    DeliveryUpdate {
                        status: Some(DeliveryStatus::Failed),
                        error: Some(err.to_string()),
                        attempts: Some(1),
                        ..DeliveryUpdate::default()
                    },
                )
            }
        };
        store.update_delivery(&record.id, update)?;
        Ok(succeeded)
    }
}

#[cfg(test)]
mod tests {
    use super::{DeliveryError, DeliveryHandler, DeliveryResponse, Dispatcher};
    use crate::error::CoreError;
    use crate::model::{DeliveryStatus, EventKind, Webhook, WebhookPayload};
    use crate::store::tests_support::seed_webhook;
    use crate::store::Store;
    use std::cell::RefCell;

    /// Handler that records payloads and replays scripted outcomes.
    #[derive(Default)]
    struct ScriptedHandler {
        seen: RefCell<Vec<(String, WebhookPayload)>>,
        fail_for: Option<String>,
    }

    impl DeliveryHandler for ScriptedHandler {
        fn deliver(
            &self,
            webhook: &Webhook,
            payload: &WebhookPayload,
        ) -> Result<DeliveryResponse, DeliveryError> {
            self.seen
                .borrow_mut()
                .push((webhook.id.clone(), payload.clone()));
            if self.fail_for.as_deref() == Some(webhook.id.as_str()) {
                return Err(DeliveryError::Request("connection refused".to_string()));
            }
            Ok(DeliveryResponse {
                status_code: 200,
                body: "ok".to_string(),
            })
        }
    }

    #[test]
    fn trigger_matches_and_records_success() {
        let mut store = Store::in_memory();
        let hook = seed_webhook(&mut store, "h", vec![EventKind::TaskCreated], None);
        let dispatcher = Dispatcher::new(Box::<ScriptedHandler>::default());

        let summary = dispatcher
            .trigger(
                &mut store,
                EventKind::TaskCreated,
                serde_json::json!({"task": {"id": "tk-1"}}),
                Some("pr-1"),
            )
            .unwrap();
        assert_eq!(summary.matched, 1);
        assert_eq!(summary.delivered, 1);
        assert_eq!(summary.failed, 0);

        let records = store.deliveries(Some(&hook.id));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, DeliveryStatus::Success);
        assert_eq!(records[0].response_code, Some(200));
        assert_eq!(records[0].attempts, 1);
        assert!(records[0].delivered_at.is_some());
    }

    #[test]
    fn no_matches_is_a_quiet_noop() {
        let mut store = Store::in_memory();
        seed_webhook(&mut store, "h", vec![EventKind::QuoteCreated], None);
        let dispatcher = Dispatcher::new(Box::<ScriptedHandler>::default());

        let summary = dispatcher
            .trigger(&mut store, EventKind::TaskCreated, serde_json::json!({}), None)
            .unwrap();
        assert_eq!(summary.matched, 0);
        assert!(store.deliveries(None).is_empty());
    }

    #[test]
    fn one_failing_webhook_does_not_stop_the_rest() {
        let mut store = Store::in_memory();
        let bad = seed_webhook(&mut store, "bad", vec![EventKind::TaskCreated], None);
        let good = seed_webhook(&mut store, "good", vec![EventKind::TaskCreated], None);
        let dispatcher = Dispatcher::new(Box::new(ScriptedHandler {
            fail_for: Some(bad.id.clone()),
            ..ScriptedHandler::default()
        }));

        let summary = dispatcher
            .trigger(&mut store, EventKind::TaskCreated, serde_json::json!({}), None)
            .unwrap();
        assert_eq!(summary.matched, 2);
        assert_eq!(summary.delivered, 1);
        assert_eq!(summary.failed, 1);

        let bad_records = store.deliveries(Some(&bad.id));
        assert_eq!(bad_records[0].status, DeliveryStatus::Failed);
        assert!(
            bad_records[0]
                .error
                .as_deref()
                .is_some_and(|e| e.contains("connection refused"))
        );
        assert_eq!(bad_records[0].delivered_at, None);

        let good_records = store.deliveries(Some(&good.id));
        assert_eq!(good_records[0].status, DeliveryStatus::Success);
    }

    #[test]
    fn non_2xx_response_is_a_failed_delivery() {
        struct Teapot;
        impl DeliveryHandler for Teapot {
            fn deliver(
                &self,
                _webhook: &Webhook,
                _payload: &WebhookPayload,
            ) -> Result<DeliveryResponse, DeliveryError> {
                Ok(DeliveryResponse {
                    status_code: 418,
                    body: "short and stout".to_string(),
                })
            }
        }

        let mut store = Store::in_memory();
        let hook = seed_webhook(&mut store, "h", vec![EventKind::TaskCreated], None);
        let dispatcher = Dispatcher::new(Box::new(Teapot));

        let summary = dispatcher
            .trigger(&mut store, EventKind::TaskCreated, serde_json::json!({}), None)
            .unwrap();
        assert_eq!(summary.failed, 1);

        let records = store.deliveries(Some(&hook.id));
        assert_eq!(records[0].status, DeliveryStatus::Failed);
        assert_eq!(records[0].response_code, Some(418));
        assert_eq!(records[0].error.as_deref(), Some("HTTP 418"));
    }

    #[test]
    fn payload_carries_event_webhook_and_data() {
        struct SharedHandler(std::rc::Rc<ScriptedHandler>);
        impl DeliveryHandler for SharedHandler {
            fn deliver(
                &self,
                webhook: &Webhook,
                payload: &WebhookPayload,
            ) -> Result<DeliveryResponse, DeliveryError> {
                self.0.deliver(webhook, payload)
            }
        }

        let mut store = Store::in_memory();
        let hook = seed_webhook(&mut store, "h", vec![EventKind::QuoteStatusChanged], None);
        let inner = std::rc::Rc::new(ScriptedHandler::default());
        let dispatcher = Dispatcher::new(Box::new(SharedHandler(inner.clone())));

        dispatcher
            .trigger(
                &mut store,
                EventKind::QuoteStatusChanged,
                serde_json::json!({"quote": {"id": "qt-1"}, "previous": {"status": "draft"}}),
                None,
            )
            .unwrap();

        let seen = inner.seen.borrow();
        assert_eq!(seen.len(), 1);
        let (webhook_id, payload) = &seen[0];
        assert_eq!(webhook_id, &hook.id);
        assert_eq!(payload.event, EventKind::QuoteStatusChanged);
        assert_eq!(payload.webhook_id, hook.id);
        assert_eq!(payload.data["quote"]["id"], "qt-1");
    }

    #[test]
    fn send_test_exercises_the_delivery_path() {
        let mut store = Store::in_memory();
        let hook = seed_webhook(&mut store, "h", vec![EventKind::TaskCreated], None);
        let dispatcher = Dispatcher::new(Box::<ScriptedHandler>::default());

        let delivery = dispatcher
            .send_test(&mut store, &hook.id)
            .unwrap()
            .expect("webhook exists");
        assert_eq!(delivery.status, DeliveryStatus::Success);
        assert_eq!(delivery.event, EventKind::TaskCreated);

        assert!(dispatcher.send_test(&mut store, "wh-missing1").unwrap().is_none());

        store
            .update_webhook(
                &hook.id,
                crate::store::WebhookPatch {
                    enabled: Some(false),
                    ..crate::store::WebhookPatch::default()
                },
            )
            .unwrap();
        let err = dispatcher.send_test(&mut store, &hook.id).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }
}
