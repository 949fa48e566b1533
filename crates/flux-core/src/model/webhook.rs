use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::task::ParseEnumError;

/// Domain event taxonomy carried by webhook subscriptions and payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    #[serde(rename = "project.created")]
    ProjectCreated,
    #[serde(rename = "project.updated")]
    ProjectUpdated,
    #[serde(rename = "project.deleted")]
    ProjectDeleted,
    #[serde(rename = "epic.created")]
    EpicCreated,
    #[serde(rename = "epic.updated")]
    EpicUpdated,
    #[serde(rename = "epic.deleted")]
    EpicDeleted,
    #[serde(rename = "task.created")]
    TaskCreated,
    #[serde(rename = "task.updated")]
    TaskUpdated,
    #[serde(rename = "task.deleted")]
    TaskDeleted,
    #[serde(rename = "task.status_changed")]
    TaskStatusChanged,
    #[serde(rename = "task.archived")]
    TaskArchived,
    #[serde(rename = "product.created")]
    ProductCreated,
    #[serde(rename = "product.updated")]
    ProductUpdated,
    #[serde(rename = "product.deleted")]
    ProductDeleted,
    #[serde(rename = "customer.created")]
    CustomerCreated,
    #[serde(rename = "customer.updated")]
    CustomerUpdated,
    #[serde(rename = "customer.deleted")]
    CustomerDeleted,
    #[serde(rename = "quote.created")]
    QuoteCreated,
    #[serde(rename = "quote.updated")]
    QuoteUpdated,
    #[serde(rename = "quote.deleted")]
    QuoteDeleted,
    #[serde(rename = "quote.status_changed")]
    QuoteStatusChanged,
}

impl EventKind {
    /// All event kinds, in taxonomy order.
    pub const ALL: [Self; 21] = [
        Self::ProjectCreated,
        Self::ProjectUpdated,
        Self::ProjectDeleted,
        Self::EpicCreated,
        Self::EpicUpdated,
        Self::EpicDeleted,
        Self::TaskCreated,
        Self::TaskUpdated,
        Self::TaskDeleted,
        Self::TaskStatusChanged,
        Self::TaskArchived,
        Self::ProductCreated,
        Self::ProductUpdated,
        Self::ProductDeleted,
        Self::CustomerCreated,
        Self::CustomerUpdated,
        Self::CustomerDeleted,
        Self::QuoteCreated,
        Self::QuoteUpdated,
        Self::QuoteDeleted,
        Self::QuoteStatusChanged,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ProjectCreated => "project.created",
            Self::ProjectUpdated => "project.updated",
            Self::ProjectDeleted => "project.deleted",
            Self::EpicCreated => "epic.created",
            Self::EpicUpdated => "epic.updated",
            Self::EpicDeleted => "epic.deleted",
            Self::TaskCreated => "task.created",
            Self::TaskUpdated => "task.updated",
            Self::TaskDeleted => "task.deleted",
            Self::TaskStatusChanged => "task.status_changed",
            Self::TaskArchived => "task.archived",
            Self::ProductCreated => "product.created",
            Self::ProductUpdated => "product.updated",
            Self::ProductDeleted => "product.deleted",
            Self::CustomerCreated => "customer.created",
            Self::CustomerUpdated => "customer.updated",
            Self::CustomerDeleted => "customer.deleted",
            Self::QuoteCreated => "quote.created",
            Self::QuoteUpdated => "quote.updated",
            Self::QuoteDeleted => "quote.deleted",
            Self::QuoteStatusChanged => "quote.status_changed",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| ParseEnumError {
                expected: "event kind",
                got: s.to_string(),
            })
    }
}

/// An outbound event subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Webhook {
    pub id: String,
    pub name: String,
    pub url: String,
    /// When present, deliveries carry a signature header over the payload.
    #[serde(default)]
    pub secret: Option<String>,
    pub events: Vec<EventKind>,
    pub enabled: bool,
    /// Restricts matching to one project's events when set.
    #[serde(default)]
    pub project_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Webhook {
    /// Subscription-filter predicate: enabled, subscribed to the event, and
    /// either unscoped or scoped to the event's project.
    #[must_use]
    pub fn matches(&self, event: EventKind, project_id: Option<&str>) -> bool {
        self.enabled
            && self.events.contains(&event)
            && match self.project_id.as_deref() {
                None => true,
                Some(own) => project_id == Some(own),
            }
    }
}

/// Delivery lifecycle: `pending -> success` or `pending -> failed`.
/// Terminal states are never retried by the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Pending,
    Success,
    Failed,
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Failed => "failed",
        })
    }
}

/// Append-only audit record of one delivery attempt, pruned by age.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookDelivery {
    pub id: String,
    pub webhook_id: String,
    pub event: EventKind,
    pub payload: serde_json::Value,
    pub status: DeliveryStatus,
    #[serde(default)]
    pub response_code: Option<u16>,
    #[serde(default)]
    pub response_body: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    pub attempts: u32,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub delivered_at: Option<DateTime<Utc>>,
}

/// Wire payload POSTed to a webhook URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub event: EventKind,
    pub timestamp: DateTime<Utc>,
    pub webhook_id: String,
    pub data: serde_json::Value,
}
