//! The entity store: one in-memory dataset per instance, mirrored through a
//! persistence adapter after every mutation.
//!
//! There is no process-wide singleton. Callers construct a [`Store`] around
//! the adapter they want and pass it explicitly; tests build as many
//! isolated stores as they like.

pub mod customers;
pub mod epics;
pub mod products;
pub mod projects;
pub mod tasks;
pub mod webhooks;

pub use customers::{CustomerFilters, CustomerPatch, NewCustomer};
pub use epics::{EpicPatch, NewEpic};
pub use products::{NewProduct, ProductFilters, ProductPatch};
pub use projects::{NewProject, ProjectPatch};
pub use tasks::{NewTask, StatusChange, TaskFilters, TaskPatch};
pub use webhooks::{DEFAULT_RETENTION_DAYS, DeliveryUpdate, NewWebhook, WebhookPatch};

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::model::{Customer, Epic, Product, Project, Quote, Task, Webhook, WebhookDelivery};
use crate::storage::{MemoryStorage, Storage, StorageError};

/// Every collection the store owns, in one serializable document.
///
/// Collections are plain vectors in insertion order; all lookups are linear
/// scans, which is the right trade at this system's scale (hundreds of
/// records, single writer).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataSet {
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub epics: Vec<Epic>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub customers: Vec<Customer>,
    #[serde(default)]
    pub quotes: Vec<Quote>,
    #[serde(default)]
    pub webhooks: Vec<Webhook>,
    #[serde(default)]
    pub webhook_deliveries: Vec<WebhookDelivery>,
}

/// The single in-memory source of truth plus its persistence adapter.
pub struct Store {
    data: DataSet,
    storage: Box<dyn Storage>,
}

impl Store {
    /// Hydrate a store from the given adapter.
    pub fn open(mut storage: Box<dyn Storage>) -> Result<Self, StorageError> {
        let data = storage.load()?;
        Ok(Self { data, storage })
    }

    /// Ephemeral store over [`MemoryStorage`], mostly for tests.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            data: DataSet::default(),
            storage: Box::new(MemoryStorage::new()),
        }
    }

    /// Read-only view of the whole dataset.
    #[must_use]
    pub fn data(&self) -> &DataSet {
        &self.data
    }

    /// Block until the adapter reports all accepted writes durable.
    pub fn flush(&mut self) -> Result<(), StorageError> {
        self.storage.flush()
    }

    /// Apply one mutation as a unit of work: mutate in memory, persist the
    /// whole dataset once, and roll the in-memory state back if persistence
    /// fails. Validation belongs *before* this call; the closure itself
    /// must be infallible.
    pub(crate) fn commit<T>(
        &mut self,
        mutate: impl FnOnce(&mut DataSet) -> T,
    ) -> Result<T, CoreError> {
        let before = self.data.clone();
        let out = mutate(&mut self.data);
        if let Err(err) = self.storage.persist(&self.data) {
            self.data = before;
            return Err(CoreError::Persistence(err));
        }
        Ok(out)
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("projects", &self.data.projects.len())
            .field("epics", &self.data.epics.len())
            .field("tasks", &self.data.tasks.len())
            .field("products", &self.data.products.len())
            .field("customers", &self.data.customers.len())
            .field("quotes", &self.data.quotes.len())
            .field("webhooks", &self.data.webhooks.len())
            .field("webhook_deliveries", &self.data.webhook_deliveries.len())
            .finish()
    }
}

/// Case-insensitive substring test shared by the per-entity search filters.
pub(crate) fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Case-insensitive exact match for category/brand/source style filters.
pub(crate) fn eq_ci(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}
