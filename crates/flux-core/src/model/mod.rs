//! Entity model: plain serde structs plus the enums that gate them.

pub mod customer;
pub mod epic;
pub mod product;
pub mod project;
pub mod quote;
pub mod task;
pub mod webhook;

pub use customer::{Customer, CustomerKind};
pub use epic::Epic;
pub use product::Product;
pub use project::Project;
pub use quote::{Quote, QuoteLineItem, QuoteStatus};
pub use task::{InvalidTransition, ParseEnumError, Status, Task};
pub use webhook::{DeliveryStatus, EventKind, Webhook, WebhookDelivery, WebhookPayload};
