//! Outbound webhook dispatch.
//!
//! [`Dispatcher`] matches domain events against the store's webhook
//! subscriptions and drives the delivery-record lifecycle around a
//! [`DeliveryHandler`]. The in-tree handler posts JSON over HTTP with a
//! signature header; tests plug in recording or failing handlers.

pub mod deliver;
pub mod dispatch;

pub use deliver::HttpDeliveryHandler;
pub use dispatch::{DeliveryError, DeliveryHandler, DeliveryResponse, DispatchSummary, Dispatcher};
