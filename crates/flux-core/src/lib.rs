//! flux-core: entity store, dependency/workflow engine, quote engine, and
//! webhook dispatch for the flux work tracker.
//!
//! # Conventions
//!
//! - **Errors**: unknown ids are `Ok(None)` / `Ok(false)`; validation and
//!   conflicts are typed [`error::CoreError`] values; adapter failures
//!   propagate after in-memory rollback.
//! - **Logging**: `tracing` macros (`info!`, `warn!`, `debug!`).
//! - **State**: no process-wide singletons; construct a [`store::Store`]
//!   around the [`storage::Storage`] adapter you want and pass it around.

pub mod error;
pub mod graph;
pub mod hook;
pub mod id;
pub mod model;
pub mod quote;
pub mod storage;
pub mod store;

pub use error::{CoreError, ErrorCode};
pub use store::{DataSet, Store};
