//! Persistence adapters.
//!
//! The store mirrors its whole in-memory dataset through a [`Storage`]
//! implementation after every mutation. Adapters are deliberately dumb:
//! they move a [`DataSet`] to and from durable form and know nothing about
//! entities or invariants.

pub mod file;
pub mod lock;
pub mod memory;

pub use file::JsonFileStorage;
pub use lock::{LockError, StoreLock};
pub use memory::MemoryStorage;

use std::{io, path::PathBuf};
use thiserror::Error;

use crate::error::ErrorCode;
use crate::store::DataSet;

/// Adapter I/O failures. These always propagate to the caller; the store
/// rolls its in-memory state back before re-raising.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("i/o failure at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("data file parse failed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Lock(#[from] LockError),
}

impl StorageError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Io { .. } => ErrorCode::StoreWriteFailed,
            Self::Parse(_) => ErrorCode::CorruptDataFile,
            Self::Lock(_) => ErrorCode::LockContention,
        }
    }
}

/// Persistence contract consumed by the store.
///
/// `persist` is synchronous and durable on return for both in-tree
/// adapters; `flush` exists so that a future batched/asynchronous adapter
/// can make completion observable instead of stashing a fire-and-forget
/// future internally.
pub trait Storage {
    /// Hydrate the full dataset from durable form. A missing backing file
    /// yields an empty dataset, not an error.
    fn load(&mut self) -> Result<DataSet, StorageError>;

    /// Persist the full dataset.
    fn persist(&mut self, data: &DataSet) -> Result<(), StorageError>;

    /// Block until previously accepted writes are durable.
    fn flush(&mut self) -> Result<(), StorageError> {
        Ok(())
    }
}
