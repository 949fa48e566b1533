use super::{Storage, StorageError};
use crate::store::DataSet;

/// In-process adapter for tests and ephemeral stores.
///
/// `persist` keeps a snapshot of the last written dataset so tests can
/// observe exactly what would have hit disk. An optional failure switch
/// simulates adapter I/O errors for rollback tests.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    snapshot: DataSet,
    persist_count: usize,
    fail_next_persist: bool,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the adapter so the next `load` returns `data`.
    #[must_use]
    pub fn with_data(data: DataSet) -> Self {
        Self {
            snapshot: data,
            persist_count: 0,
            fail_next_persist: false,
        }
    }

    /// Make the next `persist` call fail with an I/O error.
    pub fn fail_next_persist(&mut self) {
        self.fail_next_persist = true;
    }

    /// The dataset as of the last successful `persist`.
    #[must_use]
    pub fn snapshot(&self) -> &DataSet {
        &self.snapshot
    }

    /// Number of successful `persist` calls.
    #[must_use]
    pub fn persist_count(&self) -> usize {
        self.persist_count
    }
}

impl Storage for MemoryStorage {
    fn load(&mut self) -> Result<DataSet, StorageError> {
        Ok(self.snapshot.clone())
    }

    fn persist(&mut self, data: &DataSet) -> Result<(), StorageError> {
        if self.fail_next_persist {
            self.fail_next_persist = false;
            return Err(StorageError::Io {
                path: "<memory>".into(),
                source: std::io::Error::other("simulated persist failure"),
            });
        }
        self.snapshot = data.clone();
        self.persist_count += 1;
        Ok(())
    }
}
