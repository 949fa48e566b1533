use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
    time::Duration,
};

use tracing::debug;

use super::lock::StoreLock;
use super::{Storage, StorageError};
use crate::store::DataSet;

/// How long a writer waits on the advisory lock before giving up with a
/// hard timeout error.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Single-JSON-document adapter guarded by an exclusive advisory lock.
///
/// Writes go to a temp file in the same directory and rename into place,
/// so readers never observe a half-written document. The lock serializes
/// concurrent `flux` processes sharing one data file; within one process
/// the store is single-writer by construction.
#[derive(Debug)]
pub struct JsonFileStorage {
    path: PathBuf,
    lock_path: PathBuf,
    lock_timeout: Duration,
}

impl JsonFileStorage {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let lock_path = path.with_extension("lock");
        Self {
            path,
            lock_path,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, source: std::io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl Storage for JsonFileStorage {
    fn load(&mut self) -> Result<DataSet, StorageError> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no data file yet, starting empty");
            return Ok(DataSet::default());
        }
        let raw = fs::read_to_string(&self.path).map_err(|e| self.io_err(e))?;
        let data = serde_json::from_str(&raw)?;
        Ok(data)
    }

    fn persist(&mut self, data: &DataSet) -> Result<(), StorageError> {
        let _lock = StoreLock::acquire(&self.lock_path, self.lock_timeout)?;

        let parent = self.path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent).map_err(|e| self.io_err(e))?;

        let body = serde_json::to_vec_pretty(data)?;
        let tmp = self.path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp).map_err(|e| self.io_err(e))?;
            file.write_all(&body).map_err(|e| self.io_err(e))?;
            file.sync_all().map_err(|e| self.io_err(e))?;
        }
        fs::rename(&tmp, &self.path).map_err(|e| self.io_err(e))?;
        debug!(path = %self.path.display(), bytes = body.len(), "persisted data file");
        Ok(())
    }
}
