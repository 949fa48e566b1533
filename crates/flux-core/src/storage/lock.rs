use fs2::FileExt;
use std::{
    fs::{self, File, OpenOptions},
    io,
    path::{Path, PathBuf},
    thread,
    time::{Duration, Instant},
};
use thiserror::Error;

/// Advisory lock errors for the shared data file.
#[derive(Debug, Error)]
pub enum LockError {
    #[error("lock timed out after {waited:?} at {}", path.display())]
    Timeout { path: PathBuf, waited: Duration },
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// RAII guard for the store-wide exclusive lock held across writes.
///
/// The lock is released on drop, so every exit path, including error
/// paths, gives it up. A crash while holding the lock leaves a stale lock
/// file that the OS-level advisory lock no longer backs, so a subsequent
/// acquire succeeds; only a wedged live process can hold it indefinitely.
#[derive(Debug)]
pub struct StoreLock {
    file: File,
    path: PathBuf,
}

impl StoreLock {
    /// Acquire an exclusive advisory lock, polling until `timeout` elapses.
    pub fn acquire(path: &Path, timeout: Duration) -> Result<Self, LockError> {
        let parent = path.parent().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "lock path has no parent")
        })?;
        fs::create_dir_all(parent)?;

        let start = Instant::now();
        loop {
            let file = OpenOptions::new()
                .create(true)
                .read(true)
                .write(true)
                .truncate(false)
                .open(path)?;

            if file.try_lock_exclusive().is_ok() {
                return Ok(Self {
                    file,
                    path: path.to_path_buf(),
                });
            }

            if start.elapsed() >= timeout {
                return Err(LockError::Timeout {
                    path: path.to_path_buf(),
                    waited: start.elapsed(),
                });
            }

            thread::sleep(Duration::from_millis(10));
        }
    }

    /// Explicitly release the lock. Release also happens automatically on drop.
    pub fn release(self) {
        let _ = self.file.unlock();
    }

    /// Return the lock file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

#[cfg(test)]
mod tests {
    use super::{LockError, StoreLock};
    use std::time::Duration;

    fn lock_path(dir: &tempfile::TempDir, name: &str) -> std::path::PathBuf {
        dir.path().join(name)
    }

    #[test]
    fn lock_allows_acquire_and_release() -> Result<(), LockError> {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = lock_path(&dir, "basic.lock");
        let lock = StoreLock::acquire(&path, Duration::from_millis(50))?;
        assert_eq!(lock.path(), path.as_path());
        lock.release();
        Ok(())
    }

    #[test]
    fn lock_times_out_when_held() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = lock_path(&dir, "timeout.lock");
        let _guard = StoreLock::acquire(&path, Duration::from_millis(50)).unwrap();
        let err = StoreLock::acquire(&path, Duration::from_millis(20)).unwrap_err();

        assert!(matches!(err, LockError::Timeout { path: p, .. } if p == path));
    }

    #[test]
    fn lock_release_allows_follow_up_lock() -> Result<(), LockError> {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = lock_path(&dir, "followup.lock");
        {
            let _first = StoreLock::acquire(&path, Duration::from_millis(50))?;
        }

        let _second = StoreLock::acquire(&path, Duration::from_millis(50))?;
        Ok(())
    }
}
