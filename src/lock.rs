//! Filesystem-based locking for cross-process coordination
//!
//! Only one extraction may write to an output directory at a time. The lock
//! is an advisory `flock()` on a file inside that directory, released when the
//! guard drops or the process dies.

use crate::error::{LockError, Result};
use fs2::FileExt;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// Name of the lock file inside the output directory
pub const LOCK_FILE: &str = ".lock";

/// Guard that holds an exclusive lock on an output directory
pub struct OutputLock {
    _file: File,
    path: PathBuf,
}

impl OutputLock {
    /// Try to acquire the lock, non-blocking
    ///
    /// Returns:
    /// - `Ok(Some(guard))` if the lock was acquired
    /// - `Ok(None)` if another process holds the lock
    /// - `Err(...)` on IO errors
    pub fn try_acquire(output_dir: &Path) -> Result<Option<Self>> {
        let path = output_dir.join(LOCK_FILE);
        let failed = |reason: String| LockError::AcquireFailed {
            path: path.display().to_string(),
            reason,
        };

        fs::create_dir_all(output_dir).map_err(|e| failed(e.to_string()))?;
        let file = File::create(&path).map_err(|e| failed(e.to_string()))?;

        match file.try_lock_exclusive() {
            Ok(()) => {
                tracing::debug!("Acquired output lock {:?}", path);
                Ok(Some(Self { _file: file, path }))
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                tracing::debug!("Output lock {:?} is held elsewhere", path);
                Ok(None)
            }
            Err(e) => Err(failed(e.to_string()).into()),
        }
    }

    /// Acquire the lock or fail with [`LockError::AlreadyRunning`]
    pub fn acquire(output_dir: &Path) -> Result<Self> {
        Self::try_acquire(output_dir)?.ok_or_else(|| {
            LockError::AlreadyRunning {
                path: output_dir.display().to_string(),
            }
            .into()
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for OutputLock {
    fn drop(&mut self) {
        // Closing the file releases the flock; the file itself is reused
        tracing::debug!("Releasing output lock {:?}", self.path);
    }
}
