//! Per-namespace advisory lock
//!
//! Serializes mutating invocations of this tool against the same namespace.
//! The lock is released when the guard is dropped, on every exit path.

use nix::errno::Errno;
use nix::fcntl::{Flock, FlockArg};
use nspin_core::{Error, NamespaceName, Result};
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Held exclusive lock on `<lock_dir>/nspin-<namespace>.lock`
pub struct NamespaceLock {
    _file: Flock<File>,
    path: PathBuf,
}

impl std::fmt::Debug for NamespaceLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamespaceLock")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl NamespaceLock {
    /// Take the lock without waiting
    ///
    /// # Errors
    /// Returns [`Error::Locked`] if another process holds it
    pub fn acquire(lock_dir: &Path, namespace: &NamespaceName) -> Result<Self> {
        let path = lock_dir.join(format!("nspin-{namespace}.lock"));

        fs::create_dir_all(lock_dir)?;
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)?;

        match Flock::lock(file, FlockArg::LockExclusiveNonblock) {
            Ok(file) => {
                debug!("Acquired lock {}", path.display());
                Ok(Self { _file: file, path })
            }
            Err((_, errno)) if errno == Errno::EWOULDBLOCK => Err(Error::Locked { path }),
            Err((_, errno)) => Err(Error::System(errno)),
        }
    }
}
