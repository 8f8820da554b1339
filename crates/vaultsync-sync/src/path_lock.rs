//! Per-path advisory locks
//!
//! The engine holds a path's lock while it writes that path. Viewer code
//! that decodes attachment files takes the same lock through
//! [`PathLocks::read`] so it never sees a half-written file.
//!
//! Entries live in a [`DashMap`] and are removed when the last holder's
//! guard drops, so the map only contains paths that are in use.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::trace;

type LockMap = DashMap<PathBuf, Arc<Mutex<()>>>;

/// Shared table of per-path locks. Cloning shares the table.
#[derive(Debug, Clone, Default)]
pub struct PathLocks {
    inner: Arc<LockMap>,
}

impl PathLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for `path`, waiting for any current holder.
    pub async fn lock(&self, path: &Path) -> PathLockGuard {
        let mutex = self
            .inner
            .entry(path.to_path_buf())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = mutex.lock_owned().await;
        trace!(path = %path.display(), "path lock acquired");
        PathLockGuard {
            guard: Some(guard),
            path: path.to_path_buf(),
            map: Arc::clone(&self.inner),
        }
    }

    /// Acquire the lock for `path` before reading it.
    ///
    /// Waits until any in-flight engine write to the same path finishes.
    pub async fn read(&self, path: &Path) -> PathLockGuard {
        self.lock(path).await
    }

    /// Number of paths currently locked or awaited
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Holds one path's lock until dropped
#[derive(Debug)]
pub struct PathLockGuard {
    guard: Option<OwnedMutexGuard<()>>,
    path: PathBuf,
    map: Arc<LockMap>,
}

impl PathLockGuard {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PathLockGuard {
    fn drop(&mut self) {
        // Release first so the map holds the only remaining reference.
        drop(self.guard.take());
        self.map
            .remove_if(&self.path, |_, mutex| Arc::strong_count(mutex) == 1);
        trace!(path = %self.path.display(), "path lock released");
    }
}
