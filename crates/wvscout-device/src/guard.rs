//! Host-wide mutual exclusion around local port selection.
//!
//! Several sessions on one host may pick devtools ports at the same time, so
//! the scan for a free port runs under an advisory file lock that every
//! process agrees on.

use async_trait::async_trait;
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use wvscout_config::PortGuardConfig;
use wvscout_core::ScoutError;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Proof of holding the guard. Released on drop.
pub struct GuardLease {
    _inner: LeaseInner,
}

enum LeaseInner {
    File { _lock: FileLock },
    Local { _held: tokio::sync::OwnedMutexGuard<()> },
}

struct FileLock {
    file: File,
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

/// A lock serialising port selection.
#[async_trait]
pub trait PortGuard: Send + Sync {
    async fn acquire(&self) -> wvscout_core::Result<GuardLease>;
}

// ─── File lock ───────────────────────────────────────────────────

/// Cross-process guard backed by an exclusive lock on a well-known file.
pub struct FileLockGuard {
    path: PathBuf,
    timeout: Duration,
    try_recovery: bool,
}

impl FileLockGuard {
    pub fn new(config: &PortGuardConfig) -> Self {
        Self {
            path: config.lock_path.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            try_recovery: config.try_recovery,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self) -> wvscout_core::Result<File> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&self.path)
            .map_err(|e| ScoutError::Guard(format!("open {}: {e}", self.path.display())))
    }

    /// Poll for the lock until `timeout` elapses.
    async fn poll(&self, file: File, timeout: Duration) -> wvscout_core::Result<Option<FileLock>> {
        let started = Instant::now();
        loop {
            match FileExt::try_lock_exclusive(&file) {
                Ok(()) => return Ok(Some(FileLock { file })),
                Err(e) if e.kind() == fs2::lock_contended_error().kind() => {}
                Err(e) => {
                    return Err(ScoutError::Guard(format!(
                        "lock {}: {e}",
                        self.path.display()
                    )));
                }
            }
            if started.elapsed() >= timeout {
                return Ok(None);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}

#[async_trait]
impl PortGuard for FileLockGuard {
    async fn acquire(&self) -> wvscout_core::Result<GuardLease> {
        let file = self.open()?;
        if let Some(lock) = self.poll(file, self.timeout).await? {
            debug!(path = %self.path.display(), "port guard acquired");
            return Ok(GuardLease {
                _inner: LeaseInner::File { _lock: lock },
            });
        }

        if self.try_recovery {
            // The holder is presumed dead. A fresh file gives a fresh lock.
            warn!(path = %self.path.display(), "port guard timed out, recreating lock file");
            let _ = std::fs::remove_file(&self.path);
            let file = self.open()?;
            if let Some(lock) = self.poll(file, self.timeout).await? {
                return Ok(GuardLease {
                    _inner: LeaseInner::File { _lock: lock },
                });
            }
        }

        Err(ScoutError::GuardTimeout {
            path: self.path.display().to_string(),
            waited_secs: self.timeout.as_secs(),
        })
    }
}

// ─── In-process lock ─────────────────────────────────────────────

/// Guard that only serialises callers inside this process.
#[derive(Default, Clone)]
pub struct LocalGuard {
    inner: Arc<tokio::sync::Mutex<()>>,
}

#[async_trait]
impl PortGuard for LocalGuard {
    async fn acquire(&self) -> wvscout_core::Result<GuardLease> {
        let held = self.inner.clone().lock_owned().await;
        Ok(GuardLease {
            _inner: LeaseInner::Local { _held: held },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guard(dir: &tempfile::TempDir, recovery: bool) -> FileLockGuard {
        let config = PortGuardConfig {
            lock_path: dir.path().join("locks").join("port_guard"),
            try_recovery: recovery,
            ..Default::default()
        };
        FileLockGuard::new(&config).with_timeout(Duration::from_millis(250))
    }

    #[tokio::test]
    async fn test_file_guard_creates_lock_file() {
        let dir = tempfile::tempdir().unwrap();
        let g = guard(&dir, false);
        let _lease = g.acquire().await.unwrap();
        assert!(g.path().exists());
    }

    #[tokio::test]
    async fn test_file_guard_is_exclusive_until_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let first = guard(&dir, false);
        let second = guard(&dir, false);

        let lease = first.acquire().await.unwrap();
        let err = second.acquire().await.err().unwrap();
        assert!(matches!(err, ScoutError::GuardTimeout { .. }));

        drop(lease);
        assert!(second.acquire().await.is_ok());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_file_guard_recovers_from_stale_holder() {
        let dir = tempfile::tempdir().unwrap();
        let stale = guard(&dir, false);
        let recovering = guard(&dir, true);

        let _held = stale.acquire().await.unwrap();
        assert!(recovering.acquire().await.is_ok());
    }

    #[tokio::test]
    async fn test_local_guard_serialises() {
        let g = LocalGuard::default();
        let lease = g.acquire().await.unwrap();
        let waiter = {
            let g = g.clone();
            tokio::spawn(async move { g.acquire().await.map(|_| ()) })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());
        drop(lease);
        waiter.await.unwrap().unwrap();
    }
}
