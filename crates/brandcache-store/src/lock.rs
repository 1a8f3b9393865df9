//! Exclusive cross-process lock guarding a store file.
//!
//! The lock is an advisory `flock(2)` on a sidecar `<store>.lock` file,
//! polled until a deadline. Locking the database file itself would be
//! unsafe: closing any descriptor on it drops SQLite's own POSIX locks.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::Duration;

use brandcache_error::{BrandCacheError, Result};
#[cfg(unix)]
use tracing::debug;

#[cfg(unix)]
const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Held for the lifetime of an open [`crate::Store`]; released on drop.
pub struct StoreLock {
    path: PathBuf,
    #[cfg(unix)]
    _flock: nix::fcntl::Flock<File>,
    #[cfg(not(unix))]
    _file: File,
}

impl fmt::Debug for StoreLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreLock").field("path", &self.path).finish()
    }
}

/// Sidecar lock path for `store_path`: the store path with `.lock` appended.
#[must_use]
pub fn lock_path(store_path: &Path) -> PathBuf {
    let mut raw = store_path.as_os_str().to_owned();
    raw.push(".lock");
    PathBuf::from(raw)
}

impl StoreLock {
    /// Acquire the exclusive lock for `store_path`, waiting up to `timeout`.
    ///
    /// # Errors
    /// `StoreLocked` if still held elsewhere at the deadline; `CannotOpen`
    /// if the lock file cannot be created.
    pub fn acquire(store_path: &Path, timeout: Duration) -> Result<Self> {
        let path = lock_path(store_path);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|err| BrandCacheError::CannotOpen {
                path: store_path.to_path_buf(),
                detail: format!("lock file '{}': {err}", path.display()),
            })?;
        Self::lock_file(store_path, path, file, timeout)
    }

    #[cfg(unix)]
    fn lock_file(store_path: &Path, path: PathBuf, file: File, timeout: Duration) -> Result<Self> {
        use std::thread;
        use std::time::Instant;

        use nix::errno::Errno;
        use nix::fcntl::{Flock, FlockArg};

        let started = Instant::now();
        let mut file = file;
        loop {
            match Flock::lock(file, FlockArg::LockExclusiveNonblock) {
                Ok(flock) => {
                    debug!(
                        target: "brandcache.store",
                        lock = %path.display(),
                        waited_ms = started.elapsed().as_millis() as u64,
                        "store lock acquired"
                    );
                    return Ok(Self {
                        path,
                        _flock: flock,
                    });
                }
                Err((returned, errno)) if errno == Errno::EWOULDBLOCK => {
                    if started.elapsed() >= timeout {
                        return Err(BrandCacheError::StoreLocked {
                            path: store_path.to_path_buf(),
                            waited_ms: started.elapsed().as_millis() as u64,
                        });
                    }
                    file = returned;
                    thread::sleep(LOCK_POLL_INTERVAL);
                }
                Err((_, errno)) => {
                    return Err(BrandCacheError::CannotOpen {
                        path: store_path.to_path_buf(),
                        detail: format!("flock '{}': {}", path.display(), errno.desc()),
                    });
                }
            }
        }
    }

    #[cfg(not(unix))]
    fn lock_file(_store_path: &Path, path: PathBuf, file: File, _timeout: Duration) -> Result<Self> {
        // No advisory locking off unix; single-process use only.
        Ok(Self { path, _file: file })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_path_appends_suffix() {
        assert_eq!(
            lock_path(Path::new("/var/cache/brands.db")),
            PathBuf::from("/var/cache/brands.db.lock")
        );
    }

    #[test]
    fn release_on_drop_allows_reacquire() {
        let dir = tempfile::tempdir().unwrap();
        let store_path = dir.path().join("cache.db");
        let first = StoreLock::acquire(&store_path, Duration::from_millis(50)).unwrap();
        assert_eq!(first.path(), lock_path(&store_path));
        drop(first);
        StoreLock::acquire(&store_path, Duration::from_millis(50)).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn second_holder_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let store_path = dir.path().join("cache.db");
        let _held = StoreLock::acquire(&store_path, Duration::from_millis(50)).unwrap();
        let err = StoreLock::acquire(&store_path, Duration::from_millis(60)).unwrap_err();
        match err {
            BrandCacheError::StoreLocked { path, waited_ms } => {
                assert_eq!(path, store_path);
                assert!(waited_ms >= 60, "gave up early after {waited_ms} ms");
            }
            other => panic!("expected StoreLocked, got {other:?}"),
        }
    }
}
