use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use brandcache_error::{BrandCacheError, Result};
use parking_lot::Mutex;
use rusqlite::{Connection, OpenFlags, OptionalExtension, TransactionBehavior, params};
use tracing::{debug, info, warn};

use crate::lock::StoreLock;
use crate::scan::{self, Scan, ScanMode, ScanRow};

/// Name of the single bucket (table) holding the snapshot.
pub const BUCKET: &str = "brand";

/// Idle read connections kept for reuse.
const MAX_IDLE_READERS: usize = 8;

const CREATE_BUCKET: &str =
    "CREATE TABLE IF NOT EXISTS brand (key TEXT PRIMARY KEY NOT NULL, value BLOB NOT NULL) WITHOUT ROWID;";

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Tunables for [`Store::open`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
    /// How long `open` waits for the exclusive store lock.
    pub lock_timeout: Duration,
    /// SQLite busy handler timeout for every connection.
    pub busy_timeout: Duration,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_secs(1),
            busy_timeout: Duration::from_secs(5),
        }
    }
}

impl StoreOptions {
    #[must_use]
    pub const fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// An open on-disk snapshot store.
///
/// Writes go through one serialized writer connection; reads and scans use
/// pooled read connections, each in its own WAL snapshot.
pub struct Store {
    path: PathBuf,
    options: StoreOptions,
    writer: Mutex<Connection>,
    readers: Mutex<Vec<Connection>>,
    active_scans: AtomicUsize,
    // Declared last: connections close before the lock is released.
    lock: StoreLock,
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("path", &self.path)
            .field("options", &self.options)
            .field("active_scans", &self.active_scans())
            .field("lock", &self.lock)
            .finish_non_exhaustive()
    }
}

impl Store {
    /// Open (creating if needed) the store at `path` and take its exclusive
    /// lock.
    ///
    /// # Errors
    /// `CannotOpen` if the path is a directory or the file cannot be opened
    /// as a database; `StoreLocked` if another holder keeps the lock past
    /// `options.lock_timeout`.
    pub fn open(path: impl AsRef<Path>, options: StoreOptions) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if path.is_dir() {
            return Err(BrandCacheError::CannotOpen {
                path,
                detail: "path is a directory".to_owned(),
            });
        }

        let lock = StoreLock::acquire(&path, options.lock_timeout)?;
        let writer = open_writer(&path, options).map_err(|err| BrandCacheError::CannotOpen {
            path: path.clone(),
            detail: err.to_string(),
        })?;

        info!(
            target: "brandcache.store",
            path = %path.display(),
            lock_timeout_ms = options.lock_timeout.as_millis() as u64,
            "cache store opened"
        );

        Ok(Self {
            path,
            options,
            writer: Mutex::new(writer),
            readers: Mutex::new(Vec::new()),
            active_scans: AtomicUsize::new(0),
            lock,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of scans whose producer has not yet released its snapshot.
    #[must_use]
    pub fn active_scans(&self) -> usize {
        self.active_scans.load(Ordering::Acquire)
    }

    /// Drop the bucket and recreate it empty, in one write transaction.
    ///
    /// Scans started before the reset keep reading their own snapshot.
    pub fn reset_bucket(&self) -> Result<()> {
        self.update(|txn| {
            txn.conn
                .execute_batch(&format!("DROP TABLE IF EXISTS {BUCKET};\n{CREATE_BUCKET}"))
                .map_err(storage_err)
        })?;
        info!(target: "brandcache.store", path = %self.path.display(), "bucket reset");
        Ok(())
    }

    /// Run `f` inside one immediate write transaction.
    ///
    /// Commits when `f` returns `Ok`; rolls back otherwise.
    pub fn update<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&WriteTxn<'_>) -> Result<R>,
    {
        let mut conn = self.writer.lock();
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(storage_err)?;
        let out = f(&WriteTxn { conn: &tx })?;
        tx.commit().map_err(storage_err)?;
        Ok(out)
    }

    /// Run `f` inside one read transaction on a pooled reader.
    pub fn view<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&ReadTxn<'_>) -> Result<R>,
    {
        let conn = self.checkout_reader()?;
        let out = conn
            .execute_batch("BEGIN DEFERRED;")
            .map_err(storage_err)
            .and_then(|()| f(&ReadTxn { conn: &conn }));
        end_read(&conn);
        self.checkin_reader(conn);
        out
    }

    /// Raw value stored under `key`.
    pub fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.view(|txn| txn.get(key))
    }

    /// Number of keys in the bucket.
    pub fn count(&self) -> Result<usize> {
        self.view(|txn| txn.count())
    }

    /// Stream the bucket in key order, decoding each row with `decode`.
    ///
    /// The snapshot is pinned before this returns.
    pub fn scan<T, F>(self: &Arc<Self>, mode: ScanMode, decode: F) -> Result<Scan<T>>
    where
        T: Send + 'static,
        F: FnMut(ScanRow) -> Result<T> + Send + 'static,
    {
        scan::spawn(self, mode, decode)
    }

    /// Close every connection, then release the lock.
    pub fn close(self) -> Result<()> {
        let Self {
            path,
            writer,
            readers,
            lock,
            ..
        } = self;
        drop(readers.into_inner());
        let closed = writer
            .into_inner()
            .close()
            .map_err(|(_, err)| storage_err(err));
        drop(lock);
        match &closed {
            Ok(()) => info!(target: "brandcache.store", path = %path.display(), "cache store closed"),
            Err(err) => warn!(target: "brandcache.store", path = %path.display(), error = %err, "cache store close failed"),
        }
        closed
    }

    // -- reader pool --------------------------------------------------------

    pub(crate) fn checkout_reader(&self) -> Result<Connection> {
        if let Some(conn) = self.readers.lock().pop() {
            return Ok(conn);
        }
        debug!(target: "brandcache.store", "opening read connection");
        open_reader(&self.path, self.options).map_err(storage_err)
    }

    pub(crate) fn checkin_reader(&self, conn: Connection) {
        let mut idle = self.readers.lock();
        if idle.len() < MAX_IDLE_READERS {
            idle.push(conn);
        }
    }

    pub(crate) fn scan_started(&self) {
        self.active_scans.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn scan_finished(&self) {
        self.active_scans.fetch_sub(1, Ordering::AcqRel);
    }
}

fn open_writer(path: &Path, options: StoreOptions) -> rusqlite::Result<Connection> {
    let conn = Connection::open(path)?;
    conn.busy_timeout(options.busy_timeout)?;
    let mode: String = conn.query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))?;
    if !mode.eq_ignore_ascii_case("wal") {
        warn!(target: "brandcache.store", journal_mode = %mode, "WAL mode unavailable");
    }
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.execute_batch(CREATE_BUCKET)?;
    Ok(conn)
}

fn open_reader(path: &Path, options: StoreOptions) -> rusqlite::Result<Connection> {
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    conn.busy_timeout(options.busy_timeout)?;
    conn.pragma_update(None, "query_only", true)?;
    Ok(conn)
}

/// End whatever read transaction `conn` is in. Best effort: a failure
/// leaves the connection in autocommit on the next `BEGIN` anyway.
pub(crate) fn end_read(conn: &Connection) {
    if !conn.is_autocommit() {
        if let Err(err) = conn.execute_batch("ROLLBACK;") {
            debug!(target: "brandcache.store", error = %err, "read rollback failed");
        }
    }
}

pub(crate) fn storage_err(err: rusqlite::Error) -> BrandCacheError {
    BrandCacheError::storage(err.to_string())
}

// ---------------------------------------------------------------------------
// Transactions
// ---------------------------------------------------------------------------

/// Handle passed to [`Store::update`] closures.
pub struct WriteTxn<'a> {
    conn: &'a Connection,
}

impl WriteTxn<'_> {
    pub fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        get_value(self.conn, key)
    }

    /// Insert or replace the value under `key`.
    pub fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        self.conn
            .prepare_cached("INSERT OR REPLACE INTO brand (key, value) VALUES (?1, ?2)")
            .and_then(|mut stmt| stmt.execute(params![key, value]))
            .map_err(storage_err)?;
        Ok(())
    }

    /// Remove `key`. Returns whether it was present.
    pub fn delete(&self, key: &str) -> Result<bool> {
        let removed = self
            .conn
            .prepare_cached("DELETE FROM brand WHERE key = ?1")
            .and_then(|mut stmt| stmt.execute(params![key]))
            .map_err(storage_err)?;
        Ok(removed > 0)
    }

    pub fn count(&self) -> Result<usize> {
        count_keys(self.conn)
    }
}

/// Handle passed to [`Store::view`] closures.
pub struct ReadTxn<'a> {
    conn: &'a Connection,
}

impl ReadTxn<'_> {
    pub fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        get_value(self.conn, key)
    }

    pub fn count(&self) -> Result<usize> {
        count_keys(self.conn)
    }
}

fn get_value(conn: &Connection, key: &str) -> Result<Option<Vec<u8>>> {
    conn.prepare_cached("SELECT value FROM brand WHERE key = ?1")
        .and_then(|mut stmt| stmt.query_row(params![key], |row| row.get(0)).optional())
        .map_err(storage_err)
}

fn count_keys(conn: &Connection) -> Result<usize> {
    let n: i64 = conn
        .query_row("SELECT COUNT(*) FROM brand", [], |row| row.get(0))
        .map_err(storage_err)?;
    usize::try_from(n).map_err(|_| BrandCacheError::storage(format!("negative row count {n}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_temp() -> (tempfile::TempDir, Arc<Store>) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().join("cache.db"), StoreOptions::default()).unwrap();
        (dir, Arc::new(store))
    }

    #[test]
    fn put_get_delete() {
        let (_dir, store) = open_temp();
        store
            .update(|txn| {
                txn.put("a", b"one")?;
                txn.put("b", b"two")?;
                Ok(())
            })
            .unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some(&b"one"[..]));
        assert_eq!(store.get("missing").unwrap(), None);
        assert_eq!(store.count().unwrap(), 2);

        let removed = store.update(|txn| txn.delete("a")).unwrap();
        assert!(removed);
        assert!(!store.update(|txn| txn.delete("a")).unwrap());
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn failed_update_rolls_back() {
        let (_dir, store) = open_temp();
        let err = store
            .update(|txn| -> Result<()> {
                txn.put("a", b"one")?;
                Err(BrandCacheError::internal("abort"))
            })
            .unwrap_err();
        assert!(matches!(err, BrandCacheError::Internal(_)));
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn reset_empties_bucket() {
        let (_dir, store) = open_temp();
        store.update(|txn| txn.put("a", b"one")).unwrap();
        store.reset_bucket().unwrap();
        assert_eq!(store.count().unwrap(), 0);
        store.update(|txn| txn.put("b", b"two")).unwrap();
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn write_txn_sees_own_writes() {
        let (_dir, store) = open_temp();
        store
            .update(|txn| {
                txn.put("k", b"v")?;
                assert_eq!(txn.get("k")?.as_deref(), Some(&b"v"[..]));
                assert_eq!(txn.count()?, 1);
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn scan_yields_key_order() {
        let (_dir, store) = open_temp();
        store
            .update(|txn| {
                for key in ["c", "a", "b"] {
                    txn.put(key, key.as_bytes())?;
                }
                Ok(())
            })
            .unwrap();
        let keys: Vec<String> = store
            .scan(ScanMode::Keys, |row| Ok(row.key))
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(keys, ["a", "b", "c"]);

        let values: Vec<Vec<u8>> = store
            .scan(ScanMode::Entries, |row| Ok(row.value.unwrap_or_default()))
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(values, [b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);
    }

    #[test]
    fn decode_error_ends_scan() {
        let (_dir, store) = open_temp();
        store
            .update(|txn| {
                txn.put("a", b"1")?;
                txn.put("b", b"x")?;
                txn.put("c", b"3")
            })
            .unwrap();
        let items: Vec<Result<String>> = store
            .scan(ScanMode::Entries, |row| {
                if row.value.as_deref() == Some(&b"x"[..]) {
                    Err(BrandCacheError::corrupt(row.key, "not a digit"))
                } else {
                    Ok(row.key)
                }
            })
            .unwrap()
            .collect();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap(), "a");
        assert!(matches!(items[1], Err(BrandCacheError::Corrupt { .. })));
    }

    #[test]
    fn close_releases_lock() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.db");
        let store = Store::open(&path, StoreOptions::default()).unwrap();
        store.update(|txn| txn.put("a", b"1")).unwrap();
        store.close().unwrap();

        let reopened = Store::open(&path, StoreOptions::default()).unwrap();
        assert_eq!(reopened.count().unwrap(), 1);
    }

    #[test]
    fn directory_path_cannot_open() {
        let dir = tempfile::tempdir().unwrap();
        let err = Store::open(dir.path(), StoreOptions::default()).unwrap_err();
        assert!(matches!(err, BrandCacheError::CannotOpen { .. }), "{err:?}");
    }
}
