//! Pull-based streaming scans over the bucket.
//!
//! A scan pins its read snapshot on the caller's thread, then hands the
//! connection to a producer thread that walks the bucket in key order and
//! feeds a rendezvous channel. The producer therefore runs at most one
//! element ahead of the consumer. Dropping the [`Scan`] disconnects the
//! channel; the producer notices on its next send, ends its read
//! transaction, and returns the connection to the pool.

use std::fmt;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::thread;

use brandcache_error::{BrandCacheError, Result};
use rusqlite::{Connection, Row};
use tracing::{debug, warn};

use crate::store::{Store, end_read, storage_err};

/// Which columns a scan reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    /// Keys only; [`ScanRow::value`] is `None`.
    Keys,
    /// Keys and stored values.
    Entries,
}

impl ScanMode {
    const fn sql(self) -> &'static str {
        match self {
            Self::Keys => "SELECT key FROM brand ORDER BY key",
            Self::Entries => "SELECT key, value FROM brand ORDER BY key",
        }
    }
}

/// One raw row handed to a scan's decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRow {
    pub key: String,
    pub value: Option<Vec<u8>>,
}

/// A lazy, forward-only, non-restartable sequence over one bucket snapshot.
///
/// Yields decoded items in key order. After an `Err` item the sequence
/// ends.
pub struct Scan<T> {
    rx: Receiver<Result<T>>,
}

impl<T> fmt::Debug for Scan<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scan").finish_non_exhaustive()
    }
}

impl<T> Iterator for Scan<T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        self.rx.recv().ok()
    }
}

/// How a producer finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanEnd {
    Exhausted(usize),
    Cancelled(usize),
    Failed(usize),
}

/// Decrements the store's live-scan counter however the producer ends,
/// including when the producer thread never starts.
struct ScanGuard {
    store: Arc<Store>,
}

impl Drop for ScanGuard {
    fn drop(&mut self) {
        self.store.scan_finished();
    }
}

pub(crate) fn spawn<T, F>(store: &Arc<Store>, mode: ScanMode, decode: F) -> Result<Scan<T>>
where
    T: Send + 'static,
    F: FnMut(ScanRow) -> Result<T> + Send + 'static,
{
    let conn = store.checkout_reader()?;
    if let Err(err) = pin_snapshot(&conn) {
        end_read(&conn);
        store.checkin_reader(conn);
        return Err(err);
    }

    let (tx, rx) = mpsc::sync_channel(0);
    store.scan_started();
    let guard = ScanGuard {
        store: Arc::clone(store),
    };

    thread::Builder::new()
        .name("brandcache-scan".to_owned())
        .spawn(move || {
            let mut decode = decode;
            let end = produce(&conn, mode, &mut decode, &tx);
            end_read(&conn);
            guard.store.checkin_reader(conn);
            match end {
                ScanEnd::Exhausted(rows) => {
                    debug!(target: "brandcache.store", ?mode, rows, "scan drained");
                }
                ScanEnd::Cancelled(rows) => {
                    debug!(target: "brandcache.store", ?mode, rows, "scan cancelled by consumer");
                }
                ScanEnd::Failed(rows) => {
                    warn!(target: "brandcache.store", ?mode, rows, "scan ended on error");
                }
            }
            drop(guard);
        })
        .map_err(|err| BrandCacheError::internal(format!("failed to spawn scan producer: {err}")))?;

    Ok(Scan { rx })
}

/// Start a read transaction and touch the bucket so WAL pins the snapshot
/// now, not at the first `next()`.
fn pin_snapshot(conn: &Connection) -> Result<()> {
    conn.execute_batch("BEGIN DEFERRED;").map_err(storage_err)?;
    conn.query_row("SELECT EXISTS(SELECT 1 FROM brand)", [], |row| {
        row.get::<_, i64>(0)
    })
    .map_err(storage_err)?;
    Ok(())
}

fn produce<T, F>(conn: &Connection, mode: ScanMode, decode: &mut F, tx: &SyncSender<Result<T>>) -> ScanEnd
where
    F: FnMut(ScanRow) -> Result<T>,
{
    let mut stmt = match conn.prepare(mode.sql()) {
        Ok(stmt) => stmt,
        Err(err) => {
            let _ = tx.send(Err(storage_err(err)));
            return ScanEnd::Failed(0);
        }
    };
    let mut rows = match stmt.query([]) {
        Ok(rows) => rows,
        Err(err) => {
            let _ = tx.send(Err(storage_err(err)));
            return ScanEnd::Failed(0);
        }
    };

    let mut sent = 0;
    loop {
        let item = match rows.next() {
            Ok(Some(row)) => read_row(row, mode).and_then(&mut *decode),
            Ok(None) => return ScanEnd::Exhausted(sent),
            Err(err) => Err(storage_err(err)),
        };
        let failed = item.is_err();
        if tx.send(item).is_err() {
            return ScanEnd::Cancelled(sent);
        }
        if failed {
            return ScanEnd::Failed(sent);
        }
        sent += 1;
    }
}

fn read_row(row: &Row<'_>, mode: ScanMode) -> Result<ScanRow> {
    let key: String = row.get(0).map_err(storage_err)?;
    let value = match mode {
        ScanMode::Keys => None,
        ScanMode::Entries => Some(row.get::<_, Vec<u8>>(1).map_err(storage_err)?),
    };
    Ok(ScanRow { key, value })
}
