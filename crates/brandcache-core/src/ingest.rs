//! Ingestion loop and batched persistence stage.
//!
//! The calling thread pages through the authority feed and transforms each
//! page into one batch. Batches cross a bounded channel to a single
//! persistence thread that writes each in one transaction. A counting
//! barrier tracks batches submitted but not yet applied.

use std::sync::mpsc::{self, Receiver, SyncSender};
use std::thread;

use brandcache_error::{BrandCacheError, Result};
use brandcache_store::Store;
use brandcache_types::Brand;
use parking_lot::{Condvar, Mutex};
use tracing::{debug, error, info, warn};

use crate::config::CacheConfig;
use crate::feed::AuthorityFeed;
use crate::transform::transform_term;

// ---------------------------------------------------------------------------
// Counting barrier
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct PendingState {
    count: usize,
    abandoned: bool,
}

/// Counts batches handed to persistence and not yet applied (or dropped).
#[derive(Debug, Default)]
pub struct PendingBatches {
    state: Mutex<PendingState>,
    drained: Condvar,
}

impl PendingBatches {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self) {
        self.state.lock().count += 1;
    }

    /// One batch finished, applied or not.
    pub fn done(&self) {
        let mut state = self.state.lock();
        state.count = state.count.saturating_sub(1);
        if state.count == 0 {
            self.drained.notify_all();
        }
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.state.lock().count
    }

    /// Block until every submitted batch is done or the consumer is gone.
    ///
    /// Returns `false` if the consumer went away with batches outstanding.
    pub fn wait(&self) -> bool {
        let mut state = self.state.lock();
        while state.count > 0 && !state.abandoned {
            self.drained.wait(&mut state);
        }
        state.count == 0
    }

    /// The consumer stopped; release waiters.
    fn abandon(&self) {
        self.state.lock().abandoned = true;
        self.drained.notify_all();
    }
}

/// Held by the persistence thread; releases waiters however it exits.
struct ConsumerGuard<'a>(&'a PendingBatches);

impl Drop for ConsumerGuard<'_> {
    fn drop(&mut self) {
        self.0.abandon();
    }
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// What the ingestion loop fetched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub pages: usize,
    pub terms: usize,
}

/// What the persistence stage wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistReport {
    pub batches_applied: usize,
    pub batches_failed: usize,
    pub entities_written: usize,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Page through `feed` and persist every term into `store`.
///
/// Returns once every submitted batch has been applied or dropped. A feed
/// error ends ingestion and is returned after the queue drains; batches
/// already submitted stay written.
pub fn ingest(
    feed: &dyn AuthorityFeed,
    store: &Store,
    config: &CacheConfig,
) -> Result<(IngestReport, PersistReport)> {
    let pending = PendingBatches::new();
    let (tx, rx) = mpsc::sync_channel::<Vec<Brand>>(config.queue_depth.max(1));

    thread::scope(|scope| {
        let pending_ref = &pending;
        let persister = thread::Builder::new()
            .name("brandcache-persist".to_owned())
            .spawn_scoped(scope, move || persist_batches(store, rx, pending_ref))
            .map_err(|err| {
                BrandCacheError::internal(format!("failed to spawn persistence worker: {err}"))
            })?;

        let fetched = fetch_pages(feed, config, &tx, &pending);
        drop(tx);

        let drained = pending.wait();
        let persisted = persister
            .join()
            .map_err(|_| BrandCacheError::internal("persistence worker panicked"))?;
        if !drained {
            return Err(BrandCacheError::internal(
                "persistence worker stopped with batches outstanding",
            ));
        }

        let fetched = fetched?;
        info!(
            target: "brandcache.ingest",
            pages = fetched.pages,
            terms = fetched.terms,
            batches_applied = persisted.batches_applied,
            batches_failed = persisted.batches_failed,
            entities = persisted.entities_written,
            "authority feed ingested"
        );
        Ok((fetched, persisted))
    })
}

fn fetch_pages(
    feed: &dyn AuthorityFeed,
    config: &CacheConfig,
    tx: &SyncSender<Vec<Brand>>,
    pending: &PendingBatches,
) -> Result<IngestReport> {
    let mut report = IngestReport::default();
    let mut offset = 0;
    loop {
        let terms = feed.fetch_page(offset).inspect_err(|err| {
            error!(target: "brandcache.ingest", offset, error = %err, "authority page fetch failed");
        })?;
        if terms.is_empty() {
            debug!(target: "brandcache.ingest", offset, "authority feed exhausted");
            return Ok(report);
        }

        let batch: Vec<Brand> = terms
            .iter()
            .map(|term| transform_term(term, &config.taxonomy_name))
            .collect();
        debug!(target: "brandcache.ingest", offset, terms = batch.len(), "page transformed");

        report.pages += 1;
        report.terms += batch.len();
        pending.add();
        if tx.send(batch).is_err() {
            pending.done();
            return Err(BrandCacheError::internal("persistence worker stopped early"));
        }
        offset += config.page_size;
    }
}

/// Drain `rx`, writing each batch in one transaction.
fn persist_batches(
    store: &Store,
    rx: Receiver<Vec<Brand>>,
    pending: &PendingBatches,
) -> PersistReport {
    let _guard = ConsumerGuard(pending);
    let mut report = PersistReport::default();

    for mut batch in rx {
        let size = batch.len();
        match store.update(|txn| write_batch(txn, &mut batch)) {
            Ok(()) => {
                report.batches_applied += 1;
                report.entities_written += size;
                debug!(target: "brandcache.persist", size, "batch applied");
            }
            Err(err) => {
                report.batches_failed += 1;
                warn!(target: "brandcache.persist", size, error = %err, "batch dropped");
            }
        }
        pending.done();
    }

    report
}

fn write_batch(txn: &brandcache_store::WriteTxn<'_>, batch: &mut [Brand]) -> Result<()> {
    for brand in batch {
        brand.apply_root_default();
        let value = serde_json::to_vec(&*brand).map_err(|err| BrandCacheError::Encode {
            key: brand.id.clone(),
            detail: err.to_string(),
        })?;
        txn.put(&brand.id, &value)?;
    }
    Ok(())
}
