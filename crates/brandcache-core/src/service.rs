//! The brand service: rebuild orchestration and the read facade.
//!
//! One read/write lock guards the lifecycle flags and the store handle. A
//! rebuild takes it for writing only around flag transitions and the
//! open/reset step; feed calls, bulk writes and reconciliation run
//! unlocked. Readers and curated merges hold it for reading while they
//! touch the store, so a reset never lands in the middle of one. At most
//! one rebuild runs at a time.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use brandcache_error::{BrandCacheError, Result};
use brandcache_store::{Scan, ScanMode, ScanRow, Store};
use brandcache_types::{Brand, BrandId, BrandLink, OverrideRecord, ServiceState};
use parking_lot::RwLock;
use tracing::{error, info, warn};

use crate::config::CacheConfig;
use crate::feed::{AuthorityFeed, OverrideFeed};
use crate::ingest::{IngestReport, PersistReport, ingest};
use crate::reconcile::{ReconcileReport, reconcile};

/// Operations the transport layer needs from the cache.
pub trait BrandService: Send + Sync {
    /// The brand stored under `id`, or `None`.
    fn get_brand(&self, id: &str) -> Result<Option<Brand>>;
    /// Every brand, in identifier order.
    fn list_all(&self) -> Result<Scan<Brand>>;
    /// Every identifier, in order.
    fn list_ids(&self) -> Result<Scan<BrandId>>;
    /// A link per brand: `base_url` joined with its identifier.
    fn list_links(&self, base_url: &str) -> Result<Scan<BrandLink>>;
    /// Number of cached brands; 0 while a rebuild is in flight.
    fn count(&self) -> Result<usize>;
    fn is_initialised(&self) -> bool;
    fn is_data_loaded(&self) -> bool;
    /// Run a full rebuild on the calling thread.
    fn reload(&self) -> Result<RebuildReport>;
    /// Start a full rebuild in the background and return at once.
    fn trigger_reload(&self) -> ReloadAck;
    /// Clear both flags and release the store.
    ///
    /// Open streams keep the store, and its file lock, alive until they are
    /// dropped; a reload before then fails with `StoreLocked` once the open
    /// timeout runs out.
    fn shutdown(&self) -> Result<()>;
    /// Apply curated records to the loaded snapshot. `NotReady` while a
    /// rebuild is in flight.
    fn merge_overrides(&self, records: &[OverrideRecord]) -> Result<ReconcileReport>;
}

/// Summary of one completed rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RebuildReport {
    pub ingest: IngestReport,
    pub persist: PersistReport,
    pub reconcile: ReconcileReport,
    pub elapsed: Duration,
}

/// Answer to [`BrandService::trigger_reload`].
#[derive(Debug)]
pub enum ReloadAck {
    /// A rebuild was started.
    Accepted(ReloadHandle),
    /// A rebuild was already in flight; nothing new was started.
    AlreadyRunning,
}

impl ReloadAck {
    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }
}

/// Handle on a background rebuild.
#[derive(Debug)]
pub struct ReloadHandle {
    worker: std::result::Result<JoinHandle<Result<RebuildReport>>, BrandCacheError>,
}

impl ReloadHandle {
    /// Block until the rebuild ends and return its outcome.
    pub fn wait(self) -> Result<RebuildReport> {
        match self.worker {
            Ok(handle) => handle
                .join()
                .map_err(|_| BrandCacheError::internal("rebuild thread panicked"))?,
            Err(err) => Err(err),
        }
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.worker.as_ref().map_or(true, JoinHandle::is_finished)
    }
}

// ---------------------------------------------------------------------------
// BrandCache
// ---------------------------------------------------------------------------

struct Shared {
    state: ServiceState,
    store: Option<Arc<Store>>,
}

struct CacheInner {
    shared: RwLock<Shared>,
    rebuilding: AtomicBool,
    config: CacheConfig,
    authority: Arc<dyn AuthorityFeed>,
    overrides: Arc<dyn OverrideFeed>,
}

/// Clears the rebuild flag when a rebuild ends, or never starts.
struct RebuildGuard {
    inner: Arc<CacheInner>,
}

impl Drop for RebuildGuard {
    fn drop(&mut self) {
        self.inner.rebuilding.store(false, Ordering::Release);
    }
}

/// The cache service over one on-disk store and two feeds.
///
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct BrandCache {
    inner: Arc<CacheInner>,
}

impl std::fmt::Debug for BrandCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrandCache")
            .field("config", &self.inner.config)
            .field("state", &self.state())
            .field("rebuilding", &self.is_rebuilding())
            .finish_non_exhaustive()
    }
}

impl BrandCache {
    /// Build a service without touching the store. Both flags start unset.
    pub fn new<A, O>(config: CacheConfig, authority: A, overrides: O) -> Result<Self>
    where
        A: AuthorityFeed + 'static,
        O: OverrideFeed + 'static,
    {
        config.validate()?;
        Ok(Self {
            inner: Arc::new(CacheInner {
                shared: RwLock::new(Shared {
                    state: ServiceState::new(),
                    store: None,
                }),
                rebuilding: AtomicBool::new(false),
                config,
                authority: Arc::new(authority),
                overrides: Arc::new(overrides),
            }),
        })
    }

    /// Build a service and start the first rebuild in the background.
    pub fn start<A, O>(config: CacheConfig, authority: A, overrides: O) -> Result<(Self, ReloadHandle)>
    where
        A: AuthorityFeed + 'static,
        O: OverrideFeed + 'static,
    {
        let cache = Self::new(config, authority, overrides)?;
        match cache.trigger_reload() {
            ReloadAck::Accepted(handle) => Ok((cache, handle)),
            ReloadAck::AlreadyRunning => Err(BrandCacheError::ReloadInProgress),
        }
    }

    #[must_use]
    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    /// Snapshot of the lifecycle flags.
    #[must_use]
    pub fn state(&self) -> ServiceState {
        self.inner.shared.read().state
    }

    #[must_use]
    pub fn is_rebuilding(&self) -> bool {
        self.inner.rebuilding.load(Ordering::Acquire)
    }

    /// Links under the configured base URL.
    pub fn list_default_links(&self) -> Result<Scan<BrandLink>> {
        self.list_links(&self.inner.config.base_url)
    }

    fn try_begin_rebuild(&self) -> Option<RebuildGuard> {
        self.inner
            .rebuilding
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RebuildGuard {
                inner: Arc::clone(&self.inner),
            })
    }

    /// Run `f` against the store while holding the read lock, so no rebuild
    /// can reset the bucket until `f` returns.
    fn with_ready_store<R>(&self, f: impl FnOnce(&Arc<Store>) -> Result<R>) -> Result<R> {
        let shared = self.inner.shared.read();
        match (&shared.store, shared.state) {
            (Some(store), state) if state.is_ready() => f(store),
            (Some(_), state) if state.initialised => Err(BrandCacheError::NotReady),
            _ => Err(BrandCacheError::NotInitialised),
        }
    }

    fn scan<T, F>(&self, mode: ScanMode, decode: F) -> Result<Scan<T>>
    where
        T: Send + 'static,
        F: FnMut(ScanRow) -> Result<T> + Send + 'static,
    {
        // The snapshot is pinned before the read lock is released.
        self.with_ready_store(|store| store.scan(mode, decode))
    }
}

fn decode_brand(key: &str, value: &[u8]) -> Result<Brand> {
    serde_json::from_slice(value).map_err(|err| BrandCacheError::corrupt(key, err.to_string()))
}

// ---------------------------------------------------------------------------
// Rebuild cycle
// ---------------------------------------------------------------------------

impl CacheInner {
    /// Reset → ingest → persist → reconcile.
    fn run_cycle(&self) -> Result<RebuildReport> {
        let started = Instant::now();
        info!(
            target: "brandcache.service",
            cache_file = %self.config.cache_file.display(),
            "rebuild started"
        );

        let store = self.open_and_reset()?;
        let (ingest, persist) = ingest(self.authority.as_ref(), &store, &self.config)?;

        let records = self.overrides.fetch_all().inspect_err(|err| {
            error!(target: "brandcache.service", error = %err, "override feed fetch failed");
        })?;
        let reconcile = reconcile(&store, &records)?;

        let finished = {
            let mut shared = self.shared.write();
            let current = shared
                .store
                .as_ref()
                .is_some_and(|open| Arc::ptr_eq(open, &store));
            if current {
                shared.state.finish_rebuild();
            }
            current && shared.state.data_loaded
        };

        let report = RebuildReport {
            ingest,
            persist,
            reconcile,
            elapsed: started.elapsed(),
        };
        if finished {
            info!(
                target: "brandcache.service",
                terms = report.ingest.terms,
                curated = report.reconcile.written(),
                elapsed_ms = report.elapsed.as_millis() as u64,
                "rebuild complete; data loaded"
            );
        } else {
            warn!(
                target: "brandcache.service",
                "rebuild finished after shutdown; data stays unloaded"
            );
        }
        Ok(report)
    }

    /// Under the write lock: clear `data_loaded`, open the store if needed,
    /// and reset the bucket.
    fn open_and_reset(&self) -> Result<Arc<Store>> {
        let mut shared = self.shared.write();
        shared.state.begin_rebuild();

        let store = match &shared.store {
            Some(store) => Arc::clone(store),
            None => match Store::open(&self.config.cache_file, self.config.store_options()) {
                Ok(store) => {
                    let store = Arc::new(store);
                    shared.store = Some(Arc::clone(&store));
                    shared.state.mark_opened();
                    store
                }
                Err(err) => {
                    shared.state.mark_open_failed();
                    error!(
                        target: "brandcache.service",
                        cache_file = %self.config.cache_file.display(),
                        error = %err,
                        "cannot open cache store"
                    );
                    return Err(err);
                }
            },
        };

        store.reset_bucket()?;
        Ok(store)
    }

    fn run_logged(&self) -> Result<RebuildReport> {
        self.run_cycle().inspect_err(|err| {
            error!(
                target: "brandcache.service",
                error = %err,
                class = ?err.class(),
                "rebuild failed; data stays unloaded"
            );
        })
    }
}

// ---------------------------------------------------------------------------
// BrandService
// ---------------------------------------------------------------------------

impl BrandService for BrandCache {
    fn get_brand(&self, id: &str) -> Result<Option<Brand>> {
        self.with_ready_store(|store| {
            store
                .get(id)?
                .map(|value| decode_brand(id, &value))
                .transpose()
        })
    }

    fn list_all(&self) -> Result<Scan<Brand>> {
        self.scan(ScanMode::Entries, |row| {
            let value = row.value.unwrap_or_default();
            decode_brand(&row.key, &value)
        })
    }

    fn list_ids(&self) -> Result<Scan<BrandId>> {
        self.scan(ScanMode::Keys, |row| Ok(BrandId { id: row.key }))
    }

    fn list_links(&self, base_url: &str) -> Result<Scan<BrandLink>> {
        let base_url = base_url.to_owned();
        self.scan(ScanMode::Keys, move |row| Ok(BrandLink::new(&base_url, &row.key)))
    }

    fn count(&self) -> Result<usize> {
        let shared = self.inner.shared.read();
        if !shared.state.data_loaded {
            return Ok(0);
        }
        match &shared.store {
            Some(store) => store.count(),
            None => Ok(0),
        }
    }

    fn is_initialised(&self) -> bool {
        self.inner.shared.read().state.initialised
    }

    fn is_data_loaded(&self) -> bool {
        self.inner.shared.read().state.data_loaded
    }

    fn reload(&self) -> Result<RebuildReport> {
        let Some(_guard) = self.try_begin_rebuild() else {
            return Err(BrandCacheError::ReloadInProgress);
        };
        self.inner.run_logged()
    }

    fn trigger_reload(&self) -> ReloadAck {
        let Some(guard) = self.try_begin_rebuild() else {
            info!(target: "brandcache.service", "reload requested while a rebuild is running");
            return ReloadAck::AlreadyRunning;
        };
        self.inner.shared.write().state.begin_rebuild();

        let worker = thread::Builder::new()
            .name("brandcache-rebuild".to_owned())
            .spawn(move || {
                let guard = guard;
                guard.inner.run_logged()
            })
            .map_err(|err| {
                error!(target: "brandcache.service", error = %err, "cannot spawn rebuild thread");
                BrandCacheError::internal(format!("failed to spawn rebuild thread: {err}"))
            });
        ReloadAck::Accepted(ReloadHandle { worker })
    }

    fn shutdown(&self) -> Result<()> {
        info!(target: "brandcache.service", "shutting down");
        let store = {
            let mut shared = self.inner.shared.write();
            shared.state.shut_down();
            shared.store.take()
        };
        let Some(store) = store else {
            return Err(BrandCacheError::StoreNotOpen);
        };
        match Arc::try_unwrap(store) {
            Ok(store) => store.close(),
            Err(shared) => {
                warn!(
                    target: "brandcache.service",
                    active_scans = shared.active_scans(),
                    "store still in use; it closes when the last stream or rebuild ends"
                );
                Ok(())
            }
        }
    }

    fn merge_overrides(&self, records: &[OverrideRecord]) -> Result<ReconcileReport> {
        // Refused mid-rebuild: the bucket is about to be rebuilt from the
        // feeds. Holding the read lock keeps a new rebuild from resetting it
        // underneath the merge.
        self.with_ready_store(|store| reconcile(store, records))
    }
}
