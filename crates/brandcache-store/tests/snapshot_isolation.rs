//! Reader isolation, cancellation and locking for the snapshot store.

use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

use brandcache_error::{BrandCacheError, Result};
use brandcache_store::{ScanMode, Store, StoreOptions};

fn open(dir: &tempfile::TempDir) -> Arc<Store> {
    Arc::new(Store::open(dir.path().join("cache.db"), StoreOptions::default()).unwrap())
}

fn fill(store: &Store, keys: &[&str]) {
    store
        .update(|txn| {
            for key in keys {
                txn.put(key, key.as_bytes())?;
            }
            Ok(())
        })
        .unwrap();
}

fn wait_for_idle_scans(store: &Store) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while store.active_scans() > 0 {
        assert!(Instant::now() < deadline, "scan producer never released its snapshot");
        thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn scan_started_before_reset_sees_old_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let store = open(&dir);
    fill(&store, &["a", "b", "c"]);

    let mut scan = store.scan(ScanMode::Keys, |row| Ok(row.key)).unwrap();
    assert_eq!(scan.next().unwrap().unwrap(), "a");

    store.reset_bucket().unwrap();
    fill(&store, &["x"]);
    assert_eq!(store.count().unwrap(), 1);

    let rest: Vec<String> = scan.collect::<Result<_>>().unwrap();
    assert_eq!(rest, ["b", "c"]);

    let fresh: Vec<String> = store
        .scan(ScanMode::Keys, |row| Ok(row.key))
        .unwrap()
        .collect::<Result<_>>()
        .unwrap();
    assert_eq!(fresh, ["x"]);
}

#[test]
fn snapshot_is_pinned_before_first_pull() {
    let dir = tempfile::tempdir().unwrap();
    let store = open(&dir);
    fill(&store, &["a", "b"]);

    let scan = store.scan(ScanMode::Keys, |row| Ok(row.key)).unwrap();
    store.reset_bucket().unwrap();

    let keys: Vec<String> = scan.collect::<Result<_>>().unwrap();
    assert_eq!(keys, ["a", "b"]);
}

#[test]
fn dropped_scan_releases_its_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let store = open(&dir);
    let keys: Vec<String> = (0..50).map(|i| format!("k{i:03}")).collect();
    let refs: Vec<&str> = keys.iter().map(String::as_str).collect();
    fill(&store, &refs);

    let mut scan = store.scan(ScanMode::Entries, |row| Ok(row.key)).unwrap();
    assert_eq!(scan.next().unwrap().unwrap(), "k000");
    assert_eq!(store.active_scans(), 1);
    drop(scan);

    wait_for_idle_scans(&store);
    store.reset_bucket().unwrap();
    assert_eq!(store.count().unwrap(), 0);
}

#[test]
fn slow_reader_does_not_block_writes() {
    let dir = tempfile::tempdir().unwrap();
    let store = open(&dir);
    fill(&store, &["a", "b", "c"]);

    let barrier = Arc::new(Barrier::new(2));
    let reader = {
        let store = Arc::clone(&store);
        let barrier = Arc::clone(&barrier);
        thread::spawn(move || {
            let mut scan = store.scan(ScanMode::Keys, |row| Ok(row.key)).unwrap();
            let first = scan.next().unwrap().unwrap();
            barrier.wait();
            // Writer runs here while this scan is parked mid-stream.
            barrier.wait();
            let mut seen = vec![first];
            seen.extend(scan.map(|item| item.unwrap()));
            seen
        })
    };

    barrier.wait();
    let started = Instant::now();
    store.reset_bucket().unwrap();
    fill(&store, &["z"]);
    assert!(started.elapsed() < Duration::from_secs(2));
    barrier.wait();

    assert_eq!(reader.join().unwrap(), ["a", "b", "c"]);
    assert_eq!(store.count().unwrap(), 1);
}

#[test]
fn second_open_of_locked_store_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cache.db");
    let _held = Store::open(&path, StoreOptions::default()).unwrap();

    let options = StoreOptions::default().with_lock_timeout(Duration::from_millis(100));
    let err = Store::open(&path, options).unwrap_err();
    assert!(matches!(err, BrandCacheError::StoreLocked { .. }), "{err:?}");
}

#[test]
fn data_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cache.db");
    {
        let store = Store::open(&path, StoreOptions::default()).unwrap();
        fill(&store, &["a", "b"]);
        store.close().unwrap();
    }
    let store = Arc::new(Store::open(&path, StoreOptions::default()).unwrap());
    let keys: Vec<String> = store
        .scan(ScanMode::Keys, |row| Ok(row.key))
        .unwrap()
        .collect::<Result<_>>()
        .unwrap();
    assert_eq!(keys, ["a", "b"]);
}

#[test]
fn concurrent_scans_share_the_pool() {
    let dir = tempfile::tempdir().unwrap();
    let store = open(&dir);
    fill(&store, &["a", "b", "c", "d"]);

    let handles: Vec<_> = (0..12)
        .map(|_| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                store
                    .scan(ScanMode::Keys, |row| Ok(row.key))
                    .unwrap()
                    .count()
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), 4);
    }
    wait_for_idle_scans(&store);
}
