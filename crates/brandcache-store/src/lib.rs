//! Single-bucket snapshot store for the brand cache.
//!
//! The store is an SQLite database in WAL mode holding one table, the
//! *bucket*, keyed by entity identifier. WAL gives every reader a stable
//! snapshot, so a bucket reset committed by a rebuild never tears a scan
//! that started before it.
//!
//! - [`Store::open`] takes an exclusive cross-process lock (see [`lock`]).
//! - [`Store::reset_bucket`] drops and recreates the bucket atomically.
//! - [`Store::update`] runs one write transaction; [`Store::view`] one read
//!   transaction.
//! - [`Store::scan`] streams the bucket in key order from a producer thread
//!   holding its own read transaction (see [`scan`]).

pub mod lock;
pub mod scan;
mod store;

pub use lock::StoreLock;
pub use scan::{Scan, ScanMode, ScanRow};
pub use store::{BUCKET, ReadTxn, Store, StoreOptions, WriteTxn};
