//! Build, merge and read pipeline for the brand cache.
//!
//! A rebuild cycle resets the store, pages the authority feed through
//! [`ingest`] into the persistence stage, then applies curated records with
//! [`reconcile`]. [`BrandCache`] owns the cycle and the lifecycle flags, and
//! serves point reads, counts and streamed listings between rebuilds.

pub mod config;
pub mod export;
pub mod feed;
pub mod identity;
pub mod ingest;
pub mod legacy_ids;
pub mod markup;
pub mod reconcile;
pub mod service;
pub mod transform;

pub use config::CacheConfig;
pub use export::{write_json_array, write_json_lines};
pub use feed::{
    AuthorityFeed, JsonLinesAuthorityFeed, JsonOverrideFeed, NoOverrides, OverrideFeed,
    StaticAuthorityFeed, StaticOverrideFeed,
};
pub use ingest::{IngestReport, PersistReport};
pub use reconcile::ReconcileReport;
pub use service::{BrandCache, BrandService, RebuildReport, ReloadAck, ReloadHandle};
