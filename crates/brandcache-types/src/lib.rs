//! Shared data types for the brand cache.
//!
//! - [`Brand`]: the cached entity and unit of storage.
//! - [`RawTerm`] / [`OverrideRecord`]: inputs from the two upstream feeds.
//! - [`ServiceState`]: the `initialised` / `data_loaded` lifecycle flags.
//! - [`BrandId`] / [`BrandLink`]: records emitted by the listing streams.

mod brand;
mod feed;
mod state;

pub use brand::{AlternativeIdentifiers, Brand, BrandId, BrandLink};
pub use feed::{OverrideRecord, RawTerm};
pub use state::ServiceState;

/// Identity of the well-known root brand: the implicit parent of every brand
/// that has no parent of its own.
pub const ROOT_BRAND_ID: &str = "dbb0bdae-1f0c-11e4-b0cb-b2227cce2b54";

/// Value of [`Brand::kind`] for every cached entity.
pub const BRAND_TYPE: &str = "Brand";
