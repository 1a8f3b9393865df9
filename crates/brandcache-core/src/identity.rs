//! Natural key → stable identity.
//!
//! A natural key is `base64(raw_id) + "-" + base64(taxonomy)`. Its identity
//! is the hand-assigned one from [`crate::legacy_ids`] when present, else
//! a version-3 UUID built from the MD5 of the key bytes alone (an empty
//! namespace, not the nil UUID prepended).

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use brandcache_types::ROOT_BRAND_ID;
use md5::{Digest, Md5};
use uuid::Builder;

use crate::legacy_ids;

/// Build the natural key for a term of `taxonomy`.
#[must_use]
pub fn natural_key(raw_id: &str, taxonomy: &str) -> String {
    format!("{}-{}", STANDARD.encode(raw_id), STANDARD.encode(taxonomy))
}

/// The name-based identity of `natural_key`, ignoring the legacy table.
#[must_use]
pub fn hash_identity(natural_key: &str) -> String {
    let digest: [u8; 16] = Md5::digest(natural_key.as_bytes()).into();
    Builder::from_md5_bytes(digest).into_uuid().to_string()
}

/// The identity of `natural_key`: legacy assignment first, else the hash.
#[must_use]
pub fn derive_identity(natural_key: &str) -> String {
    legacy_ids::lookup(natural_key).map_or_else(|| hash_identity(natural_key), str::to_owned)
}

/// Resolve a natural key supplied by the curated feed.
///
/// Blank keys resolve to nothing. The root's identity literal stands for
/// the root itself.
#[must_use]
pub fn resolve_identity(natural_key: &str) -> Option<String> {
    if natural_key.trim().is_empty() {
        return None;
    }
    if natural_key == ROOT_BRAND_ID {
        return Some(ROOT_BRAND_ID.to_owned());
    }
    Some(derive_identity(natural_key))
}
