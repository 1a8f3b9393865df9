use std::path::PathBuf;

use thiserror::Error;

/// Primary error type for brand cache operations.
///
/// Structured variants for the failure modes of the build/merge/cache
/// pipeline. "Not found" is deliberately absent: lookups return `Option`.
#[derive(Error, Debug)]
pub enum BrandCacheError {
    // === Store Errors ===
    /// The store's exclusive lock is held by another process (or handle).
    #[error("cache store is locked: '{path}' (waited {waited_ms} ms)")]
    StoreLocked { path: PathBuf, waited_ms: u64 },

    /// The store file could not be opened or created.
    #[error("unable to open cache store '{path}': {detail}")]
    CannotOpen { path: PathBuf, detail: String },

    /// A read or write against the open store failed.
    #[error("cache store error: {detail}")]
    Storage { detail: String },

    /// A stored value could not be decoded.
    #[error("stored value for '{key}' is corrupt: {detail}")]
    Corrupt { key: String, detail: String },

    /// An entity could not be encoded for storage or export.
    #[error("failed to encode '{key}': {detail}")]
    Encode { key: String, detail: String },

    // === Feed Errors ===
    /// A feed request failed. `offset` is set for authority-feed pages.
    #[error("{feed} feed fetch failed{}: {detail}", offset_suffix(.offset))]
    FeedFetch {
        feed: &'static str,
        offset: Option<usize>,
        detail: String,
    },

    /// A feed payload could not be decoded.
    #[error("{feed} feed payload is malformed: {detail}")]
    FeedDecode { feed: &'static str, detail: String },

    // === Record Errors ===
    /// Description markup could not be converted to plain text.
    #[error("markup error at byte {offset}: {detail}")]
    Markup { offset: usize, detail: String },

    /// A curated record carries no natural key that resolves to an identity.
    #[error("curated record '{label}' has no resolvable identity")]
    UnresolvableIdentity { label: String },

    // === Service State ===
    /// A rebuild is in flight; the snapshot is not complete.
    #[error("brand data is not loaded yet")]
    NotReady,

    /// The store has never been opened, or the service was shut down.
    #[error("brand service is not initialised")]
    NotInitialised,

    /// An operation needed the store handle but none is open.
    #[error("cache store is not open")]
    StoreNotOpen,

    /// A synchronous reload was requested while another is running.
    #[error("a rebuild is already in progress")]
    ReloadInProgress,

    // === Configuration ===
    /// A configuration value is missing or out of range.
    #[error("invalid configuration for {field}: {detail}")]
    InvalidConfig { field: &'static str, detail: String },

    // === Generic ===
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal logic error (worker panicked, channel torn down early).
    #[error("internal error: {0}")]
    Internal(String),
}

fn offset_suffix(offset: &Option<usize>) -> String {
    offset.map(|o| format!(" at offset {o}")).unwrap_or_default()
}

/// How far a failure reaches, per the pipeline's error taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Aborts the current rebuild; the process keeps serving.
    FatalToCycle,
    /// Skips one record; the batch or cycle continues.
    FatalToRecord,
    /// The service cannot answer yet (maps to "unavailable").
    Unavailable,
    /// Persisted data is unreadable (maps to "internal error").
    Corrupt,
    /// Everything else (maps to "internal error").
    Internal,
}

impl BrandCacheError {
    /// Classify this error for the transport layer and for logging.
    #[allow(clippy::match_same_arms)]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::StoreLocked { .. }
            | Self::CannotOpen { .. }
            | Self::FeedFetch { .. }
            | Self::FeedDecode { .. } => ErrorClass::FatalToCycle,
            Self::Markup { .. } | Self::UnresolvableIdentity { .. } => ErrorClass::FatalToRecord,
            Self::NotReady
            | Self::NotInitialised
            | Self::StoreNotOpen
            | Self::ReloadInProgress => ErrorClass::Unavailable,
            Self::Corrupt { .. } => ErrorClass::Corrupt,
            Self::Storage { .. }
            | Self::Encode { .. }
            | Self::InvalidConfig { .. }
            | Self::Io(_)
            | Self::Internal(_) => ErrorClass::Internal,
        }
    }

    /// Whether retrying the same call later may succeed.
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::StoreLocked { .. }
                | Self::NotReady
                | Self::ReloadInProgress
                | Self::FeedFetch { .. }
        )
    }

    /// Human-friendly suggestion for fixing this error.
    pub const fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::StoreLocked { .. } => {
                Some("Stop the other process using this cache file or point at another file")
            }
            Self::CannotOpen { .. } => Some("Check that the cache path is a writable file path"),
            Self::Corrupt { .. } => Some("Trigger a reload to rebuild the cache from the feeds"),
            Self::NotReady | Self::ReloadInProgress => {
                Some("Wait for the running rebuild to finish")
            }
            Self::UnresolvableIdentity { .. } => {
                Some("Add the authority identifier to the curated record")
            }
            Self::InvalidConfig { .. } => Some("Fix the flag or environment variable named above"),
            _ => None,
        }
    }

    /// Process exit code for the CLI.
    pub const fn exit_code(&self) -> i32 {
        match self.class() {
            ErrorClass::FatalToCycle => 3,
            ErrorClass::FatalToRecord => 4,
            ErrorClass::Unavailable => 5,
            ErrorClass::Corrupt => 6,
            ErrorClass::Internal => 1,
        }
    }

    /// Create a storage error.
    pub fn storage(detail: impl Into<String>) -> Self {
        Self::Storage {
            detail: detail.into(),
        }
    }

    /// Create a corrupt-value error for `key`.
    pub fn corrupt(key: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Corrupt {
            key: key.into(),
            detail: detail.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Create a configuration error.
    pub fn invalid_config(field: &'static str, detail: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            detail: detail.into(),
        }
    }
}

/// Result type alias using `BrandCacheError`.
pub type Result<T> = std::result::Result<T, BrandCacheError>;
