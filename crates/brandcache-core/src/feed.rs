//! Upstream feed interfaces and the implementations shipped with the core.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use brandcache_error::{BrandCacheError, Result};
use brandcache_types::{OverrideRecord, RawTerm};
use parking_lot::RwLock;

/// Feed name used in authority-feed errors.
pub const AUTHORITY_FEED: &str = "authority";
/// Feed name used in override-feed errors.
pub const OVERRIDE_FEED: &str = "override";

/// The paginated term authority.
pub trait AuthorityFeed: Send + Sync {
    /// Terms starting at `offset`. An empty page ends the data.
    fn fetch_page(&self, offset: usize) -> Result<Vec<RawTerm>>;
}

/// The curated override source, fetched whole.
pub trait OverrideFeed: Send + Sync {
    fn fetch_all(&self) -> Result<Vec<OverrideRecord>>;
}

impl<F: AuthorityFeed + ?Sized> AuthorityFeed for Arc<F> {
    fn fetch_page(&self, offset: usize) -> Result<Vec<RawTerm>> {
        (**self).fetch_page(offset)
    }
}

impl<F: OverrideFeed + ?Sized> OverrideFeed for Arc<F> {
    fn fetch_all(&self) -> Result<Vec<OverrideRecord>> {
        (**self).fetch_all()
    }
}

// ---------------------------------------------------------------------------
// Authority feeds
// ---------------------------------------------------------------------------

/// In-memory terms served in pages of `page_size`.
///
/// The page size must match the ingestion step (`CacheConfig::page_size`).
#[derive(Debug)]
pub struct StaticAuthorityFeed {
    terms: RwLock<Vec<RawTerm>>,
    page_size: usize,
}

impl StaticAuthorityFeed {
    pub fn new(terms: Vec<RawTerm>, page_size: usize) -> Self {
        Self {
            terms: RwLock::new(terms),
            page_size: page_size.max(1),
        }
    }

    /// Swap the served terms; takes effect from the next page fetched.
    pub fn replace(&self, terms: Vec<RawTerm>) {
        *self.terms.write() = terms;
    }

    pub fn push(&self, term: RawTerm) {
        self.terms.write().push(term);
    }
}

impl AuthorityFeed for StaticAuthorityFeed {
    fn fetch_page(&self, offset: usize) -> Result<Vec<RawTerm>> {
        Ok(page(&self.terms.read(), offset, self.page_size))
    }
}

/// One JSON raw term per line in a file, paged by line offset.
///
/// Blank lines are ignored. The file is re-read on every page so a reload
/// sees edits.
#[derive(Debug, Clone)]
pub struct JsonLinesAuthorityFeed {
    path: PathBuf,
    page_size: usize,
}

impl JsonLinesAuthorityFeed {
    pub fn new(path: impl Into<PathBuf>, page_size: usize) -> Self {
        Self {
            path: path.into(),
            page_size: page_size.max(1),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AuthorityFeed for JsonLinesAuthorityFeed {
    fn fetch_page(&self, offset: usize) -> Result<Vec<RawTerm>> {
        let contents = fs::read_to_string(&self.path).map_err(|err| BrandCacheError::FeedFetch {
            feed: AUTHORITY_FEED,
            offset: Some(offset),
            detail: format!("{}: {err}", self.path.display()),
        })?;

        contents
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .skip(offset)
            .take(self.page_size)
            .map(|(index, line)| {
                serde_json::from_str(line).map_err(|err| BrandCacheError::FeedDecode {
                    feed: AUTHORITY_FEED,
                    detail: format!("{} line {}: {err}", self.path.display(), index + 1),
                })
            })
            .collect()
    }
}

fn page(terms: &[RawTerm], offset: usize, page_size: usize) -> Vec<RawTerm> {
    terms
        .iter()
        .skip(offset)
        .take(page_size)
        .cloned()
        .collect()
}

// ---------------------------------------------------------------------------
// Override feeds
// ---------------------------------------------------------------------------

/// In-memory curated records.
#[derive(Debug, Default)]
pub struct StaticOverrideFeed {
    records: RwLock<Vec<OverrideRecord>>,
}

impl StaticOverrideFeed {
    pub fn new(records: Vec<OverrideRecord>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    pub fn replace(&self, records: Vec<OverrideRecord>) {
        *self.records.write() = records;
    }
}

impl OverrideFeed for StaticOverrideFeed {
    fn fetch_all(&self) -> Result<Vec<OverrideRecord>> {
        Ok(self.records.read().clone())
    }
}

/// Curated records from a file holding one JSON array.
#[derive(Debug, Clone)]
pub struct JsonOverrideFeed {
    path: PathBuf,
}

impl JsonOverrideFeed {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl OverrideFeed for JsonOverrideFeed {
    fn fetch_all(&self) -> Result<Vec<OverrideRecord>> {
        let contents = fs::read(&self.path).map_err(|err| BrandCacheError::FeedFetch {
            feed: OVERRIDE_FEED,
            offset: None,
            detail: format!("{}: {err}", self.path.display()),
        })?;
        serde_json::from_slice(&contents).map_err(|err| BrandCacheError::FeedDecode {
            feed: OVERRIDE_FEED,
            detail: format!("{}: {err}", self.path.display()),
        })
    }
}

/// An override feed with nothing in it.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOverrides;

impl OverrideFeed for NoOverrides {
    fn fetch_all(&self) -> Result<Vec<OverrideRecord>> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use super::*;

    fn terms(n: usize) -> Vec<RawTerm> {
        (0..n)
            .map(|i| RawTerm::new(format!("t{i}"), format!("Term {i}")))
            .collect()
    }

    #[test]
    fn static_feed_pages_then_ends() {
        let feed = StaticAuthorityFeed::new(terms(5), 2);
        assert_eq!(feed.fetch_page(0).unwrap().len(), 2);
        assert_eq!(feed.fetch_page(4).unwrap()[0].raw_id, "t4");
        assert!(feed.fetch_page(6).unwrap().is_empty());
    }

    #[test]
    fn static_feed_replace_is_visible() {
        let feed = Arc::new(StaticAuthorityFeed::new(terms(1), 10));
        feed.push(RawTerm::new("extra", "Extra"));
        assert_eq!(feed.fetch_page(0).unwrap().len(), 2);
        feed.replace(Vec::new());
        assert!(AuthorityFeed::fetch_page(&feed, 0).unwrap().is_empty());
    }

    #[test]
    fn json_lines_feed_skips_blank_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"id":"bob","name":"Bob"}}"#).unwrap();
        writeln!(file).unwrap();
        writeln!(file, r#"{{"id":"fred","name":"Fred","aliases":["F"]}}"#).unwrap();
        let feed = JsonLinesAuthorityFeed::new(file.path(), 1);

        assert_eq!(feed.fetch_page(0).unwrap()[0].raw_id, "bob");
        let second = feed.fetch_page(1).unwrap();
        assert_eq!(second[0].raw_id, "fred");
        assert_eq!(second[0].aliases, vec!["F".to_owned()]);
        assert!(feed.fetch_page(2).unwrap().is_empty());
    }

    #[test]
    fn json_lines_feed_reports_bad_line() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "not json").unwrap();
        let err = JsonLinesAuthorityFeed::new(file.path(), 10)
            .fetch_page(0)
            .unwrap_err();
        assert!(matches!(err, BrandCacheError::FeedDecode { feed: "authority", .. }));
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn missing_files_are_fetch_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.json");
        let err = JsonLinesAuthorityFeed::new(&missing, 10)
            .fetch_page(30)
            .unwrap_err();
        assert!(matches!(
            err,
            BrandCacheError::FeedFetch {
                offset: Some(30),
                ..
            }
        ));
        let err = JsonOverrideFeed::new(&missing).fetch_all().unwrap_err();
        assert!(matches!(err, BrandCacheError::FeedFetch { offset: None, .. }));
    }

    #[test]
    fn json_override_feed_reads_array() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"active":true,"prefLabel":"FT Data","tmeIdentifier":"k1"}}]"#
        )
        .unwrap();
        let records = JsonOverrideFeed::new(file.path()).fetch_all().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].natural_key, "k1");
        assert!(NoOverrides.fetch_all().unwrap().is_empty());
    }
}
