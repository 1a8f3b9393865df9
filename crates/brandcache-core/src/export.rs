//! Render listing streams in their wire formats.
//!
//! Both writers pull lazily from the stream and stop at its first error.

use std::io::Write;

use brandcache_error::{BrandCacheError, Result};
use serde::Serialize;

/// One JSON document per line. Returns the number of documents written.
pub fn write_json_lines<W, T, I>(out: &mut W, items: I) -> Result<usize>
where
    W: Write,
    T: Serialize,
    I: IntoIterator<Item = Result<T>>,
{
    let mut written = 0;
    for item in items {
        let item = item?;
        serde_json::to_writer(&mut *out, &item).map_err(encode_err)?;
        out.write_all(b"\n")?;
        written += 1;
    }
    out.flush()?;
    Ok(written)
}

/// A single JSON array. Returns the number of elements written.
///
/// On error the array is left unterminated.
pub fn write_json_array<W, T, I>(out: &mut W, items: I) -> Result<usize>
where
    W: Write,
    T: Serialize,
    I: IntoIterator<Item = Result<T>>,
{
    let mut written = 0;
    out.write_all(b"[")?;
    for item in items {
        let item = item?;
        if written > 0 {
            out.write_all(b",")?;
        }
        serde_json::to_writer(&mut *out, &item).map_err(encode_err)?;
        written += 1;
    }
    out.write_all(b"]")?;
    out.flush()?;
    Ok(written)
}

fn encode_err(err: serde_json::Error) -> BrandCacheError {
    if err.is_io() {
        return BrandCacheError::Io(err.into());
    }
    BrandCacheError::Encode {
        key: String::new(),
        detail: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use brandcache_types::{BrandId, BrandLink};

    use super::*;

    fn ids(values: &[&str]) -> Vec<Result<BrandId>> {
        values
            .iter()
            .map(|id| Ok(BrandId { id: (*id).to_owned() }))
            .collect()
    }

    #[test]
    fn json_lines_one_per_line() {
        let mut out = Vec::new();
        let n = write_json_lines(&mut out, ids(&["a", "b"])).unwrap();
        assert_eq!(n, 2);
        assert_eq!(String::from_utf8(out).unwrap(), "{\"ID\":\"a\"}\n{\"ID\":\"b\"}\n");
    }

    #[test]
    fn json_array_of_links() {
        let links = ["x", "y"]
            .iter()
            .map(|id| Ok(BrandLink::new("/base/url", id)));
        let mut out = Vec::new();
        write_json_array(&mut out, links).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, r#"[{"apiUrl":"/base/url/x"},{"apiUrl":"/base/url/y"}]"#);
        let parsed: Vec<BrandLink> = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.len(), 2);
    }

    #[test]
    fn empty_array() {
        let mut out = Vec::new();
        assert_eq!(write_json_array(&mut out, ids(&[])).unwrap(), 0);
        assert_eq!(out, b"[]");
    }

    #[test]
    fn stops_at_first_error() {
        let items = vec![
            Ok(BrandId { id: "a".to_owned() }),
            Err(BrandCacheError::corrupt("b", "bad")),
            Ok(BrandId { id: "c".to_owned() }),
        ];
        let mut out = Vec::new();
        let err = write_json_lines(&mut out, items).unwrap_err();
        assert!(matches!(err, BrandCacheError::Corrupt { .. }));
        assert_eq!(String::from_utf8(out).unwrap(), "{\"ID\":\"a\"}\n");
    }
}
