//! Description markup → plain text.
//!
//! Parsing and rendering go through `html2text` with decorations off, so
//! markup is handled the way a browser would recover it: unclosed tags are
//! closed, `>` inside quoted attributes stays in the attribute, and
//! `script`/`style` bodies and comments never reach the text. The rendered
//! text is then normalised: whitespace runs collapse within a line, blank
//! line runs collapse to one, and the result is trimmed.

use brandcache_error::{BrandCacheError, Result};

/// Render width. Wide enough that descriptions are never re-wrapped.
const RENDER_WIDTH: usize = 100_000;

/// Convert `markup` to plain text.
///
/// # Errors
/// `Markup` when the renderer rejects the document.
pub fn to_plain_text(markup: &str) -> Result<String> {
    let rendered = html2text::config::plain_no_decorate()
        .string_from_read(markup.as_bytes(), RENDER_WIDTH)
        .map_err(|err| BrandCacheError::Markup {
            offset: 0,
            detail: err.to_string(),
        })?;
    Ok(normalize(&rendered))
}

/// Collapse whitespace within lines and blank-line runs, then trim.
fn normalize(raw: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    for line in raw.split('\n') {
        let collapsed = line.split_whitespace().collect::<Vec<_>>().join(" ");
        let prev_blank = lines.last().is_none_or(String::is_empty);
        if collapsed.is_empty() && prev_blank {
            continue;
        }
        lines.push(collapsed);
    }
    while lines.last().is_some_and(String::is_empty) {
        lines.pop();
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(markup: &str) -> String {
        to_plain_text(markup).unwrap()
    }

    #[test]
    fn plain_text_is_unchanged() {
        assert_eq!(text("DescriptionXML"), "DescriptionXML");
        assert_eq!(text(""), "");
    }

    #[test]
    fn paragraph_is_unwrapped() {
        assert_eq!(
            text("<p>The Financial Times (FT) is one of the world’s leading business news and information organisations.</p>"),
            "The Financial Times (FT) is one of the world’s leading business news and information organisations."
        );
    }

    #[test]
    fn inline_tags_are_stripped() {
        assert_eq!(text("<p>Read <b>the</b> <i>FT</i> daily</p>"), "Read the FT daily");
    }

    #[test]
    fn quoted_angle_bracket_stays_in_attribute() {
        assert_eq!(text(r#"<a title="a>b">FT</a>"#), "FT");
        assert_eq!(text(r#"<span data-x='1>0'>ok</span>"#), "ok");
    }

    #[test]
    fn paragraphs_stay_separate() {
        assert_eq!(text("<p>one</p><p>two</p>"), "one\n\ntwo");
        assert_eq!(text("a<br>b"), "a\nb");
    }

    #[test]
    fn unclosed_tags_are_recovered() {
        assert_eq!(text("<p>open paragraph"), "open paragraph");
        assert_eq!(text("<b>bold"), "bold");
    }

    #[test]
    fn entities_decode() {
        assert_eq!(text("Fish &amp; Chips"), "Fish & Chips");
        assert_eq!(text("&#8217; &#x41;"), "’ A");
    }

    #[test]
    fn comments_and_scripts_dropped() {
        assert_eq!(text("<p>a<!-- hidden -->b</p>"), "ab");
        assert_eq!(text("<p>x</p><script>var a = 1;</script><p>y</p>"), "x\n\ny");
    }

    #[test]
    fn normalize_collapses_whitespace_and_blank_runs() {
        assert_eq!(normalize("  lots \t of\n   space  \n"), "lots of\nspace");
        assert_eq!(normalize("\n\na\n\n\n\nb\n\n"), "a\n\nb");
    }
}
