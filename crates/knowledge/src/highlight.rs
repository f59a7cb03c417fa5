//! Query-term highlighting for display snippets.
//!
//! Queries are matched as literal text: the query is escaped before it is
//! compiled, so characters such as `+`, `*` or `(` match themselves and no
//! user input can produce an invalid pattern.

use folio_core::{HighlightError, HighlightPolicy};
use regex::{Captures, RegexBuilder};

/// Compiled pattern size limit; escaped queries are far below it.
const PATTERN_SIZE_LIMIT: usize = 64 << 20;

const ELLIPSIS: &str = "...";

/// Wraps query occurrences in display markers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Highlighter {
    open: String,
    close: String,
}

impl Default for Highlighter {
    fn default() -> Self {
        Self::new("<mark>", "</mark>")
    }
}

impl Highlighter {
    pub fn new(open: impl Into<String>, close: impl Into<String>) -> Self {
        Self {
            open: open.into(),
            close: close.into(),
        }
    }

    /// Wrap every case-insensitive occurrence of `query` in `text`.
    ///
    /// Matches are found left to right without overlap, so `"aa"` in
    /// `"aaaa"` marks two occurrences. An empty query, or one longer than
    /// `text`, returns `text` unchanged.
    pub fn highlight(&self, text: &str, query: &str) -> Result<String, HighlightError> {
        if query.is_empty() || query.chars().count() > text.chars().count() {
            return Ok(text.to_string());
        }

        let pattern = RegexBuilder::new(&regex::escape(query))
            .case_insensitive(true)
            .size_limit(PATTERN_SIZE_LIMIT)
            .build()
            .map_err(|e| HighlightError::InvalidPattern {
                query: query.to_string(),
                reason: e.to_string(),
            })?;

        let highlighted = pattern.replace_all(text, |caps: &Captures| {
            format!("{}{}{}", self.open, &caps[0], self.close)
        });

        Ok(highlighted.into_owned())
    }

    /// Build a single-line display snippet of at most `max_chars` characters
    /// of source text, with `query` highlighted.
    ///
    /// With [`HighlightPolicy::TruncateThenHighlight`] markers are always
    /// balanced. With [`HighlightPolicy::HighlightThenTruncate`] the limit
    /// counts marker characters too and the cut may land inside a marker.
    pub fn snippet(
        &self,
        text: &str,
        query: &str,
        max_chars: usize,
        policy: HighlightPolicy,
    ) -> Result<String, HighlightError> {
        let flat = flatten(text);

        match policy {
            HighlightPolicy::TruncateThenHighlight => {
                let (body, truncated) = truncate_chars(&flat, max_chars);
                let mut snippet = self.highlight(body, query)?;
                if truncated {
                    snippet.push_str(ELLIPSIS);
                }
                Ok(snippet)
            }
            HighlightPolicy::HighlightThenTruncate => {
                let highlighted = self.highlight(&flat, query)?;
                let (body, truncated) = truncate_chars(&highlighted, max_chars);
                let mut snippet = body.to_string();
                if truncated {
                    snippet.push_str(ELLIPSIS);
                }
                Ok(snippet)
            }
        }
    }
}

/// Trim surrounding whitespace and replace line breaks with spaces.
fn flatten(text: &str) -> String {
    text.trim().replace("\r\n", " ").replace(['\n', '\r'], " ")
}

/// First `max_chars` characters of `text`, and whether anything was cut.
fn truncate_chars(text: &str, max_chars: usize) -> (&str, bool) {
    match text.char_indices().nth(max_chars) {
        Some((byte, _)) => (&text[..byte], true),
        None => (text, false),
    }
}
