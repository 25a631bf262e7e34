//! Line classification heuristics.

use regex::Regex;
use std::sync::LazyLock;

/// Prefix of the document title line.
pub const DEFAULT_TITLE_PREFIX: &str = "Arista Networks";

/// Marker of markdown-style headings, always skipped.
pub const HEADING_MARKER: char = '#';

/// Longest line still accepted as a category header.
pub const MAX_HEADER_LEN: usize = 50;

/// Longest header accepted when the line contains whitespace.
pub const MAX_SPACED_HEADER_LEN: usize = 30;

/// An HTTP method word followed by a path anywhere in the line.
static METHOD_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(get|post|put|delete)\s+/").expect("Invalid method path regex"));

/// Tunable thresholds of the classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogRules {
    /// Lines starting with this prefix are skipped. Empty disables the check.
    pub title_prefix: String,
    pub max_header_len: usize,
    pub max_spaced_header_len: usize,
}

impl Default for CatalogRules {
    fn default() -> Self {
        Self {
            title_prefix: DEFAULT_TITLE_PREFIX.to_string(),
            max_header_len: MAX_HEADER_LEN,
            max_spaced_header_len: MAX_SPACED_HEADER_LEN,
        }
    }
}

/// Outcome of classifying one trimmed line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineClass<'a> {
    /// Blank, heading, or title line.
    Skip,
    /// Starts a new category.
    Header(&'a str),
    /// May hold an endpoint; lines that fail to match are dropped.
    Candidate(&'a str),
}

/// Classify one raw line of the document.
pub fn classify_line<'a>(line: &'a str, rules: &CatalogRules) -> LineClass<'a> {
    let line = line.trim();
    if line.is_empty()
        || line.starts_with(HEADING_MARKER)
        || (!rules.title_prefix.is_empty() && line.starts_with(rules.title_prefix.as_str()))
    {
        return LineClass::Skip;
    }

    if is_category_header(line, rules) {
        LineClass::Header(line)
    } else {
        LineClass::Candidate(line)
    }
}

/// Short lines without a method-and-path pair or a path are category headers.
///
/// A method word alone does not disqualify a line: `Delete Operations` is a
/// header.
///
/// Both length caps apply: `max_header_len` outright and
/// `max_spaced_header_len` once the line contains whitespace.
pub fn is_category_header(line: &str, rules: &CatalogRules) -> bool {
    if line.contains(" /") || METHOD_PATH.is_match(line) {
        return false;
    }
    if line.len() > rules.max_header_len {
        return false;
    }
    if line.contains(char::is_whitespace) && line.len() > rules.max_spaced_header_len {
        return false;
    }
    true
}
