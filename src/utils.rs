//! Text helpers shared by the extractor and the crawler's logging.
//!
//! - Whitespace normalization for extracted article bodies
//! - Length measurement compatible with the store's JavaScript consumers
//! - String truncation for log previews

use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Collapse every whitespace run into a single space and trim both ends.
///
/// Newlines, tabs and Unicode spaces all count as whitespace. The result
/// never starts or ends with whitespace and never contains two whitespace
/// characters in a row, so applying it twice changes nothing.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(normalize_text("  Hello \n\n World  "), "Hello World");
/// ```
pub fn normalize_text(text: &str) -> String {
    WHITESPACE_RUN.replace_all(text.trim(), " ").trim().to_string()
}

/// Length of `text` in UTF-16 code units.
///
/// The store and its readers are JavaScript, where `String.length` counts
/// UTF-16 units; `text_length` must agree with that.
pub fn text_length(text: &str) -> usize {
    text.encode_utf16().count()
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to at most `max` bytes (on a character boundary)
/// with an ellipsis and the number of dropped bytes appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}
