//! Text canonicalization for n-gram comparison.

use once_cell::sync::Lazy;
use regex::Regex;

// \w is Unicode-aware in the regex crate, so Cyrillic text survives.
static PUNCTUATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Canonicalize raw post text: lowercase, strip punctuation, collapse
/// whitespace runs to single spaces, trim. Empty input yields an empty
/// string. Pure and deterministic.
pub fn normalize_text(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let lowered = raw.to_lowercase();
    let stripped = PUNCTUATION.replace_all(&lowered, "");
    let collapsed = WHITESPACE.replace_all(&stripped, " ");
    collapsed.trim().to_string()
}
