//! Lexical (n-gram / IDF) duplicate detection.
//!
//! The lexical path scores post pairs by the IDF-weighted overlap of their
//! n-gram sets, with a dynamic accept threshold. It needs no embedding model
//! and works purely on normalized text.
//!
//! # Architecture
//!
//! - `normalize`: text canonicalization
//! - `ngrams`: token-window generation with stop-phrase filtering
//! - `idf`: per-batch inverse-document-frequency weights
//! - `matcher`: inverted-index scoring and one-to-one resolution

mod idf;
mod matcher;
mod ngrams;
mod normalize;

pub use idf::IdfTable;
pub use matcher::{match_corpora, pair_score, LexicalParams};
pub use ngrams::{ngram_set, ngrams};
pub use normalize::normalize_text;

use std::collections::HashSet;

use once_cell::sync::Lazy;

/// Default n-gram window size (tokens).
pub const DEFAULT_NGRAM_SIZE: usize = 3;

/// Minimum absolute weighted-overlap score for a lexical match.
pub const DEFAULT_ABSOLUTE_THRESHOLD: f64 = 60.0;

/// Relative threshold multiplier applied to the smaller n-gram set.
pub const DEFAULT_RELATIVE_THRESHOLD: f64 = 0.9;

/// Stop phrases dropped from n-gram sets. Matches the production scraper
/// configuration (corpora are predominantly Russian).
pub static DEFAULT_STOP_PHRASES: Lazy<HashSet<String>> = Lazy::new(|| {
    [
        "как я",
        "в этой",
        "для того чтобы",
        "что",
        "как",
        "на",
        "в",
        "и",
        "с",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
});

/// Errors from the lexical path.
#[derive(Debug, thiserror::Error)]
pub enum LexicalError {
    #[error("n-gram window size must be at least 1")]
    InvalidWindow,
}
