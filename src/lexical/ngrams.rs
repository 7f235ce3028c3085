//! Sliding token-window generation.

use std::collections::HashSet;

use super::LexicalError;

/// Generate the ordered sequence of contiguous `n`-token windows over
/// normalized text, each joined by single spaces. Windows exactly equal to
/// a stop phrase are dropped.
///
/// A text with fewer than `n` tokens yields an empty sequence; `n == 0`
/// is an error.
pub fn ngrams(
    text: &str,
    n: usize,
    stop_phrases: &HashSet<String>,
) -> Result<Vec<String>, LexicalError> {
    if n == 0 {
        return Err(LexicalError::InvalidWindow);
    }

    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.len() < n {
        return Ok(Vec::new());
    }

    let grams = tokens
        .windows(n)
        .map(|window| window.join(" "))
        .filter(|gram| !stop_phrases.contains(gram))
        .collect();

    Ok(grams)
}

/// Same windows as [`ngrams`], deduplicated into a set for overlap scoring.
pub fn ngram_set(
    text: &str,
    n: usize,
    stop_phrases: &HashSet<String>,
) -> Result<HashSet<String>, LexicalError> {
    Ok(ngrams(text, n, stop_phrases)?.into_iter().collect())
}
