//! Per-batch inverse-document-frequency weights.

use std::collections::{HashMap, HashSet};

use crate::posts::Post;

use super::{ngram_set, normalize_text, LexicalError};

/// N-gram → IDF weight, computed once over the union of all posts in a
/// comparison batch. Rare grams weigh more and are the stronger duplicate
/// signal. Not incrementally updatable: recompute when the batch changes.
#[derive(Debug, Clone)]
pub struct IdfTable {
    weights: HashMap<String, f64>,
    doc_count: usize,
}

impl IdfTable {
    /// Compute `ln(N / (df + 1))` for every n-gram in the batch, where `N`
    /// is the document count and `df` the number of documents whose n-gram
    /// set contains the gram.
    pub fn compute<'a, I>(
        posts: I,
        n: usize,
        stop_phrases: &HashSet<String>,
    ) -> Result<Self, LexicalError>
    where
        I: IntoIterator<Item = &'a Post>,
    {
        let mut doc_freq: HashMap<String, usize> = HashMap::new();
        let mut doc_count = 0usize;

        for post in posts {
            doc_count += 1;
            let text = normalize_text(post.body());
            for gram in ngram_set(&text, n, stop_phrases)? {
                *doc_freq.entry(gram).or_insert(0) += 1;
            }
        }

        let weights = doc_freq
            .into_iter()
            .map(|(gram, df)| (gram, (doc_count as f64 / (df as f64 + 1.0)).ln()))
            .collect();

        Ok(Self { weights, doc_count })
    }

    /// Weight for a gram; unknown grams weigh zero.
    pub fn weight(&self, gram: &str) -> f64 {
        self.weights.get(gram).copied().unwrap_or(0.0)
    }

    /// Number of documents the table was computed over.
    pub fn doc_count(&self) -> usize {
        self.doc_count
    }

    /// Number of distinct grams in the table.
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}
