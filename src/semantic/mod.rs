//! Embedding-based duplicate collapse and cross-source matching.
//!
//! # Architecture
//!
//! - `provider`: the embedding capability (trait) and its fastembed impl
//! - `cache`: per-run embedding cache keyed by post identity
//! - `dedup`: within-source near-duplicate collapse
//! - `cross`: greedy one-to-one matching across sources

mod cache;
mod cross;
mod dedup;
pub mod provider;

pub use cache::EmbeddingCache;
pub use cross::{match_across, CrossMatchOutcome};
pub use dedup::dedup_posts;
pub use provider::{EmbeddingError, EmbeddingProvider, FastembedProvider};

use crate::posts::Source;

/// Default embedding model. Multilingual: the corpora mix Russian and
/// English text.
pub const DEFAULT_MODEL: &str = "paraphrase-multilingual-MiniLM-L12-v2";

/// Cosine similarity above which two same-source posts are duplicates.
pub const DEFAULT_DUPLICATE_THRESHOLD: f32 = 0.90;

/// Cosine similarity at or above which a cross-source pair is a match.
pub const DEFAULT_MATCH_THRESHOLD: f32 = 0.65;

/// Texts per embedding provider call.
pub const DEFAULT_EMBED_BATCH_SIZE: usize = 32;

/// Errors from the semantic matching path.
#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    /// The caller handed in a post the cache was never populated for.
    #[error("no embedding cached for {origin} post {id}")]
    MissingEmbedding { origin: Source, id: String },

    /// Provider failures are fatal to the semantic run: there is no
    /// text-only fallback once semantic matching has been selected.
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),
}

/// Cosine similarity between two vectors. A zero-norm vector on either
/// side yields 0.0 rather than NaN.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let norm_a = l2_norm(a);
    let norm_b = l2_norm(b);
    if norm_a < f32::EPSILON || norm_b < f32::EPSILON {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    dot / (norm_a * norm_b)
}

fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}
