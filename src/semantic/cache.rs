//! Per-run embedding cache.
//!
//! Owned by the caller and scoped to one matching run; there is no global
//! singleton and no cross-run persistence. Populated once per corpus with
//! batched provider calls, then read-only for the scoring loops.

use std::collections::HashMap;

use crate::posts::{Post, Source};

use super::provider::{EmbeddingError, EmbeddingProvider};
use super::DEFAULT_EMBED_BATCH_SIZE;

/// Embeddings keyed by `(source, post id)`.
pub struct EmbeddingCache {
    entries: HashMap<(Source, String), Vec<f32>>,
    batch_size: usize,
}

impl EmbeddingCache {
    pub fn new(batch_size: usize) -> Self {
        Self {
            entries: HashMap::new(),
            batch_size: batch_size.max(1),
        }
    }

    pub fn with_default_batch_size() -> Self {
        Self::new(DEFAULT_EMBED_BATCH_SIZE)
    }

    /// Embed every post of `source` not yet cached, in provider batches.
    ///
    /// Batched calls are atomic with respect to ordering: the returned
    /// vectors align positionally with the submitted texts, which is what
    /// lets each vector be keyed back to its post.
    pub fn ensure(
        &mut self,
        provider: &dyn EmbeddingProvider,
        source: Source,
        posts: &[Post],
    ) -> Result<(), EmbeddingError> {
        let missing: Vec<&Post> = posts
            .iter()
            .filter(|p| !self.entries.contains_key(&(source, p.id.clone())))
            .collect();

        if missing.is_empty() {
            return Ok(());
        }

        log::info!(
            "embedding {} {} posts ({} already cached)",
            missing.len(),
            source,
            posts.len() - missing.len()
        );

        for chunk in missing.chunks(self.batch_size) {
            let texts: Vec<String> = chunk.iter().map(|p| p.body().to_string()).collect();
            let vectors = provider.encode(&texts)?;

            if vectors.len() != chunk.len() {
                return Err(EmbeddingError::Misaligned {
                    expected: chunk.len(),
                    got: vectors.len(),
                });
            }

            for (post, vector) in chunk.iter().zip(vectors) {
                self.entries.insert((source, post.id.clone()), vector);
            }
        }

        Ok(())
    }

    /// Insert a precomputed vector.
    pub fn insert(&mut self, source: Source, id: &str, vector: Vec<f32>) {
        self.entries.insert((source, id.to_string()), vector);
    }

    pub fn get(&self, source: Source, id: &str) -> Option<&[f32]> {
        self.entries
            .get(&(source, id.to_string()))
            .map(|v| v.as_slice())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Provider stub that records call sizes and derives vectors from
    /// text length, so alignment is observable.
    struct CountingProvider {
        calls: RefCell<Vec<usize>>,
    }

    impl CountingProvider {
        fn new() -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl EmbeddingProvider for CountingProvider {
        fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            self.calls.borrow_mut().push(texts.len());
            Ok(texts.iter().map(|t| vec![t.len() as f32, 1.0]).collect())
        }
    }

    fn post(id: &str, text: &str) -> Post {
        Post {
            id: id.to_string(),
            title: None,
            text: Some(text.to_string()),
            date: String::new(),
            views: None,
            url: None,
            media: false,
            is_forward: false,
        }
    }

    #[test]
    fn test_ensure_batches_and_aligns() {
        let provider = CountingProvider::new();
        let mut cache = EmbeddingCache::new(2);

        let posts = vec![post("1", "a"), post("2", "bb"), post("3", "ccc")];
        cache
            .ensure(&provider, Source::Telegram, &posts)
            .unwrap();

        // 3 posts, batch size 2: one call of 2, one of 1
        assert_eq!(*provider.calls.borrow(), vec![2, 1]);
        assert_eq!(cache.len(), 3);

        // vectors keyed to the right posts
        assert_eq!(cache.get(Source::Telegram, "2").unwrap()[0], 2.0);
        assert_eq!(cache.get(Source::Telegram, "3").unwrap()[0], 3.0);
    }

    #[test]
    fn test_ensure_skips_already_cached() {
        let provider = CountingProvider::new();
        let mut cache = EmbeddingCache::new(10);

        let posts = vec![post("1", "a"), post("2", "bb")];
        cache.ensure(&provider, Source::Habr, &posts).unwrap();
        cache.ensure(&provider, Source::Habr, &posts).unwrap();

        // second call finds everything cached
        assert_eq!(*provider.calls.borrow(), vec![2]);
    }

    #[test]
    fn test_same_id_different_source_distinct() {
        let provider = CountingProvider::new();
        let mut cache = EmbeddingCache::new(10);

        cache
            .ensure(&provider, Source::Habr, &[post("1", "habr body")])
            .unwrap();
        cache
            .ensure(&provider, Source::Telegram, &[post("1", "tg")])
            .unwrap();

        assert_eq!(cache.len(), 2);
        assert_ne!(
            cache.get(Source::Habr, "1").unwrap()[0],
            cache.get(Source::Telegram, "1").unwrap()[0]
        );
    }

    #[test]
    fn test_zero_batch_size_clamped() {
        let cache = EmbeddingCache::new(0);
        assert_eq!(cache.batch_size, 1);
    }
}
