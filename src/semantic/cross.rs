//! Greedy one-to-one matching across sources.

use crate::posts::{Corpus, Source};
use crate::report::{MatchMethod, MatchRecord};

use super::{cosine_similarity, EmbeddingCache, MatchError};

/// Result of one cross-source pass.
#[derive(Debug, Default)]
pub struct CrossMatchOutcome {
    pub matches: Vec<MatchRecord>,
    /// Principal posts with no qualifying counterpart in any set.
    pub unmatched_principal: Vec<String>,
    /// Never-claimed counterpart posts, per counterpart set.
    pub unmatched_counterparts: Vec<(Source, Vec<String>)>,
}

/// Match the principal corpus against one or two counterpart corpora.
///
/// Counterpart sets are processed independently: a principal post may come
/// out of the pass with zero, one, or two matches, at most one per set.
/// Within a set, candidate pairs at or above the threshold are resolved by
/// descending score, and a claimed post (either side) is excluded from
/// consideration for the rest of the pass. When two principals compete for
/// the same sole counterpart, the higher scorer wins and the other goes
/// unmatched.
///
/// Every post of every corpus must already be embedded in `cache`; scoring
/// is read-only over the embeddings.
pub fn match_across(
    principal: &Corpus,
    counterparts: &[&Corpus],
    threshold: f32,
    cache: &EmbeddingCache,
) -> Result<CrossMatchOutcome, MatchError> {
    let principal_embs = lookup_corpus(principal, cache)?;

    let mut outcome = CrossMatchOutcome::default();
    let mut principal_matched = vec![false; principal.posts.len()];

    for corpus in counterparts {
        let counterpart_embs = lookup_corpus(corpus, cache)?;

        // all qualifying pairs for this set
        let mut candidates: Vec<(usize, usize, f32)> = Vec::new();
        for (pi, p_emb) in principal_embs.iter().enumerate() {
            for (ci, c_emb) in counterpart_embs.iter().enumerate() {
                let score = cosine_similarity(p_emb, c_emb);
                if score >= threshold {
                    candidates.push((pi, ci, score));
                }
            }
        }

        candidates.sort_by(|x, y| {
            y.2.partial_cmp(&x.2)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(x.0.cmp(&y.0))
                .then(x.1.cmp(&y.1))
        });

        let mut claimed_principal = vec![false; principal.posts.len()];
        let mut claimed_counterpart = vec![false; corpus.posts.len()];

        for (pi, ci, score) in candidates {
            if claimed_principal[pi] || claimed_counterpart[ci] {
                continue;
            }
            claimed_principal[pi] = true;
            claimed_counterpart[ci] = true;
            principal_matched[pi] = true;

            outcome.matches.push(MatchRecord {
                source: principal.source,
                source_id: principal.posts[pi].id.clone(),
                target_source: corpus.source,
                target_id: corpus.posts[ci].id.clone(),
                score: score as f64,
                method: MatchMethod::Semantic,
            });
        }

        let unclaimed = corpus
            .posts
            .iter()
            .enumerate()
            .filter(|(ci, _)| !claimed_counterpart[*ci])
            .map(|(_, p)| p.id.clone())
            .collect();
        outcome.unmatched_counterparts.push((corpus.source, unclaimed));
    }

    outcome.unmatched_principal = principal
        .posts
        .iter()
        .enumerate()
        .filter(|(pi, _)| !principal_matched[*pi])
        .map(|(_, p)| p.id.clone())
        .collect();

    log::info!(
        "cross-source match: {} pairs, {} unmatched {} posts",
        outcome.matches.len(),
        outcome.unmatched_principal.len(),
        principal.source
    );

    Ok(outcome)
}

fn lookup_corpus<'a>(
    corpus: &Corpus,
    cache: &'a EmbeddingCache,
) -> Result<Vec<&'a [f32]>, MatchError> {
    corpus
        .posts
        .iter()
        .map(|p| {
            cache
                .get(corpus.source, &p.id)
                .ok_or_else(|| MatchError::MissingEmbedding {
                    origin: corpus.source,
                    id: p.id.clone(),
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::posts::Post;

    fn post(id: &str) -> Post {
        Post {
            id: id.to_string(),
            title: None,
            text: Some(format!("text {id}")),
            date: String::new(),
            views: None,
            url: None,
            media: false,
            is_forward: false,
        }
    }

    fn corpus(source: Source, ids: &[&str]) -> Corpus {
        Corpus::new(source, ids.iter().map(|id| post(id)).collect())
    }

    fn at_angle(degrees: f32) -> Vec<f32> {
        let rad = degrees.to_radians();
        vec![rad.cos(), rad.sin()]
    }

    #[test]
    fn test_competing_principals_higher_score_wins() {
        // A at 30 deg, B at 10 deg, sole counterpart at 0 deg:
        // sim(B, c) = cos(10) > sim(A, c) = cos(30); both above 0.65
        let habr = corpus(Source::Habr, &["A", "B"]);
        let tg = corpus(Source::Telegram, &["c"]);

        let mut cache = EmbeddingCache::with_default_batch_size();
        cache.insert(Source::Habr, "A", at_angle(30.0));
        cache.insert(Source::Habr, "B", at_angle(10.0));
        cache.insert(Source::Telegram, "c", at_angle(0.0));

        let outcome = match_across(&habr, &[&tg], 0.65, &cache).unwrap();

        assert_eq!(outcome.matches.len(), 1);
        assert_eq!(outcome.matches[0].source_id, "B");
        assert_eq!(outcome.matches[0].target_id, "c");
        assert_eq!(outcome.unmatched_principal, vec!["A".to_string()]);
        assert!(outcome.unmatched_counterparts[0].1.is_empty());
    }

    #[test]
    fn test_one_match_per_counterpart_set() {
        // principal P matches in both sets in the same pass
        let habr = corpus(Source::Habr, &["P"]);
        let tg = corpus(Source::Telegram, &["t1", "t2"]);
        let pk = corpus(Source::Pikabu, &["p1"]);

        let mut cache = EmbeddingCache::with_default_batch_size();
        cache.insert(Source::Habr, "P", at_angle(0.0));
        cache.insert(Source::Telegram, "t1", at_angle(5.0));
        cache.insert(Source::Telegram, "t2", at_angle(80.0));
        cache.insert(Source::Pikabu, "p1", at_angle(-5.0));

        let outcome = match_across(&habr, &[&tg, &pk], 0.65, &cache).unwrap();

        assert_eq!(outcome.matches.len(), 2);
        let targets: Vec<&str> = outcome.matches.iter().map(|m| m.target_id.as_str()).collect();
        assert!(targets.contains(&"t1"));
        assert!(targets.contains(&"p1"));

        assert!(outcome.unmatched_principal.is_empty());
        assert_eq!(outcome.unmatched_counterparts[0].1, vec!["t2".to_string()]);
        assert!(outcome.unmatched_counterparts[1].1.is_empty());
    }

    #[test]
    fn test_threshold_boundary_inclusive() {
        let habr = corpus(Source::Habr, &["A"]);
        let tg = corpus(Source::Telegram, &["c"]);

        let mut cache = EmbeddingCache::with_default_batch_size();
        cache.insert(Source::Habr, "A", vec![1.0, 0.0]);
        cache.insert(Source::Telegram, "c", vec![1.0, 0.0]);

        // identical vectors score exactly 1.0: >= accepts
        let outcome = match_across(&habr, &[&tg], 1.0, &cache).unwrap();
        assert_eq!(outcome.matches.len(), 1);
    }

    #[test]
    fn test_no_qualifying_counterpart() {
        let habr = corpus(Source::Habr, &["A"]);
        let tg = corpus(Source::Telegram, &["c"]);

        let mut cache = EmbeddingCache::with_default_batch_size();
        cache.insert(Source::Habr, "A", vec![1.0, 0.0]);
        cache.insert(Source::Telegram, "c", vec![0.0, 1.0]);

        let outcome = match_across(&habr, &[&tg], 0.65, &cache).unwrap();

        assert!(outcome.matches.is_empty());
        assert_eq!(outcome.unmatched_principal, vec!["A".to_string()]);
        assert_eq!(outcome.unmatched_counterparts[0].1, vec!["c".to_string()]);
    }

    #[test]
    fn test_one_to_one_invariant_larger_sets() {
        let habr = corpus(Source::Habr, &["A", "B", "C"]);
        let tg = corpus(Source::Telegram, &["x", "y"]);

        let mut cache = EmbeddingCache::with_default_batch_size();
        // everything close to everything
        cache.insert(Source::Habr, "A", at_angle(0.0));
        cache.insert(Source::Habr, "B", at_angle(4.0));
        cache.insert(Source::Habr, "C", at_angle(8.0));
        cache.insert(Source::Telegram, "x", at_angle(2.0));
        cache.insert(Source::Telegram, "y", at_angle(6.0));

        let outcome = match_across(&habr, &[&tg], 0.65, &cache).unwrap();

        assert_eq!(outcome.matches.len(), 2);

        let mut targets: Vec<&str> = outcome.matches.iter().map(|m| m.target_id.as_str()).collect();
        targets.sort();
        targets.dedup();
        assert_eq!(targets.len(), 2);

        let mut sources: Vec<&str> = outcome.matches.iter().map(|m| m.source_id.as_str()).collect();
        sources.sort();
        sources.dedup();
        assert_eq!(sources.len(), 2);

        assert_eq!(outcome.unmatched_principal.len(), 1);
    }

    #[test]
    fn test_missing_embedding_fatal() {
        let habr = corpus(Source::Habr, &["A"]);
        let tg = corpus(Source::Telegram, &["c"]);

        let mut cache = EmbeddingCache::with_default_batch_size();
        cache.insert(Source::Habr, "A", vec![1.0, 0.0]);

        let err = match_across(&habr, &[&tg], 0.65, &cache).unwrap_err();
        assert!(matches!(err, MatchError::MissingEmbedding { .. }));
    }
}
