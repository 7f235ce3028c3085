//! Inverted-index lexical matching with a dynamic threshold.
//!
//! Matching runs in two explicit phases to keep the one-to-one invariant
//! reproducible and testable on its own:
//!
//! 1. Candidate collection: per post in corpus B, the best-scoring
//!    counterpart in corpus A among those clearing their pair's dynamic
//!    threshold.
//! 2. Global resolution: candidates sorted by descending score, greedily
//!    accepted, skipping any pair with an already-claimed endpoint.

use std::collections::{HashMap, HashSet};

use crate::posts::{Corpus, Post};
use crate::report::{MatchMethod, MatchRecord};

use super::{ngram_set, normalize_text, IdfTable, LexicalError};
use super::{DEFAULT_ABSOLUTE_THRESHOLD, DEFAULT_NGRAM_SIZE, DEFAULT_RELATIVE_THRESHOLD};

/// Tunables for a lexical matching pass.
#[derive(Debug, Clone)]
pub struct LexicalParams {
    /// N-gram window size (tokens).
    pub window: usize,
    /// Absolute score floor.
    pub absolute_threshold: f64,
    /// Multiplier applied to the smaller n-gram set size.
    pub relative_threshold: f64,
    /// Windows dropped before scoring.
    pub stop_phrases: HashSet<String>,
}

impl Default for LexicalParams {
    fn default() -> Self {
        Self {
            window: DEFAULT_NGRAM_SIZE,
            absolute_threshold: DEFAULT_ABSOLUTE_THRESHOLD,
            relative_threshold: DEFAULT_RELATIVE_THRESHOLD,
            stop_phrases: super::DEFAULT_STOP_PHRASES.clone(),
        }
    }
}

/// IDF-weighted overlap between two n-gram sets. Symmetric in its
/// arguments; an empty set on either side scores zero.
pub fn pair_score(a: &HashSet<String>, b: &HashSet<String>, idf: &IdfTable) -> f64 {
    a.intersection(b).map(|gram| idf.weight(gram)).sum()
}

/// One surviving candidate pair before global resolution.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    a_idx: usize,
    b_idx: usize,
    score: f64,
}

/// Match corpus `a` against corpus `b` with IDF-weighted n-gram overlap.
///
/// A pair is accepted when
/// `score >= max(absolute_threshold, relative_threshold * min(|set_a|, |set_b|))`
/// (`>=`, so a score exactly at the threshold passes). The result satisfies
/// the one-to-one invariant: no post id on either side appears twice.
pub fn match_corpora(
    a: &Corpus,
    b: &Corpus,
    idf: &IdfTable,
    params: &LexicalParams,
) -> Result<Vec<MatchRecord>, LexicalError> {
    if params.window == 0 {
        return Err(LexicalError::InvalidWindow);
    }

    let sets_a = prepare_sets(&a.posts, params);
    let sets_b = prepare_sets(&b.posts, params);

    let candidates = collect_candidates(&sets_a, &sets_b, idf, params);
    let accepted = resolve_one_to_one(candidates, sets_a.len(), sets_b.len());

    log::info!(
        "lexical match {} vs {}: {} accepted pairs",
        a.source,
        b.source,
        accepted.len()
    );

    Ok(accepted
        .into_iter()
        .map(|c| MatchRecord {
            source: a.source,
            source_id: a.posts[c.a_idx].id.clone(),
            target_source: b.source,
            target_id: b.posts[c.b_idx].id.clone(),
            score: c.score,
            method: MatchMethod::Lexical,
        })
        .collect())
}

/// N-gram sets per post. A post whose preparation fails is logged and
/// excluded from the pass instead of aborting the batch.
fn prepare_sets(posts: &[Post], params: &LexicalParams) -> Vec<Option<HashSet<String>>> {
    posts
        .iter()
        .map(|post| {
            let text = normalize_text(post.body());
            match ngram_set(&text, params.window, &params.stop_phrases) {
                Ok(set) => Some(set),
                Err(err) => {
                    log::warn!("excluding post {} from lexical pass: {}", post.id, err);
                    None
                }
            }
        })
        .collect()
}

/// Phase one: per B-post, score each distinct A counterpart sharing at
/// least one gram, once, and keep the best among those clearing their
/// pair's dynamic threshold.
fn collect_candidates(
    sets_a: &[Option<HashSet<String>>],
    sets_b: &[Option<HashSet<String>>],
    idf: &IdfTable,
    params: &LexicalParams,
) -> Vec<Candidate> {
    // gram -> indices of A posts containing it
    let mut index: HashMap<&str, Vec<usize>> = HashMap::new();
    for (a_idx, set) in sets_a.iter().enumerate() {
        let Some(set) = set else { continue };
        for gram in set {
            index.entry(gram.as_str()).or_default().push(a_idx);
        }
    }

    let mut candidates = Vec::new();

    for (b_idx, set_b) in sets_b.iter().enumerate() {
        let Some(set_b) = set_b else { continue };
        if set_b.is_empty() {
            continue;
        }

        // Best (not cumulative) score per distinct counterpart: the full
        // intersection is scored the first time the counterpart is seen.
        let mut scored: HashMap<usize, f64> = HashMap::new();
        for gram in set_b {
            let Some(a_posts) = index.get(gram.as_str()) else {
                continue;
            };
            for &a_idx in a_posts {
                scored.entry(a_idx).or_insert_with(|| {
                    sets_a[a_idx]
                        .as_ref()
                        .map(|set_a| pair_score(set_a, set_b, idf))
                        .unwrap_or(0.0)
                });
            }
        }

        // Each pair carries its own dynamic threshold; filter first, then
        // pick the best passing pair. The order matters: a high-scoring
        // pair that misses its (larger) threshold must not shadow a
        // lower-scoring pair that clears its own.
        let mut best: Option<(usize, f64)> = None;
        for (a_idx, score) in scored {
            let Some(set_a) = sets_a[a_idx].as_ref() else {
                continue;
            };
            let min_len = set_a.len().min(set_b.len());
            let threshold = params
                .absolute_threshold
                .max(params.relative_threshold * min_len as f64);
            if score < threshold {
                continue;
            }

            let better = match best {
                None => true,
                // ties go to the smaller index
                Some((best_idx, best_score)) => {
                    score > best_score || (score == best_score && a_idx < best_idx)
                }
            };
            if better {
                best = Some((a_idx, score));
            }
        }

        if let Some((a_idx, score)) = best {
            candidates.push(Candidate {
                a_idx,
                b_idx,
                score,
            });
        }
    }

    candidates
}

/// Phase two: greedy resolution by descending score so that no post on
/// either side is claimed twice.
fn resolve_one_to_one(
    mut candidates: Vec<Candidate>,
    a_len: usize,
    b_len: usize,
) -> Vec<Candidate> {
    candidates.sort_by(|x, y| {
        y.score
            .partial_cmp(&x.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(x.a_idx.cmp(&y.a_idx))
            .then(x.b_idx.cmp(&y.b_idx))
    });

    let mut claimed_a = vec![false; a_len];
    let mut claimed_b = vec![false; b_len];
    let mut accepted = Vec::new();

    for cand in candidates {
        if claimed_a[cand.a_idx] || claimed_b[cand.b_idx] {
            continue;
        }
        claimed_a[cand.a_idx] = true;
        claimed_b[cand.b_idx] = true;
        accepted.push(cand);
    }

    accepted
}
