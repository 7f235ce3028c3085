//! Within-source near-duplicate collapse.

use crate::posts::{Post, Source};

use super::{cosine_similarity, EmbeddingCache, MatchError};

/// Collapse near-duplicate posts from one source into cluster
/// representatives.
///
/// Each collapse pass scans forward from every unclaimed post `i`: a later
/// unclaimed post `j` whose cosine similarity to `i` exceeds the threshold
/// joins `i`'s cluster, and the cluster keeps whichever member has the
/// higher engagement metric (ties favor the earlier index). Passes repeat
/// until no cluster shrinks, so two representatives that are themselves
/// within the threshold get merged too; running the function on its own
/// output is a no-op. Output order follows first occurrence.
///
/// Quadratic in corpus size per pass; per-scrape corpora are small and each
/// pass is a single scan over cached embeddings.
///
/// Every post must already be embedded in `cache`.
pub fn dedup_posts(
    posts: &[Post],
    source: Source,
    threshold: f32,
    cache: &EmbeddingCache,
) -> Result<Vec<Post>, MatchError> {
    let mut survivors = posts.to_vec();
    loop {
        let collapsed = collapse_pass(&survivors, source, threshold, cache)?;
        let stable = collapsed.len() == survivors.len();
        survivors = collapsed;
        if stable {
            break;
        }
    }

    log::info!(
        "dedup {}: {} posts -> {} representatives",
        source,
        posts.len(),
        survivors.len()
    );

    Ok(survivors)
}

fn collapse_pass(
    posts: &[Post],
    source: Source,
    threshold: f32,
    cache: &EmbeddingCache,
) -> Result<Vec<Post>, MatchError> {
    let embeddings = lookup_all(posts, source, cache)?;

    let mut claimed = vec![false; posts.len()];
    let mut survivors = Vec::new();

    for i in 0..posts.len() {
        if claimed[i] {
            continue;
        }
        claimed[i] = true;

        let mut keep = i;
        for j in (i + 1)..posts.len() {
            if claimed[j] {
                continue;
            }

            let sim = cosine_similarity(embeddings[i], embeddings[j]);
            if sim > threshold {
                claimed[j] = true;
                if posts[j].engagement() > posts[keep].engagement() {
                    keep = j;
                }
            }
        }

        if keep != i {
            log::debug!(
                "post {} replaces duplicate cluster anchor {} ({} views)",
                posts[keep].id,
                posts[i].id,
                posts[keep].engagement()
            );
        }
        survivors.push(posts[keep].clone());
    }

    Ok(survivors)
}

fn lookup_all<'a>(
    posts: &[Post],
    source: Source,
    cache: &'a EmbeddingCache,
) -> Result<Vec<&'a [f32]>, MatchError> {
    posts
        .iter()
        .map(|p| {
            cache
                .get(source, &p.id)
                .ok_or_else(|| MatchError::MissingEmbedding {
                    origin: source,
                    id: p.id.clone(),
                })
        })
        .collect()
}
