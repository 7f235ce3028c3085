//! Match records and the final report handed to persistence.
//!
//! The aggregator is a pure function over the original corpora and the
//! accepted match records: together, matched pairs and per-source unmatched
//! lists partition every post exactly once.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::Serialize;

use crate::posts::{Corpus, Post, Source};

/// Which path produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMethod {
    Lexical,
    Semantic,
}

/// One accepted pairing between two posts.
///
/// Invariant (enforced by the matchers): within a pass, a target id appears
/// in at most one record, and a source post in at most one record per
/// counterpart source.
#[derive(Debug, Clone, Serialize)]
pub struct MatchRecord {
    pub source: Source,
    pub source_id: String,
    pub target_source: Source,
    pub target_id: String,
    pub score: f64,
    pub method: MatchMethod,
}

/// Export-ready matched pair with both sides' display fields.
#[derive(Debug, Clone, Serialize)]
pub struct MatchedPair {
    pub method: MatchMethod,
    pub score: f64,
    pub source: Source,
    pub source_id: String,
    pub source_title: Option<String>,
    pub source_text: Option<String>,
    pub source_date: String,
    pub target_source: Source,
    pub target_id: String,
    pub target_title: Option<String>,
    pub target_text: Option<String>,
    pub target_date: String,
}

/// Posts of one source that no accepted record references.
#[derive(Debug, Clone, Serialize)]
pub struct UnmatchedSet {
    pub source: Source,
    pub posts: Vec<Post>,
}

/// Terminal output of a matching run.
#[derive(Debug, Serialize)]
pub struct MatchReport {
    pub generated_at: String,
    pub matches: Vec<MatchedPair>,
    pub unmatched: Vec<UnmatchedSet>,
}

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to write csv: {0}")]
    Csv(#[from] csv::Error),
}

/// Build the report: resolve each record against the corpora and compute
/// per-source unmatched sets by id difference. Inputs are not mutated.
pub fn aggregate(corpora: &[&Corpus], records: &[MatchRecord]) -> MatchReport {
    let mut by_key: HashMap<(Source, &str), &Post> = HashMap::new();
    for corpus in corpora {
        for post in &corpus.posts {
            by_key.insert((corpus.source, post.id.as_str()), post);
        }
    }

    let mut matched_ids: HashSet<(Source, &str)> = HashSet::new();
    let mut matches = Vec::with_capacity(records.len());

    for record in records {
        let source_post = by_key.get(&(record.source, record.source_id.as_str()));
        let target_post = by_key.get(&(record.target_source, record.target_id.as_str()));

        let (Some(source_post), Some(target_post)) = (source_post, target_post) else {
            log::warn!(
                "match record references unknown post ({} {} / {} {}), dropping",
                record.source,
                record.source_id,
                record.target_source,
                record.target_id
            );
            continue;
        };

        matched_ids.insert((record.source, record.source_id.as_str()));
        matched_ids.insert((record.target_source, record.target_id.as_str()));

        matches.push(MatchedPair {
            method: record.method,
            score: record.score,
            source: record.source,
            source_id: source_post.id.clone(),
            source_title: source_post.title.clone(),
            source_text: source_post.text.clone(),
            source_date: source_post.date.clone(),
            target_source: record.target_source,
            target_id: target_post.id.clone(),
            target_title: target_post.title.clone(),
            target_text: target_post.text.clone(),
            target_date: target_post.date.clone(),
        });
    }

    let unmatched = corpora
        .iter()
        .map(|corpus| UnmatchedSet {
            source: corpus.source,
            posts: corpus
                .posts
                .iter()
                .filter(|p| !matched_ids.contains(&(corpus.source, p.id.as_str())))
                .cloned()
                .collect(),
        })
        .collect();

    MatchReport {
        generated_at: chrono::Local::now().format("%Y-%m-%d %H:%M").to_string(),
        matches,
        unmatched,
    }
}

impl MatchReport {
    pub fn write_json(&self, path: &Path) -> Result<(), ReportError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        log::info!("report written to {}", path.display());
        Ok(())
    }

    /// Tabular export: `matched.csv` plus one `unmatched_<source>.csv` per
    /// source, under `dir`.
    pub fn write_csv(&self, dir: &Path) -> Result<(), ReportError> {
        std::fs::create_dir_all(dir)?;

        let mut writer = csv::Writer::from_path(dir.join("matched.csv"))?;
        for pair in &self.matches {
            writer.serialize(pair)?;
        }
        writer.flush()?;

        for set in &self.unmatched {
            let path = dir.join(format!("unmatched_{}.csv", set.source));
            let mut writer = csv::Writer::from_path(path)?;
            for post in &set.posts {
                writer.serialize(post)?;
            }
            writer.flush()?;
        }

        log::info!("csv export written to {}", dir.display());
        Ok(())
    }
}
