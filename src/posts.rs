//! Post records and corpus loading.
//!
//! Posts arrive as JSON dumps produced by the scraping side (one file per
//! platform). Field names differ per platform: Habr and Pikabu call the body
//! `content`, Telegram calls it `text`; Pikabu reports engagement as `rating`,
//! Telegram as `views`. Serde aliases fold all of them into one record shape.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

/// Platform a post was scraped from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Habr,
    Telegram,
    Pikabu,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Habr => write!(f, "habr"),
            Source::Telegram => write!(f, "telegram"),
            Source::Pikabu => write!(f, "pikabu"),
        }
    }
}

impl FromStr for Source {
    type Err = CorpusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "habr" => Ok(Source::Habr),
            "telegram" => Ok(Source::Telegram),
            "pikabu" => Ok(Source::Pikabu),
            other => Err(CorpusError::UnknownSource(other.to_string())),
        }
    }
}

/// A single scraped post, platform differences flattened away.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    /// Unique within its source. Telegram ids are numeric in the dumps.
    #[serde(deserialize_with = "de_id")]
    pub id: String,

    #[serde(default)]
    pub title: Option<String>,

    /// Post body. Habr/Pikabu dumps name this `content`.
    #[serde(default, alias = "content")]
    pub text: Option<String>,

    #[serde(default)]
    pub date: String,

    /// Engagement metric: Telegram views or Pikabu rating.
    #[serde(default, alias = "rating", deserialize_with = "de_views")]
    pub views: Option<i64>,

    #[serde(default, alias = "post_url")]
    pub url: Option<String>,

    #[serde(default)]
    pub media: bool,

    #[serde(default)]
    pub is_forward: bool,
}

impl Post {
    /// Text used for matching, by priority: body, then title.
    ///
    /// A post with neither is treated as empty text rather than an error;
    /// partial scraped records are expected and score zero downstream.
    pub fn body(&self) -> &str {
        self.text
            .as_deref()
            .filter(|t| !t.is_empty())
            .or(self.title.as_deref())
            .unwrap_or("")
    }

    /// Engagement metric, absent treated as zero.
    pub fn engagement(&self) -> i64 {
        self.views.unwrap_or(0)
    }
}

/// A batch of posts from one platform.
#[derive(Debug, Clone)]
pub struct Corpus {
    pub source: Source,
    pub posts: Vec<Post>,
}

/// Scraper dump envelope: `{ "metadata": {...}, "posts": [...] }`.
/// Older dumps are a bare array.
#[derive(Debug, Deserialize)]
struct DumpEnvelope {
    posts: Vec<Post>,
}

#[derive(Debug, thiserror::Error)]
pub enum CorpusError {
    #[error("unknown source label: '{0}' (expected habr, telegram or pikabu)")]
    UnknownSource(String),

    #[error("failed to read corpus file: {0}")]
    Io(#[from] std::io::Error),

    #[error("corpus file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl Corpus {
    pub fn new(source: Source, posts: Vec<Post>) -> Self {
        Self { source, posts }
    }

    /// Load a scraper dump from disk.
    pub fn load(source: Source, path: &Path) -> Result<Self, CorpusError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(source, &raw)
    }

    /// Parse a scraper dump, accepting either the metadata envelope
    /// or a bare post array.
    pub fn from_json(source: Source, raw: &str) -> Result<Self, CorpusError> {
        let posts = match serde_json::from_str::<DumpEnvelope>(raw) {
            Ok(envelope) => envelope.posts,
            Err(_) => serde_json::from_str::<Vec<Post>>(raw)?,
        };

        log::info!("loaded {} posts from {}", posts.len(), source);
        Ok(Self { source, posts })
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }
}

/// Telegram dumps carry numeric ids, Habr/Pikabu string ids.
fn de_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Num(i64),
        Text(String),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Num(n) => n.to_string(),
        RawId::Text(s) => s,
    })
}

/// Pikabu ratings are scraped as display strings ("1 234"); Telegram views
/// are plain numbers. Unparseable values degrade to absent.
fn de_views<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawViews {
        Num(i64),
        Text(String),
        None,
    }

    Ok(match Option::<RawViews>::deserialize(deserializer)? {
        Some(RawViews::Num(n)) => Some(n),
        Some(RawViews::Text(s)) => {
            let cleaned: String = s.chars().filter(|c| c.is_ascii_digit() || *c == '-').collect();
            cleaned.parse::<i64>().ok()
        }
        Some(RawViews::None) | None => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_from_str() {
        assert_eq!("habr".parse::<Source>().unwrap(), Source::Habr);
        assert_eq!("Telegram".parse::<Source>().unwrap(), Source::Telegram);
        assert_eq!("PIKABU".parse::<Source>().unwrap(), Source::Pikabu);
    }

    #[test]
    fn test_source_unknown_label_fails_fast() {
        let err = "reddit".parse::<Source>().unwrap_err();
        assert!(matches!(err, CorpusError::UnknownSource(_)));
    }

    #[test]
    fn test_parse_telegram_dump() {
        let raw = r#"{
            "metadata": {"generated_at": "2024-03-01 10:00", "posts_count": 1},
            "posts": [
                {"id": 42, "date": "2024-02-29", "text": "hello channel", "views": 150, "media": false, "is_forward": true}
            ]
        }"#;

        let corpus = Corpus::from_json(Source::Telegram, raw).unwrap();
        assert_eq!(corpus.len(), 1);

        let post = &corpus.posts[0];
        assert_eq!(post.id, "42");
        assert_eq!(post.body(), "hello channel");
        assert_eq!(post.engagement(), 150);
        assert!(post.is_forward);
    }

    #[test]
    fn test_parse_habr_dump_content_alias() {
        let raw = r#"{"posts": [
            {"id": "how-we-built-it", "title": "How we built it", "date": "2024-01-15", "content": "long article body"}
        ]}"#;

        let corpus = Corpus::from_json(Source::Habr, raw).unwrap();
        assert_eq!(corpus.posts[0].body(), "long article body");
        assert_eq!(corpus.posts[0].engagement(), 0);
    }

    #[test]
    fn test_parse_bare_array_dump() {
        let raw = r#"[{"id": 1, "date": "2024-01-01", "text": "a"}]"#;
        let corpus = Corpus::from_json(Source::Telegram, raw).unwrap();
        assert_eq!(corpus.len(), 1);
    }

    #[test]
    fn test_pikabu_rating_string_maps_to_views() {
        let raw = r#"[{"id": 7, "title": "story", "content": "body", "date": "2024-01-01", "rating": "1 234"}]"#;
        let corpus = Corpus::from_json(Source::Pikabu, raw).unwrap();
        assert_eq!(corpus.posts[0].engagement(), 1234);
    }

    #[test]
    fn test_post_without_text_degrades_to_title_then_empty() {
        let raw = r#"[
            {"id": 1, "title": "only title", "date": ""},
            {"id": 2, "date": ""}
        ]"#;
        let corpus = Corpus::from_json(Source::Habr, raw).unwrap();
        assert_eq!(corpus.posts[0].body(), "only title");
        assert_eq!(corpus.posts[1].body(), "");
    }
}
