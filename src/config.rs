//! Run configuration, loaded from a YAML file.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::lexical::{
    DEFAULT_ABSOLUTE_THRESHOLD, DEFAULT_NGRAM_SIZE, DEFAULT_RELATIVE_THRESHOLD,
    DEFAULT_STOP_PHRASES,
};
use crate::semantic::{
    DEFAULT_DUPLICATE_THRESHOLD, DEFAULT_EMBED_BATCH_SIZE, DEFAULT_MATCH_THRESHOLD, DEFAULT_MODEL,
};

/// Configuration for the lexical matching path.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LexicalConfig {
    /// N-gram window size in tokens.
    #[serde(default = "default_window")]
    pub window: usize,

    /// Absolute score floor for accepting a pair.
    #[serde(default = "default_absolute_threshold")]
    pub absolute_threshold: f64,

    /// Multiplier on the smaller n-gram set size.
    #[serde(default = "default_relative_threshold")]
    pub relative_threshold: f64,

    /// Token windows excluded from scoring.
    #[serde(default = "default_stop_phrases")]
    pub stop_phrases: Vec<String>,
}

impl Default for LexicalConfig {
    fn default() -> Self {
        Self {
            window: DEFAULT_NGRAM_SIZE,
            absolute_threshold: DEFAULT_ABSOLUTE_THRESHOLD,
            relative_threshold: DEFAULT_RELATIVE_THRESHOLD,
            stop_phrases: default_stop_phrases(),
        }
    }
}

impl LexicalConfig {
    pub fn stop_phrase_set(&self) -> HashSet<String> {
        self.stop_phrases.iter().cloned().collect()
    }
}

/// Configuration for the semantic matching path.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SemanticConfig {
    /// Embedding model name (e.g. "paraphrase-multilingual-MiniLM-L12-v2").
    #[serde(default = "default_model")]
    pub model: String,

    /// Directory the embedding model is downloaded into.
    #[serde(default = "default_model_cache_dir")]
    pub model_cache_dir: String,

    /// Cosine similarity above which same-source posts are duplicates.
    #[serde(default = "default_duplicate_threshold")]
    pub duplicate_threshold: f32,

    /// Cosine similarity at or above which cross-source posts match.
    #[serde(default = "default_match_threshold")]
    pub match_threshold: f32,

    /// Texts per embedding provider call.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            model_cache_dir: default_model_cache_dir(),
            duplicate_threshold: DEFAULT_DUPLICATE_THRESHOLD,
            match_threshold: DEFAULT_MATCH_THRESHOLD,
            batch_size: DEFAULT_EMBED_BATCH_SIZE,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub lexical: LexicalConfig,
    #[serde(default)]
    pub semantic: SemanticConfig,
}

fn default_window() -> usize {
    DEFAULT_NGRAM_SIZE
}

fn default_absolute_threshold() -> f64 {
    DEFAULT_ABSOLUTE_THRESHOLD
}

fn default_relative_threshold() -> f64 {
    DEFAULT_RELATIVE_THRESHOLD
}

fn default_stop_phrases() -> Vec<String> {
    let mut phrases: Vec<String> = DEFAULT_STOP_PHRASES.iter().cloned().collect();
    phrases.sort();
    phrases
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_model_cache_dir() -> String {
    ".crosspost".to_string()
}

fn default_duplicate_threshold() -> f32 {
    DEFAULT_DUPLICATE_THRESHOLD
}

fn default_match_threshold() -> f32 {
    DEFAULT_MATCH_THRESHOLD
}

fn default_batch_size() -> usize {
    DEFAULT_EMBED_BATCH_SIZE
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("config is malformed: {0}")]
    Parse(#[from] serde_yml::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

impl Config {
    /// Load from a YAML file, or fall back to defaults when no path is
    /// given. Out-of-range values fail fast.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)?;
                serde_yml::from_str(&raw)?
            }
            None => Self::default(),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.lexical.window == 0 {
            return Err(ConfigError::Invalid(
                "lexical.window must be at least 1".to_string(),
            ));
        }
        if self.lexical.absolute_threshold < 0.0 {
            return Err(ConfigError::Invalid(
                "lexical.absolute_threshold must not be negative".to_string(),
            ));
        }
        if self.lexical.relative_threshold < 0.0 {
            return Err(ConfigError::Invalid(
                "lexical.relative_threshold must not be negative".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.semantic.duplicate_threshold) {
            return Err(ConfigError::Invalid(format!(
                "semantic.duplicate_threshold must be between 0.0 and 1.0, got {}",
                self.semantic.duplicate_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.semantic.match_threshold) {
            return Err(ConfigError::Invalid(format!(
                "semantic.match_threshold must be between 0.0 and 1.0, got {}",
                self.semantic.match_threshold
            )));
        }
        if self.semantic.batch_size == 0 {
            return Err(ConfigError::Invalid(
                "semantic.batch_size must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
