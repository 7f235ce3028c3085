//! The embedding capability and its fastembed-backed implementation.
//!
//! The matching engine only depends on [`EmbeddingProvider`]; which model
//! produces the vectors is the caller's business. The shipped implementation
//! wraps fastembed with lazy model download into a configurable cache
//! directory.

use std::path::PathBuf;
use std::sync::Mutex;

use fastembed::{InitOptions, TextEmbedding};

/// Error type for embedding operations.
#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    #[error("Model initialization failed: {0}")]
    InitFailed(String),

    #[error("Embedding generation failed: {0}")]
    EmbeddingFailed(String),

    #[error("Invalid model name: {0}")]
    InvalidModel(String),

    #[error("Provider returned {got} vectors for {expected} texts")]
    Misaligned { expected: usize, got: usize },
}

/// Maps a batch of texts to fixed-length vectors.
///
/// Contract: the output is positionally aligned with the input and has the
/// same length; identical text under the same model configuration yields
/// identical vectors.
pub trait EmbeddingProvider {
    fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;
}

/// Wrapper around fastembed's TextEmbedding model.
/// Uses a Mutex because fastembed's embed() requires &mut self.
pub struct FastembedProvider {
    model: Mutex<TextEmbedding>,
    model_name: String,
}

impl FastembedProvider {
    /// Create a provider for the named model.
    ///
    /// The model is downloaded on first use and cached in the `models/`
    /// subdirectory of `cache_dir`.
    pub fn new(model_name: &str, cache_dir: PathBuf) -> Result<Self, EmbeddingError> {
        let model_enum = Self::parse_model_name(model_name)?;

        let models_dir = cache_dir.join("models");
        std::fs::create_dir_all(&models_dir).map_err(|e| {
            EmbeddingError::InitFailed(format!("Failed to create models directory: {}", e))
        })?;

        let options = InitOptions::new(model_enum)
            .with_cache_dir(models_dir)
            .with_show_download_progress(true);

        let model = TextEmbedding::try_new(options)
            .map_err(|e| EmbeddingError::InitFailed(e.to_string()))?;

        Ok(Self {
            model: Mutex::new(model),
            model_name: model_name.to_string(),
        })
    }

    /// Get the model name.
    pub fn name(&self) -> &str {
        &self.model_name
    }

    /// Parse model name string to fastembed enum.
    fn parse_model_name(name: &str) -> Result<fastembed::EmbeddingModel, EmbeddingError> {
        match name.to_lowercase().as_str() {
            "paraphrase-multilingual-minilm-l12-v2" | "paraphrasemlminilml12v2" => {
                Ok(fastembed::EmbeddingModel::ParaphraseMLMiniLML12V2)
            }
            "paraphrase-multilingual-mpnet-base-v2" | "paraphrasemlmpnetbasev2" => {
                Ok(fastembed::EmbeddingModel::ParaphraseMLMpnetBaseV2)
            }
            "multilingual-e5-small" | "multilinguale5small" => {
                Ok(fastembed::EmbeddingModel::MultilingualE5Small)
            }
            "all-minilm-l6-v2" | "allminiml6v2" => Ok(fastembed::EmbeddingModel::AllMiniLML6V2),
            "bge-small-en-v1.5" | "bgesmallenv15" => {
                Ok(fastembed::EmbeddingModel::BGESmallENV15)
            }
            _ => Err(EmbeddingError::InvalidModel(format!(
                "Unknown model: {}. Supported models: paraphrase-multilingual-MiniLM-L12-v2, paraphrase-multilingual-mpnet-base-v2, multilingual-e5-small, all-MiniLM-L6-v2, bge-small-en-v1.5",
                name
            ))),
        }
    }
}

impl EmbeddingProvider for FastembedProvider {
    fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let mut model = self.model.lock().map_err(|e| {
            EmbeddingError::EmbeddingFailed(format!("Failed to acquire model lock: {}", e))
        })?;

        let embeddings = model
            .embed(texts.to_vec(), None)
            .map_err(|e| EmbeddingError::EmbeddingFailed(e.to_string()))?;

        if embeddings.len() != texts.len() {
            return Err(EmbeddingError::Misaligned {
                expected: texts.len(),
                got: embeddings.len(),
            });
        }

        Ok(embeddings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_model_name() {
        let temp_dir = std::env::temp_dir().join("crosspost-embed-invalid");
        let result = FastembedProvider::new("nonexistent-model", temp_dir);
        assert!(matches!(result, Err(EmbeddingError::InvalidModel(_))));
    }

    // Integration tests require model download - run with --ignored
    #[test]
    #[ignore = "requires model download"]
    fn test_encode_alignment_and_determinism() {
        let temp_dir = std::env::temp_dir().join("crosspost-embed-test");
        let provider = FastembedProvider::new("all-MiniLM-L6-v2", temp_dir.clone()).unwrap();

        let texts = vec![
            "the same post twice".to_string(),
            "a completely different message".to_string(),
            "the same post twice".to_string(),
        ];

        let vectors = provider.encode(&texts).unwrap();
        assert_eq!(vectors.len(), texts.len());

        // identical text, identical vector
        assert_eq!(vectors[0], vectors[2]);

        let _ = std::fs::remove_dir_all(&temp_dir);
    }
}
