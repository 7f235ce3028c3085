//! Shared test fixtures.

use std::collections::HashMap;

use crate::posts::{Corpus, Post, Source};
use crate::semantic::{EmbeddingError, EmbeddingProvider};

/// Embedding provider backed by a fixed text → vector table.
/// Unknown text is an error so that misrouted batches surface loudly.
pub struct StubProvider {
    vectors: HashMap<String, Vec<f32>>,
}

impl StubProvider {
    pub fn new(entries: &[(&str, Vec<f32>)]) -> Self {
        Self {
            vectors: entries
                .iter()
                .map(|(text, v)| (text.to_string(), v.clone()))
                .collect(),
        }
    }
}

impl EmbeddingProvider for StubProvider {
    fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        texts
            .iter()
            .map(|text| {
                self.vectors.get(text).cloned().ok_or_else(|| {
                    EmbeddingError::EmbeddingFailed(format!("no stub vector for '{text}'"))
                })
            })
            .collect()
    }
}

pub fn post(id: &str, text: &str, views: Option<i64>) -> Post {
    Post {
        id: id.to_string(),
        title: None,
        text: Some(text.to_string()),
        date: "2024-01-01".to_string(),
        views,
        url: None,
        media: false,
        is_forward: false,
    }
}

pub fn corpus(source: Source, posts: Vec<Post>) -> Corpus {
    Corpus::new(source, posts)
}

/// Unit vector at `degrees` in the plane; handy for exact cosine control.
pub fn at_angle(degrees: f32) -> Vec<f32> {
    let rad = degrees.to_radians();
    vec![rad.cos(), rad.sin()]
}
