//! Hash-based pseudo-embeddings.
//!
//! **Mock/test-only.** [`DeterministicEmbeddingAdapter`] generates vectors
//! from a text hash and a simple LCG; they are deterministic and fast but
//! carry no semantic meaning. Use it for unit tests and local development
//! only. Production deployments should configure a real adapter (a hosted
//! embedding API, behind [`super::HttpEmbeddingAdapter`] when the
//! `http-embeddings` feature is enabled, or a custom [`super::EmbeddingAdapter`]
//! impl).

use super::{normalize, EmbeddingAdapter};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Deterministic, dependency-free [`EmbeddingAdapter`] for tests and local
/// development.
pub struct DeterministicEmbeddingAdapter {
    dimensions: usize,
}

impl DeterministicEmbeddingAdapter {
    #[must_use]
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

impl Default for DeterministicEmbeddingAdapter {
    fn default() -> Self {
        Self::new(384)
    }
}

#[async_trait]
impl EmbeddingAdapter for DeterministicEmbeddingAdapter {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        tracing::warn!(
            text_preview = %text.chars().take(20).collect::<String>(),
            "using deterministic hash-based embeddings; not semantically meaningful"
        );

        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        let mut seed = hasher.finish();

        let mut embedding = Vec::with_capacity(self.dimensions);
        for _ in 0..self.dimensions {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            let value = ((seed >> 16) as f32) / 32_768.0 - 1.0;
            embedding.push(value);
        }
        normalize(&mut embedding);
        Ok(embedding)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_text_yields_same_vector() {
        let adapter = DeterministicEmbeddingAdapter::new(16);
        let a = adapter.embed("hello world").await.unwrap();
        let b = adapter.embed("hello world").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn different_text_yields_different_vector() {
        let adapter = DeterministicEmbeddingAdapter::new(16);
        let a = adapter.embed("hello").await.unwrap();
        let b = adapter.embed("world").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn vector_has_configured_dimensions() {
        let adapter = DeterministicEmbeddingAdapter::new(64);
        let v = adapter.embed("x").await.unwrap();
        assert_eq!(v.len(), 64);
        assert_eq!(adapter.dimensions(), 64);
    }
}
