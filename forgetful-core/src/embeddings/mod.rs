//! Pluggable embedding generation (spec §4.A).
//!
//! The store never bundles a real embedding model: [`EmbeddingAdapter`] is a
//! seam a deployment fills in with whatever it already runs (a local ONNX
//! model, an HTTP call to a hosted provider). [`DeterministicEmbeddingAdapter`]
//! is the only adapter this crate ships, and it is mock-only — see its
//! module docs.

mod deterministic;
#[cfg(feature = "http-embeddings")]
mod http;

pub use deterministic::DeterministicEmbeddingAdapter;
#[cfg(feature = "http-embeddings")]
pub use http::HttpEmbeddingAdapter;

use crate::error::Result;
use async_trait::async_trait;

/// Produces unit-length embedding vectors for memory/query text.
///
/// # Errors
///
/// Implementations return [`crate::error::Error::Internal`] on adapter
/// failure (network error, model load failure) and
/// [`crate::error::Error::Timeout`] if a deadline elapses.
#[async_trait]
pub trait EmbeddingAdapter: Send + Sync {
    /// Embed a single piece of text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed a batch of texts. The default implementation embeds
    /// sequentially; adapters backed by a batching API should override this.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }

    /// Dimensionality of vectors this adapter produces. Storage backends use
    /// this to size their vector column at table-creation time.
    fn dimensions(&self) -> usize;
}

/// Cosine similarity between two equal-length vectors, in `[-1.0, 1.0]`.
/// Returns `0.0` for mismatched lengths, empty vectors, or a zero
/// magnitude on either side.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }
    dot / (mag_a * mag_b)
}

/// Normalize a vector to unit length in place. No-op on a zero vector.
pub fn normalize(v: &mut [f32]) {
    let magnitude = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if magnitude > 0.0 {
        for x in v.iter_mut() {
            *x /= magnitude;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_vectors_have_similarity_one() {
        let v = vec![1.0, 2.0, 3.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn mismatched_lengths_return_zero() {
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0]), 0.0);
    }

    #[test]
    fn normalize_produces_unit_length() {
        let mut v = vec![3.0, 4.0];
        normalize(&mut v);
        let magnitude: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((magnitude - 1.0).abs() < 1e-6);
    }
}
