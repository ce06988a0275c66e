//! HTTP-backed embedding adapter, enabled by the `http-embeddings` feature.
//!
//! Posts `{"input": [...texts]}` to a configured endpoint and expects
//! `{"embeddings": [[f32; N]; batch]}` back. Shaped to front any OpenAI-style
//! embeddings endpoint with a thin reverse proxy.

use super::EmbeddingAdapter;
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub struct HttpEmbeddingAdapter {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    dimensions: usize,
}

impl HttpEmbeddingAdapter {
    #[must_use]
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>, dimensions: usize) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            model: model.into(),
            dimensions,
        }
    }
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[async_trait]
impl EmbeddingAdapter for HttpEmbeddingAdapter {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut batch = self.embed_batch(std::slice::from_ref(&text.to_string())).await?;
        batch
            .pop()
            .ok_or_else(|| Error::Internal("embedding provider returned no vectors".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let body = EmbedRequest {
            model: &self.model,
            input: texts,
        };
        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Internal(format!("embedding request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::Internal(format!(
                "embedding provider returned status {}",
                response.status()
            )));
        }

        let parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|e| Error::Internal(format!("malformed embedding response: {e}")))?;

        for vec in &parsed.embeddings {
            if vec.len() != self.dimensions {
                return Err(Error::Internal(format!(
                    "embedding provider returned {} dims, expected {}",
                    vec.len(),
                    self.dimensions
                )));
            }
        }
        Ok(parsed.embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
