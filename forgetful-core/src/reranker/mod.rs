//! Optional cross-encoder reranking stage (spec §4.C).
//!
//! Reranking is the last, most expensive retrieval stage. It is off by
//! default ([`NoopRerankerAdapter`]); a deployment opts in by configuring
//! [`crate::config::RerankerConfig::provider`] to `"http"` and supplying a
//! real [`RerankerAdapter`].

use crate::error::Result;
use async_trait::async_trait;

/// A (candidate, score) pair returned by a reranker, where `score` is
/// higher-is-better and not assumed to be bounded or comparable across
/// adapters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RerankScore {
    pub index: usize,
    pub score: f32,
}

/// Reorders retrieval candidates by query-relevance.
///
/// # Errors
///
/// Implementations return [`crate::error::Error::Internal`] on adapter
/// failure.
#[async_trait]
pub trait RerankerAdapter: Send + Sync {
    /// Score each of `candidates` against `query`. The returned vector has
    /// exactly `candidates.len()` entries, one per input index, in no
    /// particular order — callers sort by `score` descending.
    async fn rerank(&self, query: &str, candidates: &[String]) -> Result<Vec<RerankScore>>;
}

/// Pass-through reranker: preserves input order by assigning each candidate
/// a score equal to its negated index (so a stable descending sort leaves
/// the original order unchanged).
#[derive(Debug, Default)]
pub struct NoopRerankerAdapter;

#[async_trait]
impl RerankerAdapter for NoopRerankerAdapter {
    async fn rerank(&self, _query: &str, candidates: &[String]) -> Result<Vec<RerankScore>> {
        Ok(candidates
            .iter()
            .enumerate()
            .map(|(index, _)| RerankScore {
                index,
                score: -(index as f32),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn noop_preserves_order() {
        let reranker = NoopRerankerAdapter;
        let candidates = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let mut scores = reranker.rerank("query", &candidates).await.unwrap();
        scores.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap());
        let order: Vec<usize> = scores.iter().map(|s| s.index).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }
}
