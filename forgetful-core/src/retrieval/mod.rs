//! The retrieval pipeline: dense search, optional lexical fusion, optional
//! cross-encoder rerank, then token-budget composition (spec §4.B, §4.G).
//!
//! Stage 1 (dense) always runs. Stages 2-4 (lexical fusion, rerank) are
//! optional — the source prototype ships only stage 1 today, with the
//! remaining stages scaffolded for a future cross-encoder; this pipeline
//! implements all four, gated by configuration, so a deployment can turn
//! lexical fusion and reranking on without a code change.

mod fusion;

pub use fusion::reciprocal_rank_fusion;

use crate::compose::{apply_token_budget, dedupe_linked, ComposedResult};
use crate::config::MemoryConfig;
use crate::embeddings::EmbeddingAdapter;
use crate::error::Result;
use crate::reranker::RerankerAdapter;
use crate::storage::StorageBackend;
use crate::token_counter::TokenCounter;
use crate::types::memory::build_rerank_text;
use crate::types::{Memory, MemoryQueryRequest, MemoryQueryResult, UserId};
use std::sync::Arc;

/// Configuration for the optional quaternary retrieval stages. Absent
/// fields disable that stage.
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    pub lexical_fusion: bool,
    pub fanout: usize,
}

/// Orchestrates a full `query_memory` call: dense (+ optional lexical
/// fusion/rerank) retrieval of primary memories, one-hop linked memory
/// expansion, then token-budget composition.
pub struct RetrievalPipeline {
    storage: Arc<dyn StorageBackend>,
    embeddings: Arc<dyn EmbeddingAdapter>,
    reranker: Option<Arc<dyn RerankerAdapter>>,
    token_counter: Arc<TokenCounter>,
    options: PipelineOptions,
}

impl RetrievalPipeline {
    #[must_use]
    pub fn new(
        storage: Arc<dyn StorageBackend>,
        embeddings: Arc<dyn EmbeddingAdapter>,
        reranker: Option<Arc<dyn RerankerAdapter>>,
        token_counter: Arc<TokenCounter>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            storage,
            embeddings,
            reranker,
            token_counter,
            options,
        }
    }

    /// Run the full pipeline for one query.
    ///
    /// # Errors
    ///
    /// Propagates embedding or storage errors unchanged.
    pub async fn query(
        &self,
        user_id: UserId,
        request: &MemoryQueryRequest,
        config: &MemoryConfig,
    ) -> Result<MemoryQueryResult> {
        let primary = self.retrieve_primary(user_id, request).await?;

        let linked = if request.include_links && request.max_links_per_primary > 0 && !primary.is_empty() {
            self.fetch_linked(user_id, &primary, request.max_links_per_primary)
                .await?
        } else {
            Vec::new()
        };

        let ComposedResult {
            primary: final_primary,
            linked: final_linked,
            token_count,
            truncated,
        } = apply_token_budget(
            primary,
            linked,
            request.effective_token_budget(config),
            request.effective_max_memories(config),
            &self.token_counter,
        );

        Ok(MemoryQueryResult {
            query: request.query.clone(),
            total_count: final_primary.len() + final_linked.len(),
            primary_memories: final_primary,
            linked_memories: final_linked,
            token_count,
            truncated,
        })
    }

    async fn retrieve_primary(
        &self,
        user_id: UserId,
        request: &MemoryQueryRequest,
    ) -> Result<Vec<Memory>> {
        let query_text = request.query.trim();
        let query_embedding = self.embeddings.embed(query_text).await?;
        let project_filter = request.project_ids.as_deref();

        let fanout = if self.options.lexical_fusion {
            request.k * self.options.fanout.max(1)
        } else {
            request.k
        };

        let importance_threshold = request.importance_threshold;
        let exclude_ids = request.exclude_ids.as_deref();

        let dense = self
            .storage
            .semantic_search(user_id, &query_embedding, fanout, project_filter, importance_threshold, exclude_ids)
            .await?;

        let fused = if self.options.lexical_fusion {
            let lexical = self
                .storage
                .lexical_search(user_id, query_text, fanout, project_filter, importance_threshold, exclude_ids)
                .await?;
            reciprocal_rank_fusion(&[dense, lexical])
        } else {
            dense
        };

        let mut candidates: Vec<Memory> = fused.into_iter().map(|s| s.memory).collect();

        if let Some(reranker) = &self.reranker {
            candidates = self
                .apply_rerank(reranker.as_ref(), &request.query, &request.query_context, candidates)
                .await?;
        }

        candidates.truncate(request.k);
        Ok(candidates)
    }

    async fn apply_rerank(
        &self,
        reranker: &dyn RerankerAdapter,
        query: &str,
        query_context: &str,
        candidates: Vec<Memory>,
    ) -> Result<Vec<Memory>> {
        if candidates.is_empty() {
            return Ok(candidates);
        }
        let rerank_query = format!("{query}\n{query_context}");
        let texts: Vec<String> = candidates
            .iter()
            .map(|m| build_rerank_text(&m.title, &m.content, &m.context))
            .collect();
        let mut scores = reranker.rerank(&rerank_query, &texts).await?;
        scores.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        Ok(scores
            .into_iter()
            .filter_map(|s| candidates.get(s.index).cloned())
            .collect())
    }

    async fn fetch_linked(
        &self,
        user_id: UserId,
        primary: &[Memory],
        max_links_per_primary: usize,
    ) -> Result<Vec<crate::types::LinkedMemory>> {
        let ids: Vec<_> = primary.iter().map(|m| m.id).collect();
        let mut per_primary = Vec::new();
        for memory_id in &ids {
            match self
                .storage
                .get_linked_memories(user_id, std::slice::from_ref(memory_id), max_links_per_primary)
                .await
            {
                Ok(links) => per_primary.extend(links),
                Err(err) => {
                    tracing::warn!(%memory_id, error = %err, "failed to fetch linked memories");
                }
            }
        }
        Ok(dedupe_linked(primary, per_primary))
    }
}
