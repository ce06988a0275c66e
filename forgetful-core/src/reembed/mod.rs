//! Batch re-embedding orchestration (spec §4.K).
//!
//! Run after swapping embedding providers or dimensions: count, reset, page
//! through every memory recomputing its embedding, then validate. Knows
//! nothing about the storage backend's table layout; it only uses
//! [`StorageBackend`]'s generic paging/write primitives.

use crate::embeddings::EmbeddingAdapter;
use crate::error::Result;
use crate::storage::StorageBackend;
use crate::types::memory::build_embedding_text;
use crate::types::UserId;
use std::sync::Arc;

/// Post-migration validation result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationResult {
    pub count_ok: bool,
    pub dimensions_ok: bool,
    pub search_ok: bool,
}

impl ValidationResult {
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.count_ok && self.dimensions_ok && self.search_ok
    }
}

/// Outcome of a full re-embed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReEmbedResult {
    pub total_processed: usize,
    pub total_memories: usize,
    pub validation: ValidationResult,
}

/// Orchestrates batch re-embedding of all of a user's memories.
pub struct ReEmbeddingService {
    storage: Arc<dyn StorageBackend>,
    embeddings: Arc<dyn EmbeddingAdapter>,
    batch_size: usize,
}

impl ReEmbeddingService {
    #[must_use]
    pub fn new(storage: Arc<dyn StorageBackend>, embeddings: Arc<dyn EmbeddingAdapter>, batch_size: usize) -> Self {
        Self {
            storage,
            embeddings,
            batch_size,
        }
    }

    /// Re-embed every memory owned by `user_id`, invoking `progress` after
    /// each batch with `(processed, total)`.
    ///
    /// # Errors
    ///
    /// Propagates storage or embedding adapter errors. A failure partway
    /// through leaves already-processed memories re-embedded and the rest
    /// untouched; re-running is safe since every memory is recomputed from
    /// its own stored fields, not from the prior embedding.
    pub async fn re_embed_all(
        &self,
        user_id: UserId,
        mut progress: impl FnMut(usize, usize),
    ) -> Result<ReEmbedResult> {
        let total = self.storage.count_memories(user_id).await?;
        tracing::info!(total_memories = total, "starting re-embedding");

        if total == 0 {
            return Ok(ReEmbedResult {
                total_processed: 0,
                total_memories: 0,
                validation: ValidationResult {
                    count_ok: true,
                    dimensions_ok: true,
                    search_ok: true,
                },
            });
        }

        self.storage.reset_embedding_storage(user_id).await?;

        let mut processed = 0usize;
        let mut after_id = None;

        loop {
            let batch = self
                .storage
                .page_memories_for_reembed(user_id, after_id, self.batch_size)
                .await?;
            if batch.is_empty() {
                break;
            }

            let mut updates = Vec::with_capacity(batch.len());
            for memory in &batch {
                let text = build_embedding_text(
                    &memory.title,
                    &memory.content,
                    &memory.context,
                    &memory.keywords,
                    &memory.tags,
                );
                let embedding = self.embeddings.embed(&text).await?;
                updates.push((memory.id, embedding));
            }
            self.storage.bulk_update_embeddings(user_id, &updates).await?;

            processed += batch.len();
            after_id = batch.last().map(|m| m.id);
            progress(processed, total);

            tracing::info!(processed, total, batch_size = batch.len(), "re-embed batch complete");

            if batch.len() < self.batch_size {
                break;
            }
        }

        let validation = self.validate(user_id, total).await?;
        Ok(ReEmbedResult {
            total_processed: processed,
            total_memories: total,
            validation,
        })
    }

    async fn validate(&self, user_id: UserId, expected_total: usize) -> Result<ValidationResult> {
        let count_ok = self.storage.count_memories(user_id).await? == expected_total;

        let sample = self.storage.page_memories_for_reembed(user_id, None, 1).await?;
        let dimensions_ok = sample
            .first()
            .is_none_or(|m| m.embedding.len() == self.embeddings.dimensions());

        let search_ok = match sample.first() {
            None => true,
            Some(memory) => {
                let embedding = self.embeddings.embed(&memory.title).await?;
                self.storage
                    .semantic_search(user_id, &embedding, 1, None, None, None)
                    .await
                    .is_ok_and(|results| !results.is_empty())
            }
        };

        let result = ValidationResult {
            count_ok,
            dimensions_ok,
            search_ok,
        };
        if result.all_passed() {
            tracing::info!(?result, "re-embed validation passed");
        } else {
            tracing::error!(?result, "re-embed validation failed");
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::DeterministicEmbeddingAdapter;
    use crate::types::MemoryCreate;
    use forgetful_storage_redb::RedbStorage;

    fn sample_create(title: &str) -> MemoryCreate {
        MemoryCreate {
            title: title.to_string(),
            content: "content".to_string(),
            context: "context".to_string(),
            keywords: vec![],
            tags: vec![],
            importance: 5,
            project_ids: vec![],
            code_artifact_ids: vec![],
            document_ids: vec![],
            entity_ids: vec![],
        }
    }

    #[tokio::test]
    async fn re_embed_all_resets_then_recomputes_every_memory() {
        let dir = tempfile::tempdir().unwrap();
        let storage: Arc<dyn StorageBackend> =
            Arc::new(RedbStorage::open(&dir.path().join("reembed.redb")).await.unwrap());
        let embeddings: Arc<dyn EmbeddingAdapter> = Arc::new(DeterministicEmbeddingAdapter::new(8));
        let user_id = uuid::Uuid::new_v4();

        for title in ["a", "b", "c"] {
            storage.create_memory(user_id, &sample_create(title), vec![0.0; 8]).await.unwrap();
        }

        let service = ReEmbeddingService::new(Arc::clone(&storage), Arc::clone(&embeddings), 2);
        let result = service.re_embed_all(user_id, |_processed, _total| {}).await.unwrap();

        assert_eq!(result.total_processed, 3);
        assert_eq!(result.total_memories, 3);
        assert!(result.validation.all_passed());

        let page = storage.page_memories_for_reembed(user_id, None, 10).await.unwrap();
        for memory in page {
            assert_eq!(memory.embedding.len(), 8);
            assert_ne!(memory.embedding, vec![0.0; 8]);
        }
    }

    #[tokio::test]
    async fn re_embed_all_is_a_noop_with_no_memories() {
        let dir = tempfile::tempdir().unwrap();
        let storage: Arc<dyn StorageBackend> =
            Arc::new(RedbStorage::open(&dir.path().join("reembed_empty.redb")).await.unwrap());
        let embeddings: Arc<dyn EmbeddingAdapter> = Arc::new(DeterministicEmbeddingAdapter::new(8));
        let user_id = uuid::Uuid::new_v4();

        let service = ReEmbeddingService::new(storage, embeddings, 2);
        let result = service.re_embed_all(user_id, |_, _| {}).await.unwrap();

        assert_eq!(result.total_processed, 0);
        assert!(result.validation.all_passed());
    }
}
