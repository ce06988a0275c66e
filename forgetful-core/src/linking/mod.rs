//! Auto-linking: on memory creation, bind the new memory to its nearest
//! neighbors so related knowledge surfaces together at query time (spec
//! §4.E).

use crate::error::Result;
use crate::storage::StorageBackend;
use crate::types::memory::{validate_link_request, MemoryLinkRequest};
use crate::types::{Id, UserId};
use std::sync::Arc;

/// Finds the `num_links` nearest neighbors of a freshly created memory and
/// links it to each of them.
///
/// Mirrors the design of the source prototype's auto-linker: failure here
/// never fails memory creation. A storage error or an empty neighbor set is
/// logged and treated as zero links, not propagated to the caller.
pub struct AutoLinker {
    storage: Arc<dyn StorageBackend>,
}

impl AutoLinker {
    #[must_use]
    pub fn new(storage: Arc<dyn StorageBackend>) -> Self {
        Self { storage }
    }

    /// Link `memory_id` to its `num_links` nearest neighbors by cosine
    /// similarity over `embedding`, and return that neighbor list as a
    /// review hint regardless of whether the link writes succeeded — the
    /// caller surfaces it even if `create_links_batch` failed or partially
    /// skipped entries, since the similarity lookup itself is what matters
    /// to a reviewer deciding whether the new memory duplicates one that
    /// already exists.
    pub async fn auto_link(
        &self,
        user_id: UserId,
        memory_id: Id,
        embedding: &[f32],
        num_links: usize,
    ) -> Vec<Id> {
        if num_links == 0 {
            return Vec::new();
        }

        let similar = match self
            .storage
            .find_similar_memories(user_id, memory_id, embedding, num_links)
            .await
        {
            Ok(candidates) => candidates,
            Err(err) => {
                tracing::warn!(%memory_id, error = %err, "auto-link neighbor search failed");
                return Vec::new();
            }
        };

        if similar.is_empty() {
            tracing::info!(%memory_id, "auto-linking found no similar memories");
            return Vec::new();
        }

        let target_ids: Vec<Id> = similar.iter().map(|s| s.memory.id).collect();
        if let Err(err) = self
            .storage
            .create_links_batch(user_id, memory_id, &target_ids)
            .await
        {
            tracing::warn!(%memory_id, error = %err, "auto-link batch creation failed");
        } else {
            tracing::info!(%memory_id, count = target_ids.len(), "auto-linked memory");
        }
        target_ids
    }

    /// Manually link a source memory to a set of targets, validating the
    /// request shape first (non-empty, no self-links).
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::Error::Validation`] from
    /// [`crate::types::validate_link_request`] if the request is malformed,
    /// or a storage error if the source memory does not exist.
    pub async fn link_memories(
        &self,
        user_id: UserId,
        memory_id: Id,
        related_ids: &[Id],
    ) -> Result<usize> {
        validate_link_request(&MemoryLinkRequest {
            memory_id,
            related_ids: related_ids.to_vec(),
        })?;
        self.storage.get_memory(user_id, memory_id).await?;
        let links = self
            .storage
            .create_links_batch(user_id, memory_id, related_ids)
            .await?;
        Ok(links.len())
    }
}
