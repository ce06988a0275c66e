//! # Storage Abstraction
//!
//! Unified trait for storage backends (embedded `redb`, server-class
//! `libsql`/Turso).
//!
//! This lets the retrieval, linking, composition, and graph-traversal
//! components work against either backend transparently: an embedded
//! single-tenant deployment and a multi-tenant server deployment implement
//! the same contract, differing only in how they execute vector search
//! (brute-force cosine scan vs. the `vector_top_k` ANN index) and how they
//! persist rows.

pub mod pagination;

use crate::error::Result;
use crate::types::{
    CodeArtifact, CodeArtifactCreate, CodeArtifactUpdate, Document, DocumentCreate,
    DocumentUpdate, Entity, EntityCreate, EntityRelationship, EntityRelationshipCreate,
    EntityUpdate, Id, Memory, MemoryCreate, MemoryLink, MemoryUpdate, Project, ProjectCreate,
    ProjectUpdate, UserId,
};
use async_trait::async_trait;
use pagination::Page;

/// A memory candidate returned from a vector or lexical search stage,
/// paired with the raw score that produced its rank. Dense-stage scores are
/// cosine similarity in `[-1.0, 1.0]`; lexical-stage scores are
/// backend-defined relevance scores, not comparable across stages (fusion
/// operates on rank, not raw score — see [`crate::retrieval`]).
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredMemory {
    pub memory: Memory,
    pub score: f32,
}

/// A single node in a [`crate::graph`] subgraph expansion, backend-agnostic.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphNodeRow {
    pub node_id: String,
    pub node_type: String,
    pub label: String,
}

/// A single edge in a subgraph expansion, already canonicalized.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphEdgeRow {
    pub edge_id: String,
    pub source_node_id: String,
    pub target_node_id: String,
    pub edge_type: String,
}

/// Unified storage backend trait.
///
/// All operations are async to support both natively-async (`libsql`) and
/// sync (`redb` via `spawn_blocking`) implementations. Every method takes an
/// explicit `user_id` and never allows a caller to observe rows belonging to
/// another tenant; implementations enforce this at the query level, not by
/// post-hoc filtering.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    // -- memories --------------------------------------------------------

    /// Insert a memory. `embedding` must already be the final unit-length
    /// vector; the trait does not compute embeddings itself.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::Error::Internal`] if `embedding.len()` does
    /// not match the table's configured dimension.
    async fn create_memory(
        &self,
        user_id: UserId,
        data: &MemoryCreate,
        embedding: Vec<f32>,
    ) -> Result<Memory>;

    /// Fetch a memory by id. Returns obsolete memories too (direct-ID
    /// retrieval bypasses the obsolete exclusion applied to search).
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::Error::NotFound`] if absent or not owned by
    /// `user_id`.
    async fn get_memory(&self, user_id: UserId, id: Id) -> Result<Memory>;

    /// Apply a PATCH-semantics update. When `new_embedding` is `Some`, the
    /// stored embedding is replaced (the caller recomputed it because
    /// `update.search_fields_changed()` was true).
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::Error::NotFound`] if absent or not owned.
    async fn update_memory(
        &self,
        user_id: UserId,
        id: Id,
        update: &MemoryUpdate,
        new_embedding: Option<Vec<f32>>,
    ) -> Result<Memory>;

    /// Mark a memory obsolete (soft delete). Idempotent: marking an
    /// already-obsolete memory obsolete again succeeds and overwrites the
    /// reason/`superseded_by`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::Error::NotFound`] if absent or not owned.
    /// Returns [`crate::error::Error::Validation`] if `superseded_by` points
    /// at a memory owned by a different user, or at itself.
    async fn mark_memory_obsolete(
        &self,
        user_id: UserId,
        id: Id,
        reason: Option<String>,
        superseded_by: Option<Id>,
    ) -> Result<Memory>;

    /// Dense nearest-neighbor search over non-obsolete memories only.
    /// `importance_threshold` and `exclude_ids` are applied before the
    /// candidate set is scored and cut down to `k`, so a qualifying result
    /// is never lost to the top-k cut ahead of filtering. Returns at most
    /// `k` results ordered by descending cosine similarity.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::Error::Internal`] if `query_embedding`'s
    /// dimension mismatches the table.
    async fn semantic_search(
        &self,
        user_id: UserId,
        query_embedding: &[f32],
        k: usize,
        project_ids: Option<&[Id]>,
        importance_threshold: Option<u8>,
        exclude_ids: Option<&[Id]>,
    ) -> Result<Vec<ScoredMemory>>;

    /// Lexical (keyword/full-text) search over non-obsolete memories.
    /// Backends without a full-text index may implement this as a
    /// substring scan; it participates in fusion purely by rank, so exact
    /// scoring semantics need not match across backends.
    /// `importance_threshold`/`exclude_ids` are filtered before the `k` cut,
    /// same as [`Self::semantic_search`].
    async fn lexical_search(
        &self,
        user_id: UserId,
        query_text: &str,
        k: usize,
        project_ids: Option<&[Id]>,
        importance_threshold: Option<u8>,
        exclude_ids: Option<&[Id]>,
    ) -> Result<Vec<ScoredMemory>>;

    /// Dense nearest-neighbor search used by auto-linking: like
    /// [`Self::semantic_search`] but against an already-known memory's own
    /// embedding and excluding that memory from the results.
    async fn find_similar_memories(
        &self,
        user_id: UserId,
        memory_id: Id,
        embedding: &[f32],
        k: usize,
    ) -> Result<Vec<ScoredMemory>>;

    // -- links -------------------------------------------------------------

    /// Create a bidirectional link. Canonicalizes `(source_id, target_id)`
    /// with the smaller id first before the unique-constraint check.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::Error::AlreadyLinked`] if the canonicalized
    /// pair already exists. Returns [`crate::error::Error::Validation`] if
    /// `source_id == target_id`.
    async fn create_link(&self, user_id: UserId, source_id: Id, target_id: Id) -> Result<MemoryLink>;

    /// Create links in bulk (used by auto-linking), silently skipping pairs
    /// that already exist rather than failing the whole batch.
    async fn create_links_batch(
        &self,
        user_id: UserId,
        source_id: Id,
        target_ids: &[Id],
    ) -> Result<Vec<MemoryLink>>;

    /// Fetch memories linked to any of `memory_ids`, one hop out, excluding
    /// `memory_ids` themselves and obsolete memories.
    async fn get_linked_memories(
        &self,
        user_id: UserId,
        memory_ids: &[Id],
        max_links_per_primary: usize,
    ) -> Result<Vec<(Id, Memory)>>;

    // -- projects / documents / code artifacts / entities -----------------

    async fn create_project(&self, user_id: UserId, data: &ProjectCreate) -> Result<Project>;
    async fn get_project(&self, user_id: UserId, id: Id) -> Result<Project>;
    async fn update_project(&self, user_id: UserId, id: Id, update: &ProjectUpdate) -> Result<Project>;
    async fn delete_project(&self, user_id: UserId, id: Id) -> Result<()>;
    async fn list_projects(&self, user_id: UserId, page: Page) -> Result<Vec<Project>>;

    async fn create_document(&self, user_id: UserId, data: &DocumentCreate) -> Result<Document>;
    async fn get_document(&self, user_id: UserId, id: Id) -> Result<Document>;
    async fn update_document(&self, user_id: UserId, id: Id, update: &DocumentUpdate) -> Result<Document>;
    async fn delete_document(&self, user_id: UserId, id: Id) -> Result<()>;
    async fn list_documents(&self, user_id: UserId, page: Page) -> Result<Vec<Document>>;

    async fn create_code_artifact(&self, user_id: UserId, data: &CodeArtifactCreate) -> Result<CodeArtifact>;
    async fn get_code_artifact(&self, user_id: UserId, id: Id) -> Result<CodeArtifact>;
    async fn update_code_artifact(
        &self,
        user_id: UserId,
        id: Id,
        update: &CodeArtifactUpdate,
    ) -> Result<CodeArtifact>;
    async fn delete_code_artifact(&self, user_id: UserId, id: Id) -> Result<()>;
    async fn list_code_artifacts(&self, user_id: UserId, page: Page) -> Result<Vec<CodeArtifact>>;

    async fn create_entity(&self, user_id: UserId, data: &EntityCreate) -> Result<Entity>;
    async fn get_entity(&self, user_id: UserId, id: Id) -> Result<Entity>;
    async fn update_entity(&self, user_id: UserId, id: Id, update: &EntityUpdate) -> Result<Entity>;
    async fn delete_entity(&self, user_id: UserId, id: Id) -> Result<()>;
    async fn list_entities(&self, user_id: UserId, page: Page) -> Result<Vec<Entity>>;

    async fn create_entity_relationship(
        &self,
        user_id: UserId,
        data: &EntityRelationshipCreate,
    ) -> Result<EntityRelationship>;
    async fn delete_entity_relationship(&self, user_id: UserId, id: Id) -> Result<()>;

    // -- graph traversal ---------------------------------------------------

    /// Fetch the display label/type for a parsed node id (spec §4.F's
    /// `"{type}_{id}"` scheme), used to seed BFS expansion.
    async fn fetch_node(&self, user_id: UserId, node_type: &str, id: Id) -> Result<GraphNodeRow>;

    /// Fetch all outgoing/incoming edges touching a single node, one hop,
    /// for the graph traversal BFS frontier expansion.
    async fn fetch_edges_for_node(
        &self,
        user_id: UserId,
        node_type: &str,
        id: Id,
    ) -> Result<Vec<GraphEdgeRow>>;

    // -- re-embedding --------------------------------------------------------

    /// Count non-obsolete memories, for re-embed progress reporting.
    async fn count_memories(&self, user_id: UserId) -> Result<usize>;

    /// Fetch a page of memories (including obsolete) ordered by id, for the
    /// re-embed orchestrator's batch loop.
    async fn page_memories_for_reembed(
        &self,
        user_id: UserId,
        after_id: Option<Id>,
        limit: usize,
    ) -> Result<Vec<Memory>>;

    /// Overwrite a memory's stored embedding in place without touching any
    /// other field or `updated_at`.
    async fn set_memory_embedding(&self, user_id: UserId, id: Id, embedding: Vec<f32>) -> Result<()>;

    /// Clear every memory's embedding for `user_id` ahead of a full
    /// re-embed pass (spec §4.K step 2). Leaves every other field intact;
    /// a crash after this step and before the batch-write loop completes
    /// is recoverable by simply re-running the orchestrator.
    async fn reset_embedding_storage(&self, user_id: UserId) -> Result<()>;

    /// Overwrite many memories' embeddings in one call (spec §4.K
    /// `bulk_update_embeddings`). Implementations may batch this into a
    /// single transaction; callers must not assume partial-failure
    /// semantics beyond "some prefix of `updates` took effect".
    async fn bulk_update_embeddings(&self, user_id: UserId, updates: &[(Id, Vec<f32>)]) -> Result<()> {
        for (id, embedding) in updates {
            self.set_memory_embedding(user_id, *id, embedding.clone()).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scored_memory_is_comparable_by_score() {
        let memory = Memory {
            id: 1,
            user_id: uuid::Uuid::nil(),
            title: "t".to_string(),
            content: "c".to_string(),
            context: String::new(),
            keywords: vec![],
            tags: vec![],
            importance: 5,
            project_ids: vec![],
            code_artifact_ids: vec![],
            document_ids: vec![],
            entity_ids: vec![],
            embedding: vec![],
            is_obsolete: false,
            obsolete_reason: None,
            superseded_by: None,
            obsoleted_at: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
            linked_memory_ids: vec![],
        };
        let a = ScoredMemory {
            memory: memory.clone(),
            score: 0.9,
        };
        let b = ScoredMemory { memory, score: 0.5 };
        assert!(a.score > b.score);
    }
}
