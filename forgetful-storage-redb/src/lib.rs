#![allow(clippy::excessive_nesting)]

//! # Forgetful Storage - redb
//!
//! Embedded `redb` storage backend for single-tenant, single-process
//! deployments of the atomic memory store: a CLI or an MCP server running
//! next to the user's editor, with no separate database process to run.
//!
//! Associations that a server-class backend would model as junction tables
//! are inlined here as `Vec<Id>` fields on the owning row — cheaper to scan
//! than to join at this scale, and it avoids redb's lack of a query planner
//! biting back. [`cascade`] keeps those inlined lists consistent on delete.
//!
//! ## Example
//!
//! ```no_run
//! use forgetful_storage_redb::RedbStorage;
//! use std::path::Path;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let storage = RedbStorage::open(Path::new("./forgetful.redb")).await?;
//! # Ok(())
//! # }
//! ```

mod backup;
mod cascade;
mod code_artifacts;
mod documents;
mod entities;
mod graph;
mod links;
mod memories;
mod projects;
mod tables;
mod util;

use async_trait::async_trait;
use forgetful_core::error::{Error, Result};
use forgetful_core::storage::pagination::Page;
use forgetful_core::storage::{GraphEdgeRow, GraphNodeRow, ScoredMemory, StorageBackend};
use forgetful_core::types::{
    CodeArtifact, CodeArtifactCreate, CodeArtifactUpdate, Document, DocumentCreate, DocumentUpdate,
    Entity, EntityCreate, EntityRelationship, EntityRelationshipCreate, EntityUpdate, Id, Memory,
    MemoryCreate, MemoryLink, MemoryUpdate, Project, ProjectCreate, ProjectUpdate, UserId,
};
use redb::Database;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tables::{
    CODE_ARTIFACTS_TABLE, COUNTERS_TABLE, DOCUMENTS_TABLE, ENTITIES_TABLE,
    ENTITY_RELATIONSHIPS_TABLE, MEMORIES_TABLE, MEMORY_LINKS_TABLE, PROJECTS_TABLE,
};
use tracing::info;
use util::{internal, with_db_timeout};

/// redb-backed [`StorageBackend`] implementation.
pub struct RedbStorage {
    db: Arc<Database>,
    path: PathBuf,
}

impl RedbStorage {
    /// Open (creating if absent) a redb database file and ensure every
    /// table exists.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Internal`] if the file can't be created/opened, or
    /// [`Error::Timeout`] if opening it takes longer than the db timeout.
    pub async fn open(path: &Path) -> Result<Self> {
        info!("opening redb database at {}", path.display());
        let path_buf = path.to_path_buf();
        let db = tokio::task::spawn_blocking(move || Database::create(&path_buf).map_err(internal))
            .await
            .map_err(|e| Error::Internal(format!("redb open task panicked: {e}")))??;
        let db = Arc::new(db);

        let init_db = Arc::clone(&db);
        with_db_timeout(init_db, |db| {
            let txn = db.begin_write().map_err(internal)?;
            {
                txn.open_table(MEMORIES_TABLE).map_err(internal)?;
                txn.open_table(MEMORY_LINKS_TABLE).map_err(internal)?;
                txn.open_table(PROJECTS_TABLE).map_err(internal)?;
                txn.open_table(DOCUMENTS_TABLE).map_err(internal)?;
                txn.open_table(CODE_ARTIFACTS_TABLE).map_err(internal)?;
                txn.open_table(ENTITIES_TABLE).map_err(internal)?;
                txn.open_table(ENTITY_RELATIONSHIPS_TABLE).map_err(internal)?;
                txn.open_table(COUNTERS_TABLE).map_err(internal)?;
            }
            txn.commit().map_err(internal)?;
            Ok(())
        })
        .await?;

        info!("initialized redb tables");
        Ok(Self { db, path: path.to_path_buf() })
    }

    fn handle(&self) -> Arc<Database> {
        Arc::clone(&self.db)
    }
}

#[async_trait]
impl StorageBackend for RedbStorage {
    async fn create_memory(&self, user_id: UserId, data: &MemoryCreate, embedding: Vec<f32>) -> Result<Memory> {
        let data = data.clone();
        with_db_timeout(self.handle(), move |db| memories::create_memory(db, user_id, &data, embedding)).await
    }

    async fn get_memory(&self, user_id: UserId, id: Id) -> Result<Memory> {
        with_db_timeout(self.handle(), move |db| memories::get_memory(db, user_id, id)).await
    }

    async fn update_memory(
        &self,
        user_id: UserId,
        id: Id,
        update: &MemoryUpdate,
        new_embedding: Option<Vec<f32>>,
    ) -> Result<Memory> {
        let update = update.clone();
        with_db_timeout(self.handle(), move |db| {
            memories::update_memory(db, user_id, id, &update, new_embedding)
        })
        .await
    }

    async fn mark_memory_obsolete(
        &self,
        user_id: UserId,
        id: Id,
        reason: Option<String>,
        superseded_by: Option<Id>,
    ) -> Result<Memory> {
        with_db_timeout(self.handle(), move |db| {
            memories::mark_memory_obsolete(db, user_id, id, reason, superseded_by)
        })
        .await
    }

    async fn semantic_search(
        &self,
        user_id: UserId,
        query_embedding: &[f32],
        k: usize,
        project_ids: Option<&[Id]>,
        importance_threshold: Option<u8>,
        exclude_ids: Option<&[Id]>,
    ) -> Result<Vec<ScoredMemory>> {
        let query_embedding = query_embedding.to_vec();
        let project_ids = project_ids.map(<[Id]>::to_vec);
        let exclude_ids = exclude_ids.map(<[Id]>::to_vec);
        with_db_timeout(self.handle(), move |db| {
            memories::semantic_search(
                db,
                user_id,
                &query_embedding,
                k,
                project_ids.as_deref(),
                importance_threshold,
                exclude_ids.as_deref(),
            )
        })
        .await
    }

    async fn lexical_search(
        &self,
        user_id: UserId,
        query_text: &str,
        k: usize,
        project_ids: Option<&[Id]>,
        importance_threshold: Option<u8>,
        exclude_ids: Option<&[Id]>,
    ) -> Result<Vec<ScoredMemory>> {
        let query_text = query_text.to_string();
        let project_ids = project_ids.map(<[Id]>::to_vec);
        let exclude_ids = exclude_ids.map(<[Id]>::to_vec);
        with_db_timeout(self.handle(), move |db| {
            memories::lexical_search(
                db,
                user_id,
                &query_text,
                k,
                project_ids.as_deref(),
                importance_threshold,
                exclude_ids.as_deref(),
            )
        })
        .await
    }

    async fn find_similar_memories(
        &self,
        user_id: UserId,
        memory_id: Id,
        embedding: &[f32],
        k: usize,
    ) -> Result<Vec<ScoredMemory>> {
        let embedding = embedding.to_vec();
        with_db_timeout(self.handle(), move |db| {
            memories::find_similar_memories(db, user_id, memory_id, &embedding, k)
        })
        .await
    }

    async fn create_link(&self, user_id: UserId, source_id: Id, target_id: Id) -> Result<MemoryLink> {
        with_db_timeout(self.handle(), move |db| links::create_link(db, user_id, source_id, target_id)).await
    }

    async fn create_links_batch(&self, user_id: UserId, source_id: Id, target_ids: &[Id]) -> Result<Vec<MemoryLink>> {
        let target_ids = target_ids.to_vec();
        with_db_timeout(self.handle(), move |db| {
            links::create_links_batch(db, user_id, source_id, &target_ids)
        })
        .await
    }

    async fn get_linked_memories(
        &self,
        user_id: UserId,
        memory_ids: &[Id],
        max_links_per_primary: usize,
    ) -> Result<Vec<(Id, Memory)>> {
        let memory_ids = memory_ids.to_vec();
        with_db_timeout(self.handle(), move |db| {
            links::get_linked_memories(db, user_id, &memory_ids, max_links_per_primary)
        })
        .await
    }

    async fn create_project(&self, user_id: UserId, data: &ProjectCreate) -> Result<Project> {
        let data = data.clone();
        with_db_timeout(self.handle(), move |db| projects::create_project(db, user_id, &data)).await
    }

    async fn get_project(&self, user_id: UserId, id: Id) -> Result<Project> {
        with_db_timeout(self.handle(), move |db| projects::get_project(db, user_id, id)).await
    }

    async fn update_project(&self, user_id: UserId, id: Id, update: &ProjectUpdate) -> Result<Project> {
        let update = update.clone();
        with_db_timeout(self.handle(), move |db| projects::update_project(db, user_id, id, &update)).await
    }

    async fn delete_project(&self, user_id: UserId, id: Id) -> Result<()> {
        with_db_timeout(self.handle(), move |db| projects::delete_project(db, user_id, id)).await
    }

    async fn list_projects(&self, user_id: UserId, page: Page) -> Result<Vec<Project>> {
        with_db_timeout(self.handle(), move |db| projects::list_projects(db, user_id, page)).await
    }

    async fn create_document(&self, user_id: UserId, data: &DocumentCreate) -> Result<Document> {
        let data = data.clone();
        with_db_timeout(self.handle(), move |db| documents::create_document(db, user_id, &data)).await
    }

    async fn get_document(&self, user_id: UserId, id: Id) -> Result<Document> {
        with_db_timeout(self.handle(), move |db| documents::get_document(db, user_id, id)).await
    }

    async fn update_document(&self, user_id: UserId, id: Id, update: &DocumentUpdate) -> Result<Document> {
        let update = update.clone();
        with_db_timeout(self.handle(), move |db| documents::update_document(db, user_id, id, &update)).await
    }

    async fn delete_document(&self, user_id: UserId, id: Id) -> Result<()> {
        with_db_timeout(self.handle(), move |db| documents::delete_document(db, user_id, id)).await
    }

    async fn list_documents(&self, user_id: UserId, page: Page) -> Result<Vec<Document>> {
        with_db_timeout(self.handle(), move |db| documents::list_documents(db, user_id, page)).await
    }

    async fn create_code_artifact(&self, user_id: UserId, data: &CodeArtifactCreate) -> Result<CodeArtifact> {
        let data = data.clone();
        with_db_timeout(self.handle(), move |db| code_artifacts::create_code_artifact(db, user_id, &data)).await
    }

    async fn get_code_artifact(&self, user_id: UserId, id: Id) -> Result<CodeArtifact> {
        with_db_timeout(self.handle(), move |db| code_artifacts::get_code_artifact(db, user_id, id)).await
    }

    async fn update_code_artifact(
        &self,
        user_id: UserId,
        id: Id,
        update: &CodeArtifactUpdate,
    ) -> Result<CodeArtifact> {
        let update = update.clone();
        with_db_timeout(self.handle(), move |db| {
            code_artifacts::update_code_artifact(db, user_id, id, &update)
        })
        .await
    }

    async fn delete_code_artifact(&self, user_id: UserId, id: Id) -> Result<()> {
        with_db_timeout(self.handle(), move |db| code_artifacts::delete_code_artifact(db, user_id, id)).await
    }

    async fn list_code_artifacts(&self, user_id: UserId, page: Page) -> Result<Vec<CodeArtifact>> {
        with_db_timeout(self.handle(), move |db| code_artifacts::list_code_artifacts(db, user_id, page)).await
    }

    async fn create_entity(&self, user_id: UserId, data: &EntityCreate) -> Result<Entity> {
        let data = data.clone();
        with_db_timeout(self.handle(), move |db| entities::create_entity(db, user_id, &data)).await
    }

    async fn get_entity(&self, user_id: UserId, id: Id) -> Result<Entity> {
        with_db_timeout(self.handle(), move |db| entities::get_entity(db, user_id, id)).await
    }

    async fn update_entity(&self, user_id: UserId, id: Id, update: &EntityUpdate) -> Result<Entity> {
        let update = update.clone();
        with_db_timeout(self.handle(), move |db| entities::update_entity(db, user_id, id, &update)).await
    }

    async fn delete_entity(&self, user_id: UserId, id: Id) -> Result<()> {
        with_db_timeout(self.handle(), move |db| entities::delete_entity(db, user_id, id)).await
    }

    async fn list_entities(&self, user_id: UserId, page: Page) -> Result<Vec<Entity>> {
        with_db_timeout(self.handle(), move |db| entities::list_entities(db, user_id, page)).await
    }

    async fn create_entity_relationship(
        &self,
        user_id: UserId,
        data: &EntityRelationshipCreate,
    ) -> Result<EntityRelationship> {
        let data = data.clone();
        with_db_timeout(self.handle(), move |db| entities::create_entity_relationship(db, user_id, &data)).await
    }

    async fn delete_entity_relationship(&self, user_id: UserId, id: Id) -> Result<()> {
        with_db_timeout(self.handle(), move |db| entities::delete_entity_relationship(db, user_id, id)).await
    }

    async fn fetch_node(&self, user_id: UserId, node_type: &str, id: Id) -> Result<GraphNodeRow> {
        let node_type = node_type.to_string();
        with_db_timeout(self.handle(), move |db| graph::fetch_node(db, user_id, &node_type, id)).await
    }

    async fn fetch_edges_for_node(&self, user_id: UserId, node_type: &str, id: Id) -> Result<Vec<GraphEdgeRow>> {
        let node_type = node_type.to_string();
        with_db_timeout(self.handle(), move |db| graph::fetch_edges_for_node(db, user_id, &node_type, id)).await
    }

    async fn count_memories(&self, user_id: UserId) -> Result<usize> {
        with_db_timeout(self.handle(), move |db| memories::count_memories(db, user_id)).await
    }

    async fn page_memories_for_reembed(&self, user_id: UserId, after_id: Option<Id>, limit: usize) -> Result<Vec<Memory>> {
        with_db_timeout(self.handle(), move |db| {
            memories::page_memories_for_reembed(db, user_id, after_id, limit)
        })
        .await
    }

    async fn set_memory_embedding(&self, user_id: UserId, id: Id, embedding: Vec<f32>) -> Result<()> {
        with_db_timeout(self.handle(), move |db| memories::set_memory_embedding(db, user_id, id, embedding)).await
    }

    async fn reset_embedding_storage(&self, user_id: UserId) -> Result<()> {
        with_db_timeout(self.handle(), move |db| memories::reset_embedding_storage(db, user_id)).await
    }

    async fn bulk_update_embeddings(&self, user_id: UserId, updates: &[(Id, Vec<f32>)]) -> Result<()> {
        let updates = updates.to_vec();
        with_db_timeout(self.handle(), move |db| memories::bulk_update_embeddings(db, user_id, &updates)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forgetful_core::types::MemoryCreate;

    async fn open_temp() -> (RedbStorage, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let storage = RedbStorage::open(&dir.path().join("test.redb")).await.unwrap();
        (storage, dir)
    }

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
    async fn create_and_get_memory_round_trips() {
        let (storage, _dir) = open_temp().await;
        let user_id = uuid::Uuid::new_v4();
        let created = storage
            .create_memory(user_id, &sample_create("hello"), vec![1.0, 0.0])
            .await
            .unwrap();
        let fetched = storage.get_memory(user_id, created.id).await.unwrap();
        assert_eq!(fetched.title, "hello");
    }

    #[tokio::test]
    async fn get_memory_rejects_foreign_tenant() {
        let (storage, _dir) = open_temp().await;
        let owner = uuid::Uuid::new_v4();
        let stranger = uuid::Uuid::new_v4();
        let created = storage.create_memory(owner, &sample_create("secret"), vec![1.0]).await.unwrap();
        assert!(storage.get_memory(stranger, created.id).await.is_err());
    }

    #[tokio::test]
    async fn semantic_search_orders_by_similarity() {
        let (storage, _dir) = open_temp().await;
        let user_id = uuid::Uuid::new_v4();
        storage.create_memory(user_id, &sample_create("a"), vec![1.0, 0.0]).await.unwrap();
        storage.create_memory(user_id, &sample_create("b"), vec![0.0, 1.0]).await.unwrap();
        let results = storage.semantic_search(user_id, &[1.0, 0.0], 10, None, None, None).await.unwrap();
        assert_eq!(results[0].memory.title, "a");
    }

    #[tokio::test]
    async fn reset_and_bulk_update_embeddings_round_trip() {
        let (storage, _dir) = open_temp().await;
        let user_id = uuid::Uuid::new_v4();
        let m1 = storage.create_memory(user_id, &sample_create("a"), vec![1.0]).await.unwrap();
        let m2 = storage.create_memory(user_id, &sample_create("b"), vec![1.0]).await.unwrap();

        storage.reset_embedding_storage(user_id).await.unwrap();
        assert!(storage.get_memory(user_id, m1.id).await.unwrap().embedding.is_empty());

        storage
            .bulk_update_embeddings(user_id, &[(m1.id, vec![0.5]), (m2.id, vec![0.6])])
            .await
            .unwrap();
        assert_eq!(storage.get_memory(user_id, m1.id).await.unwrap().embedding, vec![0.5]);
        assert_eq!(storage.get_memory(user_id, m2.id).await.unwrap().embedding, vec![0.6]);
    }

    #[tokio::test]
    async fn delete_project_cascades_to_memories() {
        let (storage, _dir) = open_temp().await;
        let user_id = uuid::Uuid::new_v4();
        let project = storage
            .create_project(user_id, &forgetful_core::types::ProjectCreate {
                name: "proj".to_string(),
                description: None,
            })
            .await
            .unwrap();
        let mut create = sample_create("m");
        create.project_ids = vec![project.id];
        let memory = storage.create_memory(user_id, &create, vec![1.0]).await.unwrap();

        storage.delete_project(user_id, project.id).await.unwrap();

        let refreshed = storage.get_memory(user_id, memory.id).await.unwrap();
        assert!(refreshed.project_ids.is_empty());
    }

    #[tokio::test]
    async fn graph_fetch_node_and_edges_reflect_links() {
        let (storage, _dir) = open_temp().await;
        let user_id = uuid::Uuid::new_v4();
        let a = storage.create_memory(user_id, &sample_create("a"), vec![1.0]).await.unwrap();
        let b = storage.create_memory(user_id, &sample_create("b"), vec![1.0]).await.unwrap();
        storage.create_link(user_id, a.id, b.id).await.unwrap();

        let node = storage.fetch_node(user_id, "memory", a.id).await.unwrap();
        assert_eq!(node.label, "a");

        let edges = storage.fetch_edges_for_node(user_id, "memory", a.id).await.unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].edge_type, "memory_link");
    }
}
