//! # Forgetful Storage - Turso/libSQL
//!
//! Server-class storage backend for multi-tenant deployments: a libSQL
//! (Turso-compatible) database, ANN vector search via `vector_top_k`, and
//! true junction tables for the M:N associations the embedded backend
//! inlines as `Vec<Id>` fields.
//!
//! ## Example
//!
//! ```no_run
//! use forgetful_storage_turso::TursoStorage;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let storage = TursoStorage::open_local("./forgetful.db", 1536).await?;
//! # Ok(())
//! # }
//! ```

mod backup;
mod code_artifacts;
mod documents;
mod entities;
mod graph;
mod links;
mod memories;
mod pool;
mod projects;
mod schema;
mod util;

pub use pool::{ConnectionPool, PoolConfig, PoolStatistics, PooledConnection};

use async_trait::async_trait;
use forgetful_core::error::{Error, Result};
use forgetful_core::storage::pagination::Page;
use forgetful_core::storage::{GraphEdgeRow, GraphNodeRow, ScoredMemory, StorageBackend};
use forgetful_core::types::{
    CodeArtifact, CodeArtifactCreate, CodeArtifactUpdate, Document, DocumentCreate, DocumentUpdate,
    Entity, EntityCreate, EntityRelationship, EntityRelationshipCreate, EntityUpdate, Id, Memory,
    MemoryCreate, MemoryLink, MemoryUpdate, Project, ProjectCreate, ProjectUpdate, UserId,
};
use libsql::{Builder, Connection, Database};
use std::sync::Arc;
use tracing::info;
use util::internal;

/// Where a [`TursoStorage`] connected to, for [`BackupService`](forgetful_core::backup::BackupService).
#[derive(Debug, Clone)]
enum Source {
    Local(String),
    Remote(String),
}

/// libSQL/Turso-backed [`StorageBackend`] implementation.
pub struct TursoStorage {
    pool: ConnectionPool,
    dimensions: usize,
    source: Source,
}

fn conn_ref(guard: &PooledConnection) -> Result<&Connection> {
    guard.connection().ok_or_else(|| Error::Internal("connection checked out twice".to_string()))
}

impl TursoStorage {
    /// Open a local libSQL file, running the schema DDL for `dimensions`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Internal`] if the file can't be opened or the
    /// schema can't be created.
    pub async fn open_local(path: &str, dimensions: usize) -> Result<Self> {
        info!(path, dimensions, "opening local libsql database");
        let db = Builder::new_local(path).build().await.map_err(internal)?;
        Self::from_database(db, dimensions, Source::Local(path.to_string())).await
    }

    /// Open a remote Turso database over libSQL's `http`/`https` replica
    /// protocol, authenticating with `auth_token`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Internal`] if the connection or schema init fails.
    pub async fn open_remote(url: &str, auth_token: &str, dimensions: usize) -> Result<Self> {
        info!(url, dimensions, "opening remote turso database");
        let db = Builder::new_remote(url.to_string(), auth_token.to_string())
            .build()
            .await
            .map_err(internal)?;
        Self::from_database(db, dimensions, Source::Remote(url.to_string())).await
    }

    async fn from_database(db: Database, dimensions: usize, source: Source) -> Result<Self> {
        let conn = db.connect().map_err(internal)?;
        for statement in schema::ddl_statements(dimensions) {
            conn.execute(&statement, ()).await.map_err(internal)?;
        }
        let pool = ConnectionPool::new(Arc::new(db), PoolConfig::default()).await?;
        Ok(Self { pool, dimensions, source })
    }

    async fn conn(&self) -> Result<PooledConnection> {
        self.pool.get().await
    }

    /// Current pool utilization, exposed for health/metrics endpoints.
    pub async fn pool_statistics(&self) -> PoolStatistics {
        self.pool.statistics().await
    }
}

#[async_trait]
impl StorageBackend for TursoStorage {
    async fn create_memory(&self, user_id: UserId, data: &MemoryCreate, embedding: Vec<f32>) -> Result<Memory> {
        let guard = self.conn().await?;
        memories::create_memory(conn_ref(&guard)?, self.dimensions, user_id, data, embedding).await
    }

    async fn get_memory(&self, user_id: UserId, id: Id) -> Result<Memory> {
        let guard = self.conn().await?;
        memories::get_memory(conn_ref(&guard)?, user_id, id).await
    }

    async fn update_memory(
        &self,
        user_id: UserId,
        id: Id,
        update: &MemoryUpdate,
        new_embedding: Option<Vec<f32>>,
    ) -> Result<Memory> {
        let guard = self.conn().await?;
        memories::update_memory(conn_ref(&guard)?, self.dimensions, user_id, id, update, new_embedding).await
    }

    async fn mark_memory_obsolete(
        &self,
        user_id: UserId,
        id: Id,
        reason: Option<String>,
        superseded_by: Option<Id>,
    ) -> Result<Memory> {
        let guard = self.conn().await?;
        memories::mark_memory_obsolete(conn_ref(&guard)?, user_id, id, reason, superseded_by).await
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
        let guard = self.conn().await?;
        memories::semantic_search(
            conn_ref(&guard)?,
            self.dimensions,
            user_id,
            query_embedding,
            k,
            project_ids,
            importance_threshold,
            exclude_ids,
        )
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
        let guard = self.conn().await?;
        memories::lexical_search(conn_ref(&guard)?, user_id, query_text, k, project_ids, importance_threshold, exclude_ids).await
    }

    async fn find_similar_memories(
        &self,
        user_id: UserId,
        memory_id: Id,
        embedding: &[f32],
        k: usize,
    ) -> Result<Vec<ScoredMemory>> {
        let guard = self.conn().await?;
        memories::find_similar_memories(conn_ref(&guard)?, self.dimensions, user_id, memory_id, embedding, k).await
    }

    async fn create_link(&self, user_id: UserId, source_id: Id, target_id: Id) -> Result<MemoryLink> {
        let guard = self.conn().await?;
        links::create_link(conn_ref(&guard)?, user_id, source_id, target_id).await
    }

    async fn create_links_batch(&self, user_id: UserId, source_id: Id, target_ids: &[Id]) -> Result<Vec<MemoryLink>> {
        let guard = self.conn().await?;
        links::create_links_batch(conn_ref(&guard)?, user_id, source_id, target_ids).await
    }

    async fn get_linked_memories(
        &self,
        user_id: UserId,
        memory_ids: &[Id],
        max_links_per_primary: usize,
    ) -> Result<Vec<(Id, Memory)>> {
        let guard = self.conn().await?;
        links::get_linked_memories(conn_ref(&guard)?, user_id, memory_ids, max_links_per_primary).await
    }

    async fn create_project(&self, user_id: UserId, data: &ProjectCreate) -> Result<Project> {
        let guard = self.conn().await?;
        projects::create_project(conn_ref(&guard)?, user_id, data).await
    }

    async fn get_project(&self, user_id: UserId, id: Id) -> Result<Project> {
        let guard = self.conn().await?;
        projects::get_project(conn_ref(&guard)?, user_id, id).await
    }

    async fn update_project(&self, user_id: UserId, id: Id, update: &ProjectUpdate) -> Result<Project> {
        let guard = self.conn().await?;
        projects::update_project(conn_ref(&guard)?, user_id, id, update).await
    }

    async fn delete_project(&self, user_id: UserId, id: Id) -> Result<()> {
        let guard = self.conn().await?;
        projects::delete_project(conn_ref(&guard)?, user_id, id).await
    }

    async fn list_projects(&self, user_id: UserId, page: Page) -> Result<Vec<Project>> {
        let guard = self.conn().await?;
        projects::list_projects(conn_ref(&guard)?, user_id, page).await
    }

    async fn create_document(&self, user_id: UserId, data: &DocumentCreate) -> Result<Document> {
        let guard = self.conn().await?;
        documents::create_document(conn_ref(&guard)?, user_id, data).await
    }

    async fn get_document(&self, user_id: UserId, id: Id) -> Result<Document> {
        let guard = self.conn().await?;
        documents::get_document(conn_ref(&guard)?, user_id, id).await
    }

    async fn update_document(&self, user_id: UserId, id: Id, update: &DocumentUpdate) -> Result<Document> {
        let guard = self.conn().await?;
        documents::update_document(conn_ref(&guard)?, user_id, id, update).await
    }

    async fn delete_document(&self, user_id: UserId, id: Id) -> Result<()> {
        let guard = self.conn().await?;
        documents::delete_document(conn_ref(&guard)?, user_id, id).await
    }

    async fn list_documents(&self, user_id: UserId, page: Page) -> Result<Vec<Document>> {
        let guard = self.conn().await?;
        documents::list_documents(conn_ref(&guard)?, user_id, page).await
    }

    async fn create_code_artifact(&self, user_id: UserId, data: &CodeArtifactCreate) -> Result<CodeArtifact> {
        let guard = self.conn().await?;
        code_artifacts::create_code_artifact(conn_ref(&guard)?, user_id, data).await
    }

    async fn get_code_artifact(&self, user_id: UserId, id: Id) -> Result<CodeArtifact> {
        let guard = self.conn().await?;
        code_artifacts::get_code_artifact(conn_ref(&guard)?, user_id, id).await
    }

    async fn update_code_artifact(&self, user_id: UserId, id: Id, update: &CodeArtifactUpdate) -> Result<CodeArtifact> {
        let guard = self.conn().await?;
        code_artifacts::update_code_artifact(conn_ref(&guard)?, user_id, id, update).await
    }

    async fn delete_code_artifact(&self, user_id: UserId, id: Id) -> Result<()> {
        let guard = self.conn().await?;
        code_artifacts::delete_code_artifact(conn_ref(&guard)?, user_id, id).await
    }

    async fn list_code_artifacts(&self, user_id: UserId, page: Page) -> Result<Vec<CodeArtifact>> {
        let guard = self.conn().await?;
        code_artifacts::list_code_artifacts(conn_ref(&guard)?, user_id, page).await
    }

    async fn create_entity(&self, user_id: UserId, data: &EntityCreate) -> Result<Entity> {
        let guard = self.conn().await?;
        entities::create_entity(conn_ref(&guard)?, user_id, data).await
    }

    async fn get_entity(&self, user_id: UserId, id: Id) -> Result<Entity> {
        let guard = self.conn().await?;
        entities::get_entity(conn_ref(&guard)?, user_id, id).await
    }

    async fn update_entity(&self, user_id: UserId, id: Id, update: &EntityUpdate) -> Result<Entity> {
        let guard = self.conn().await?;
        entities::update_entity(conn_ref(&guard)?, user_id, id, update).await
    }

    async fn delete_entity(&self, user_id: UserId, id: Id) -> Result<()> {
        let guard = self.conn().await?;
        let conn = conn_ref(&guard)?;
        entities::delete_entity(conn, user_id, id).await
    }

    async fn list_entities(&self, user_id: UserId, page: Page) -> Result<Vec<Entity>> {
        let guard = self.conn().await?;
        entities::list_entities(conn_ref(&guard)?, user_id, page).await
    }

    async fn create_entity_relationship(&self, user_id: UserId, data: &EntityRelationshipCreate) -> Result<EntityRelationship> {
        let guard = self.conn().await?;
        entities::create_entity_relationship(conn_ref(&guard)?, user_id, data).await
    }

    async fn delete_entity_relationship(&self, user_id: UserId, id: Id) -> Result<()> {
        let guard = self.conn().await?;
        entities::delete_entity_relationship(conn_ref(&guard)?, user_id, id).await
    }

    async fn fetch_node(&self, user_id: UserId, node_type: &str, id: Id) -> Result<GraphNodeRow> {
        let guard = self.conn().await?;
        graph::fetch_node(conn_ref(&guard)?, user_id, node_type, id).await
    }

    async fn fetch_edges_for_node(&self, user_id: UserId, node_type: &str, id: Id) -> Result<Vec<GraphEdgeRow>> {
        let guard = self.conn().await?;
        graph::fetch_edges_for_node(conn_ref(&guard)?, user_id, node_type, id).await
    }

    async fn count_memories(&self, user_id: UserId) -> Result<usize> {
        let guard = self.conn().await?;
        memories::count_memories(conn_ref(&guard)?, user_id).await
    }

    async fn page_memories_for_reembed(&self, user_id: UserId, after_id: Option<Id>, limit: usize) -> Result<Vec<Memory>> {
        let guard = self.conn().await?;
        memories::page_memories_for_reembed(conn_ref(&guard)?, user_id, after_id, limit).await
    }

    async fn set_memory_embedding(&self, user_id: UserId, id: Id, embedding: Vec<f32>) -> Result<()> {
        let guard = self.conn().await?;
        memories::set_memory_embedding(conn_ref(&guard)?, self.dimensions, user_id, id, embedding).await
    }

    async fn reset_embedding_storage(&self, user_id: UserId) -> Result<()> {
        let guard = self.conn().await?;
        memories::reset_embedding_storage(conn_ref(&guard)?, user_id).await
    }

    async fn bulk_update_embeddings(&self, user_id: UserId, updates: &[(Id, Vec<f32>)]) -> Result<()> {
        let guard = self.conn().await?;
        memories::bulk_update_embeddings(conn_ref(&guard)?, self.dimensions, user_id, updates).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forgetful_core::types::MemoryCreate;
    use tempfile::TempDir;

    async fn open_temp() -> (TursoStorage, TempDir) {
        let dir = TempDir::new().unwrap_or_else(|e| panic!("tempdir: {e}"));
        let storage = TursoStorage::open_local(dir.path().join("test.db").to_str().unwrap_or_default(), 2)
            .await
            .unwrap_or_else(|e| panic!("open: {e}"));
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
            .unwrap_or_else(|e| panic!("create: {e}"));
        let fetched = storage.get_memory(user_id, created.id).await.unwrap_or_else(|e| panic!("get: {e}"));
        assert_eq!(fetched.title, "hello");
    }

    #[tokio::test]
    async fn get_memory_rejects_foreign_tenant() {
        let (storage, _dir) = open_temp().await;
        let owner = uuid::Uuid::new_v4();
        let stranger = uuid::Uuid::new_v4();
        let created = storage
            .create_memory(owner, &sample_create("secret"), vec![1.0, 0.0])
            .await
            .unwrap_or_else(|e| panic!("create: {e}"));
        assert!(storage.get_memory(stranger, created.id).await.is_err());
    }

    #[tokio::test]
    async fn semantic_search_orders_by_similarity() {
        let (storage, _dir) = open_temp().await;
        let user_id = uuid::Uuid::new_v4();
        storage
            .create_memory(user_id, &sample_create("a"), vec![1.0, 0.0])
            .await
            .unwrap_or_else(|e| panic!("create a: {e}"));
        storage
            .create_memory(user_id, &sample_create("b"), vec![0.0, 1.0])
            .await
            .unwrap_or_else(|e| panic!("create b: {e}"));
        let results = storage
            .semantic_search(user_id, &[1.0, 0.0], 10, None, None, None)
            .await
            .unwrap_or_else(|e| panic!("search: {e}"));
        assert_eq!(results[0].memory.title, "a");
    }

    #[tokio::test]
    async fn delete_project_cascades_to_memories() {
        let (storage, _dir) = open_temp().await;
        let user_id = uuid::Uuid::new_v4();
        let project = storage
            .create_project(
                user_id,
                &ProjectCreate {
                    name: "proj".to_string(),
                    description: None,
                },
            )
            .await
            .unwrap_or_else(|e| panic!("create project: {e}"));
        let mut create = sample_create("m");
        create.project_ids = vec![project.id];
        let memory = storage
            .create_memory(user_id, &create, vec![1.0, 0.0])
            .await
            .unwrap_or_else(|e| panic!("create memory: {e}"));

        storage.delete_project(user_id, project.id).await.unwrap_or_else(|e| panic!("delete: {e}"));

        let refreshed = storage.get_memory(user_id, memory.id).await.unwrap_or_else(|e| panic!("get: {e}"));
        assert!(refreshed.project_ids.is_empty());
    }

    #[tokio::test]
    async fn graph_fetch_node_and_edges_reflect_links() {
        let (storage, _dir) = open_temp().await;
        let user_id = uuid::Uuid::new_v4();
        let a = storage
            .create_memory(user_id, &sample_create("a"), vec![1.0, 0.0])
            .await
            .unwrap_or_else(|e| panic!("create a: {e}"));
        let b = storage
            .create_memory(user_id, &sample_create("b"), vec![1.0, 0.0])
            .await
            .unwrap_or_else(|e| panic!("create b: {e}"));
        storage.create_link(user_id, a.id, b.id).await.unwrap_or_else(|e| panic!("link: {e}"));

        let node = storage.fetch_node(user_id, "memory", a.id).await.unwrap_or_else(|e| panic!("fetch_node: {e}"));
        assert_eq!(node.label, "a");

        let edges = storage
            .fetch_edges_for_node(user_id, "memory", a.id)
            .await
            .unwrap_or_else(|e| panic!("edges: {e}"));
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].edge_type, "memory_link");
    }
}
