//! Wires a [`Config`] into live services, the same way every binary in
//! this workspace does (see `forgetful-mcp/src/bin/server.rs`).

use forgetful_core::activity::ActivityBus;
use forgetful_core::backup::BackupService;
use forgetful_core::config::Config;
use forgetful_core::embeddings::{DeterministicEmbeddingAdapter, EmbeddingAdapter};
use forgetful_core::graph::GraphTraversal;
use forgetful_core::linking::AutoLinker;
use forgetful_core::retrieval::{PipelineOptions, RetrievalPipeline};
use forgetful_core::storage::StorageBackend;
use forgetful_core::token_counter::TokenCounter;
use forgetful_core::types::UserId;
use std::path::Path;
use std::sync::Arc;

/// Everything a CLI command needs to run against one storage backend.
pub struct ServiceContext {
    pub storage: Arc<dyn StorageBackend>,
    pub backup: Arc<dyn BackupService>,
    pub embeddings: Arc<dyn EmbeddingAdapter>,
    pub pipeline: Arc<RetrievalPipeline>,
    pub linker: Arc<AutoLinker>,
    pub graph: Arc<GraphTraversal>,
    pub config: Arc<Config>,
    pub activity: ActivityBus,
    pub user_id: UserId,
}

impl ServiceContext {
    /// Build the same [`forgetful_mcp::ServiceExecutor`] the stdio MCP
    /// server uses, so every CLI subcommand that mutates or queries
    /// memories goes through one implementation of each operation instead
    /// of a second copy of the same logic.
    #[must_use]
    pub fn executor(&self) -> forgetful_mcp::ServiceExecutor {
        forgetful_mcp::ServiceExecutor {
            storage: self.storage.clone(),
            embeddings: self.embeddings.clone(),
            pipeline: self.pipeline.clone(),
            linker: self.linker.clone(),
            graph: self.graph.clone(),
            config: self.config.clone(),
            activity: self.activity.clone(),
        }
    }

    /// Build a context from `config`, opening whichever storage backend it
    /// names.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend can't be opened.
    pub async fn build(config: Config, user_id: UserId) -> anyhow::Result<Self> {
        let config = Arc::new(config);
        let (storage, backup) = build_storage(&config).await?;
        let embeddings: Arc<dyn EmbeddingAdapter> =
            Arc::new(DeterministicEmbeddingAdapter::new(config.embeddings.dimensions));
        let token_counter = Arc::new(TokenCounter::default());
        let pipeline = Arc::new(RetrievalPipeline::new(
            storage.clone(),
            embeddings.clone(),
            None,
            token_counter,
            PipelineOptions::default(),
        ));
        let linker = Arc::new(AutoLinker::new(storage.clone()));
        let graph = Arc::new(GraphTraversal::new(storage.clone()));
        let activity = ActivityBus::new(1024);

        Ok(Self {
            storage,
            backup,
            embeddings,
            pipeline,
            linker,
            graph,
            config,
            activity,
            user_id,
        })
    }
}

type Opened = (Arc<dyn StorageBackend>, Arc<dyn BackupService>);

async fn build_storage(config: &Config) -> anyhow::Result<Opened> {
    match config.storage.backend.as_str() {
        "turso" => {
            let url = config.storage.turso_url.as_deref().unwrap_or_default();
            let storage = if let Some(token) = config.storage.turso_token.as_deref() {
                forgetful_storage_turso::TursoStorage::open_remote(url, token, config.embeddings.dimensions).await?
            } else {
                forgetful_storage_turso::TursoStorage::open_local(url, config.embeddings.dimensions).await?
            };
            let storage = Arc::new(storage);
            Ok((storage.clone(), storage))
        }
        _ => {
            let path = config.storage.redb_path.as_deref().unwrap_or("./forgetful.redb");
            let storage = forgetful_storage_redb::RedbStorage::open(Path::new(path)).await?;
            let storage = Arc::new(storage);
            Ok((storage.clone(), storage))
        }
    }
}

/// Resolve which user a local CLI invocation acts on behalf of. There is
/// no login flow (spec's user auto-provisioning policy is out of scope);
/// `FORGETFUL_USER_ID` picks a stable identity, defaulting to the nil UUID
/// for a brand-new local instance.
#[must_use]
pub fn resolve_local_user() -> UserId {
    std::env::var("FORGETFUL_USER_ID")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(UserId::nil())
}
