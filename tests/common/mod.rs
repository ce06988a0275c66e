//! Shared end-to-end fixture: a [`ServiceExecutor`] wired to a real
//! [`RedbStorage`] over a temp directory, the same wiring `forgetful-cli`
//! and the MCP server binary do in production.

#![allow(dead_code)]

use forgetful_core::activity::ActivityBus;
use forgetful_core::config::Config;
use forgetful_core::embeddings::{DeterministicEmbeddingAdapter, EmbeddingAdapter};
use forgetful_core::graph::GraphTraversal;
use forgetful_core::linking::AutoLinker;
use forgetful_core::retrieval::{PipelineOptions, RetrievalPipeline};
use forgetful_core::storage::StorageBackend;
use forgetful_core::token_counter::TokenCounter;
use forgetful_core::types::UserId;
use forgetful_mcp::ServiceExecutor;
use std::sync::Arc;
use tempfile::TempDir;

pub struct Fixture {
    pub executor: ServiceExecutor,
    pub storage: Arc<dyn StorageBackend>,
    pub graph: Arc<GraphTraversal>,
    pub linker: Arc<AutoLinker>,
    pub user: UserId,
    _dir: TempDir,
}

pub async fn build() -> Fixture {
    build_with_config(Config::default()).await
}

/// Same wiring as [`build`], with a caller-supplied config. Tests that
/// need to isolate auto-linking (it otherwise fires on every
/// `create_memory` call) pass a config with `memory.num_auto_link = 0`.
pub async fn build_with_config(config: Config) -> Fixture {
    let (storage, dir) = test_utils::temp_storage().await;
    let embeddings: Arc<dyn EmbeddingAdapter> = Arc::new(DeterministicEmbeddingAdapter::default());
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
    let config = Arc::new(config);
    let activity = ActivityBus::new(64);

    let executor = ServiceExecutor {
        storage: storage.clone(),
        embeddings,
        pipeline,
        linker: linker.clone(),
        graph: graph.clone(),
        config,
        activity,
    };

    Fixture {
        executor,
        storage,
        graph,
        linker,
        user: test_utils::test_user(),
        _dir: dir,
    }
}
