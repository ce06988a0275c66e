#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::module_name_repetitions)]

//! # Forgetful Core
//!
//! Domain engine for a per-user atomic memory store: semantic retrieval,
//! auto-linking, a token-budgeted query composer, graph traversal over
//! memories/entities/projects/documents/code artifacts, and scoped
//! meta-tool dispatch for MCP clients.
//!
//! ## Module Organization
//!
//! ### Primary APIs
//! - [`retrieval`]: the `query_memory` pipeline (dense search, optional
//!   lexical fusion, optional rerank, linked-memory expansion)
//! - [`compose`]: token-budget-aware truncation of retrieval results
//! - [`linking`]: auto-linking new memories to their nearest neighbors
//! - [`graph`]: BFS subgraph traversal
//! - [`tools`]: the three-tool MCP surface and its scope resolution
//!
//! ### Support modules
//! - [`types`]: the data model
//! - [`storage`]: the [`storage::StorageBackend`] trait implemented by the
//!   embedded and server-class storage crates
//! - [`embeddings`]: pluggable embedding generation
//! - [`reranker`]: optional cross-encoder reranking
//! - [`token_counter`]: `tiktoken`-based context budgeting
//! - [`reembed`]: batch re-embedding after a provider/dimension change
//! - [`backup`]: backup/restore contract
//! - [`activity`]: fire-and-forget mutation/read event bus
//! - [`config`]: layered TOML + environment configuration
//! - [`error`]: the crate's error type
//!
//! ## Quick Start
//!
//! ```no_run
//! use forgetful_core::config::Config;
//! use forgetful_core::embeddings::DeterministicEmbeddingAdapter;
//! use forgetful_core::linking::AutoLinker;
//! use forgetful_core::storage::StorageBackend;
//! use std::sync::Arc;
//!
//! # async fn run(storage: Arc<dyn StorageBackend>) -> forgetful_core::error::Result<()> {
//! let config = Config::load(None)?;
//! let embeddings = Arc::new(DeterministicEmbeddingAdapter::new(config.embeddings.dimensions));
//! let linker = AutoLinker::new(storage.clone());
//!
//! let user_id = uuid::Uuid::new_v4();
//! let data = forgetful_core::types::MemoryCreate {
//!     title: "TTS engine preference: XTTS-v2".to_string(),
//!     content: "Chosen for multilingual support and voice cloning.".to_string(),
//!     context: "Evaluating TTS options for the voice assistant project".to_string(),
//!     keywords: vec!["tts".to_string(), "xtts".to_string()],
//!     tags: vec!["preference".to_string()],
//!     importance: 8,
//!     project_ids: vec![],
//!     code_artifact_ids: vec![],
//!     document_ids: vec![],
//!     entity_ids: vec![],
//! };
//!
//! let text = forgetful_core::types::memory::build_embedding_text(
//!     &data.title, &data.content, &data.context, &data.keywords, &data.tags,
//! );
//! use forgetful_core::embeddings::EmbeddingAdapter;
//! let embedding = embeddings.embed(&text).await?;
//! let memory = storage.create_memory(user_id, &data, embedding.clone()).await?;
//! linker.auto_link(user_id, memory.id, &embedding, config.memory.num_auto_link).await;
//! # Ok(())
//! # }
//! ```

pub mod activity;
pub mod backup;
pub mod compose;
pub mod config;
pub mod constants;
pub mod embeddings;
pub mod error;
pub mod graph;
pub mod linking;
pub mod reembed;
pub mod reranker;
pub mod retrieval;
pub mod storage;
pub mod token_counter;
pub mod tools;
pub mod types;

pub use error::{Error, Result};
