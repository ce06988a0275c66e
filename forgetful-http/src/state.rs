//! Shared application state and the user-resolution seam.

use async_trait::async_trait;
use forgetful_core::activity::ActivityBus;
use forgetful_core::config::Config;
use forgetful_core::embeddings::EmbeddingAdapter;
use forgetful_core::error::Result;
use forgetful_core::graph::GraphTraversal;
use forgetful_core::linking::AutoLinker;
use forgetful_core::retrieval::RetrievalPipeline;
use forgetful_core::storage::StorageBackend;
use forgetful_core::types::UserId;
use std::sync::Arc;

/// Resolves an `Authorization: Bearer <token>` value to a [`UserId`].
///
/// This crate does not interpret tokens itself (spec §6): a deployment
/// supplies whatever validation it needs (a JWT issuer check, an opaque
/// token lookup, or — for local/single-user setups — a fixed mapping).
#[async_trait]
pub trait ResolveUser: Send + Sync {
    /// Resolve a bearer token into the user it authenticates.
    ///
    /// # Errors
    ///
    /// Returns [`forgetful_core::error::Error::PermissionDenied`] for an
    /// unrecognized or expired token.
    async fn resolve(&self, bearer_token: &str) -> Result<UserId>;
}

/// A [`ResolveUser`] for single-tenant deployments: every bearer token
/// (including an absent/empty one) resolves to one fixed user id.
pub struct FixedUser(pub UserId);

#[async_trait]
impl ResolveUser for FixedUser {
    async fn resolve(&self, _bearer_token: &str) -> Result<UserId> {
        Ok(self.0)
    }
}

/// Everything a request handler needs, shared across the router.
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn StorageBackend>,
    pub pipeline: Arc<RetrievalPipeline>,
    pub linker: Arc<AutoLinker>,
    pub graph: Arc<GraphTraversal>,
    pub embeddings: Arc<dyn EmbeddingAdapter>,
    pub config: Arc<Config>,
    pub activity: ActivityBus,
    pub resolve_user: Arc<dyn ResolveUser>,
}
