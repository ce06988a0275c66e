//! HTTP surface for the Forgetful atomic memory store (spec §6).
//!
//! A thin axum layer over `forgetful-core`: every handler validates its
//! input, delegates to core (`RetrievalPipeline`, `AutoLinker`,
//! `GraphTraversal`, `StorageBackend`), and maps the result back to JSON.
//! No domain logic lives in this crate.

mod auth;
mod error;
mod params;
mod routes;
mod state;

pub use auth::AuthenticatedUser;
pub use error::ApiError;
pub use state::{AppState, FixedUser, ResolveUser};

use axum::Router;
use tower_http::trace::TraceLayer;

/// Build the full router for the given application state.
#[must_use]
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::memories::router())
        .merge(routes::graph::router())
        .merge(routes::collections::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
