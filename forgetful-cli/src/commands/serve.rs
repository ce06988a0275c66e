//! `forgetful serve ...` — long-running server commands. Unlike every
//! other subcommand these don't print one JSON/YAML/human result; they run
//! until interrupted.

use crate::context::ServiceContext;
use clap::Subcommand;
use forgetful_http::{AppState, FixedUser};
use std::sync::Arc;

#[derive(Subcommand)]
pub enum ServeCommands {
    /// Run the HTTP REST surface, bound to a fixed local user (no bearer
    /// token validation — see `forgetful-http::ResolveUser` for a real
    /// deployment's auth seam).
    Http {
        #[arg(long, default_value = "127.0.0.1:8080")]
        addr: String,
    },
}

pub async fn run(ctx: ServiceContext, command: ServeCommands) -> anyhow::Result<()> {
    match command {
        ServeCommands::Http { addr } => {
            let state = AppState {
                storage: ctx.storage,
                pipeline: ctx.pipeline,
                linker: ctx.linker,
                graph: ctx.graph,
                embeddings: ctx.embeddings,
                config: ctx.config,
                activity: ctx.activity,
                resolve_user: Arc::new(FixedUser(ctx.user_id)),
            };
            let router = forgetful_http::build_router(state);
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!(%addr, "forgetful HTTP surface listening");
            axum::serve(listener, router).await?;
            Ok(())
        }
    }
}
