//! `forgetful reembed ...`

use crate::context::ServiceContext;
use clap::Subcommand;
use forgetful_core::reembed::ReEmbeddingService;
use serde_json::{json, Value};

#[derive(Subcommand)]
pub enum ReembedCommands {
    /// Recompute every memory's embedding (after swapping embedding
    /// providers or dimensions) and validate the result.
    Run {
        #[arg(long, default_value_t = 20)]
        batch_size: usize,
    },
}

pub async fn run(ctx: &ServiceContext, command: ReembedCommands) -> anyhow::Result<Value> {
    let value = match command {
        ReembedCommands::Run { batch_size } => {
            let service = ReEmbeddingService::new(ctx.storage.clone(), ctx.embeddings.clone(), batch_size);
            let result = service
                .re_embed_all(ctx.user_id, |processed, total| {
                    tracing::info!(processed, total, "re-embed progress");
                })
                .await?;
            json!({
                "total_processed": result.total_processed,
                "total_memories": result.total_memories,
                "validation": {
                    "count_ok": result.validation.count_ok,
                    "dimensions_ok": result.validation.dimensions_ok,
                    "search_ok": result.validation.search_ok,
                    "all_passed": result.validation.all_passed(),
                },
            })
        }
    };
    Ok(value)
}
