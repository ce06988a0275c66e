//! `forgetful entity ...`

use crate::context::ServiceContext;
use clap::Subcommand;
use forgetful_core::tools::ToolExecutor;
use serde_json::{json, Value};

#[derive(Subcommand)]
pub enum EntityCommands {
    /// Create a named entity memories can reference.
    Create {
        name: String,
        /// organization, individual, team, device, or other
        #[arg(long, default_value = "other")]
        entity_type: String,
        #[arg(long)]
        custom_type: Option<String>,
        #[arg(long, value_delimiter = ',')]
        aka: Vec<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// List entities, oldest first.
    List {
        #[arg(long, default_value_t = 0)]
        offset: usize,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

pub async fn run(ctx: &ServiceContext, command: EntityCommands) -> anyhow::Result<Value> {
    let executor = ctx.executor();
    let value = match command {
        EntityCommands::Create { name, entity_type, custom_type, aka, description } => {
            let args = json!({
                "name": name,
                "entity_type": entity_type,
                "custom_type": custom_type,
                "aka": aka,
                "description": description,
            });
            executor.execute(ctx.user_id, "create_entity", args).await?
        }
        EntityCommands::List { offset, limit } => {
            let args = json!({ "offset": offset, "limit": limit });
            executor.execute(ctx.user_id, "list_entities", args).await?
        }
    };
    Ok(value)
}
