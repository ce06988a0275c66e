//! `forgetful project ...`

use crate::context::ServiceContext;
use clap::Subcommand;
use forgetful_core::tools::ToolExecutor;
use serde_json::{json, Value};

#[derive(Subcommand)]
pub enum ProjectCommands {
    /// Create a project memories/documents/artifacts can be scoped to.
    Create {
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// List projects, oldest first.
    List {
        #[arg(long, default_value_t = 0)]
        offset: usize,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

pub async fn run(ctx: &ServiceContext, command: ProjectCommands) -> anyhow::Result<Value> {
    let executor = ctx.executor();
    let value = match command {
        ProjectCommands::Create { name, description } => {
            let args = json!({ "name": name, "description": description });
            executor.execute(ctx.user_id, "create_project", args).await?
        }
        ProjectCommands::List { offset, limit } => {
            let args = json!({ "offset": offset, "limit": limit });
            executor.execute(ctx.user_id, "list_projects", args).await?
        }
    };
    Ok(value)
}
