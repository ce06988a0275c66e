//! `forgetful code-artifact ...`

use crate::context::ServiceContext;
use clap::Subcommand;
use forgetful_core::storage::pagination::Page;
use forgetful_core::storage::StorageBackend;
use forgetful_core::tools::ToolExecutor;
use serde_json::{json, Value};

#[derive(Subcommand)]
pub enum CodeArtifactCommands {
    /// Store a source fragment worth recalling verbatim.
    Create {
        name: String,
        content: String,
        #[arg(long)]
        language: Option<String>,
        #[arg(long)]
        file_path: Option<String>,
        #[arg(long = "project", value_delimiter = ',')]
        project_ids: Vec<i64>,
    },
    /// List code artifacts, oldest first.
    List {
        #[arg(long, default_value_t = 0)]
        offset: usize,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

pub async fn run(ctx: &ServiceContext, command: CodeArtifactCommands) -> anyhow::Result<Value> {
    let value = match command {
        CodeArtifactCommands::Create { name, content, language, file_path, project_ids } => {
            let args = json!({
                "name": name,
                "content": content,
                "language": language,
                "file_path": file_path,
                "project_ids": project_ids,
            });
            ctx.executor().execute(ctx.user_id, "create_code_artifact", args).await?
        }
        CodeArtifactCommands::List { offset, limit } => {
            let artifacts = ctx.storage.list_code_artifacts(ctx.user_id, Page::new(offset, limit)).await?;
            serde_json::to_value(artifacts)?
        }
    };
    Ok(value)
}
