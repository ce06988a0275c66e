//! `forgetful document ...`

use crate::context::ServiceContext;
use clap::Subcommand;
use forgetful_core::storage::pagination::Page;
use forgetful_core::storage::StorageBackend;
use forgetful_core::tools::ToolExecutor;
use serde_json::{json, Value};

#[derive(Subcommand)]
pub enum DocumentCommands {
    /// Create a document a memory can point to instead of inlining it.
    Create {
        title: String,
        content: String,
        #[arg(long)]
        source_url: Option<String>,
        #[arg(long = "project", value_delimiter = ',')]
        project_ids: Vec<i64>,
    },
    /// List documents, oldest first.
    List {
        #[arg(long, default_value_t = 0)]
        offset: usize,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

pub async fn run(ctx: &ServiceContext, command: DocumentCommands) -> anyhow::Result<Value> {
    let value = match command {
        DocumentCommands::Create { title, content, source_url, project_ids } => {
            let args = json!({
                "title": title,
                "content": content,
                "source_url": source_url,
                "project_ids": project_ids,
            });
            ctx.executor().execute(ctx.user_id, "create_document", args).await?
        }
        DocumentCommands::List { offset, limit } => {
            let documents = ctx.storage.list_documents(ctx.user_id, Page::new(offset, limit)).await?;
            serde_json::to_value(documents)?
        }
    };
    Ok(value)
}
