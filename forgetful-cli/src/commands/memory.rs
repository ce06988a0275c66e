//! `forgetful memory ...`

use crate::context::ServiceContext;
use clap::Subcommand;
use forgetful_core::storage::StorageBackend;
use forgetful_core::tools::ToolExecutor;
use serde_json::{json, Value};

#[derive(Subcommand)]
pub enum MemoryCommands {
    /// Create a new atomic memory.
    Create {
        title: String,
        content: String,
        #[arg(long)]
        context: Option<String>,
        #[arg(long, value_delimiter = ',')]
        keywords: Vec<String>,
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,
        #[arg(long, default_value_t = 7)]
        importance: u8,
        #[arg(long = "project", value_delimiter = ',')]
        project_ids: Vec<i64>,
        #[arg(long = "code-artifact", value_delimiter = ',')]
        code_artifact_ids: Vec<i64>,
        #[arg(long = "document", value_delimiter = ',')]
        document_ids: Vec<i64>,
        #[arg(long = "entity", value_delimiter = ',')]
        entity_ids: Vec<i64>,
    },
    /// Fetch one memory by id.
    Get { id: i64 },
    /// Semantic query over the store, with linked-memory expansion.
    Query {
        query: String,
        #[arg(long)]
        context: Option<String>,
        #[arg(long, default_value_t = 5)]
        k: usize,
        #[arg(long)]
        token_budget: Option<usize>,
        #[arg(long)]
        max_memories: Option<usize>,
        #[arg(long)]
        importance_threshold: Option<u8>,
        #[arg(long = "project", value_delimiter = ',')]
        project_ids: Vec<i64>,
        #[arg(long)]
        no_links: bool,
    },
    /// Patch an existing memory (only supplied fields change).
    Update {
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        context: Option<String>,
        #[arg(long, value_delimiter = ',')]
        keywords: Option<Vec<String>>,
        #[arg(long, value_delimiter = ',')]
        tags: Option<Vec<String>>,
        #[arg(long)]
        importance: Option<u8>,
    },
    /// Mark a memory obsolete without deleting it.
    Obsolete {
        id: i64,
        #[arg(long)]
        reason: Option<String>,
        #[arg(long)]
        superseded_by: Option<i64>,
    },
    /// Link a memory to one or more related memories.
    Link {
        id: i64,
        #[arg(long, required = true, value_delimiter = ',')]
        related: Vec<i64>,
    },
}

pub async fn run(ctx: &ServiceContext, command: MemoryCommands) -> anyhow::Result<Value> {
    let executor = ctx.executor();
    let value = match command {
        MemoryCommands::Create {
            title,
            content,
            context,
            keywords,
            tags,
            importance,
            project_ids,
            code_artifact_ids,
            document_ids,
            entity_ids,
        } => {
            let args = json!({
                "title": title,
                "content": content,
                "context": context.unwrap_or_default(),
                "keywords": keywords,
                "tags": tags,
                "importance": importance,
                "project_ids": project_ids,
                "code_artifact_ids": code_artifact_ids,
                "document_ids": document_ids,
                "entity_ids": entity_ids,
            });
            executor.execute(ctx.user_id, "create_memory", args).await?
        }
        MemoryCommands::Get { id } => {
            let memory = ctx.storage.get_memory(ctx.user_id, id).await?;
            serde_json::to_value(memory)?
        }
        MemoryCommands::Query {
            query,
            context,
            k,
            token_budget,
            max_memories,
            importance_threshold,
            project_ids,
            no_links,
        } => {
            let args = json!({
                "query": query,
                "query_context": context.unwrap_or_default(),
                "k": k,
                "include_links": !no_links,
                "token_context_threshold": token_budget,
                "max_memories": max_memories,
                "importance_threshold": importance_threshold,
                "project_ids": project_ids,
            });
            executor.execute(ctx.user_id, "query_memory", args).await?
        }
        MemoryCommands::Update {
            id,
            title,
            content,
            context,
            keywords,
            tags,
            importance,
        } => {
            let args = json!({
                "memory_id": id,
                "title": title,
                "content": content,
                "context": context,
                "keywords": keywords,
                "tags": tags,
                "importance": importance,
            });
            executor.execute(ctx.user_id, "update_memory", args).await?
        }
        MemoryCommands::Obsolete { id, reason, superseded_by } => {
            let args = json!({ "memory_id": id, "reason": reason, "superseded_by": superseded_by });
            executor.execute(ctx.user_id, "mark_memory_obsolete", args).await?
        }
        MemoryCommands::Link { id, related } => {
            let args = json!({ "memory_id": id, "related_ids": related });
            executor.execute(ctx.user_id, "link_memories", args).await?
        }
    };
    Ok(value)
}
