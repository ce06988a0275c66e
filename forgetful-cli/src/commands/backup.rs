//! `forgetful backup ...`

use crate::context::ServiceContext;
use clap::Subcommand;
use forgetful_core::backup::BackupHandle;
use serde_json::{json, Value};

#[derive(Subcommand)]
pub enum BackupCommands {
    /// Snapshot the current storage backend.
    Create,
    /// Restore from a previously created snapshot path.
    Restore { path: String },
}

pub async fn run(ctx: &ServiceContext, command: BackupCommands) -> anyhow::Result<Value> {
    let value = match command {
        BackupCommands::Create => {
            let handle = ctx.backup.create_backup().await?;
            json!({ "path": handle.path, "created_at": handle.created_at })
        }
        BackupCommands::Restore { path } => {
            let handle = BackupHandle { path, created_at: chrono::Utc::now() };
            ctx.backup.restore_backup(&handle).await?;
            json!({ "restored_from": handle.path })
        }
    };
    Ok(value)
}
