use clap::{Parser, Subcommand};
use context::ServiceContext;
use output::OutputFormat;
use std::path::PathBuf;

mod commands;
mod context;
mod errors;
mod output;

use commands::backup::BackupCommands;
use commands::code_artifact::CodeArtifactCommands;
use commands::config::ConfigCommands;
use commands::document::DocumentCommands;
use commands::entity::EntityCommands;
use commands::graph::GraphCommands;
use commands::memory::MemoryCommands;
use commands::project::ProjectCommands;
use commands::reembed::ReembedCommands;
use commands::serve::ServeCommands;
use errors::{helpers, EnhancedError};

#[derive(Parser)]
#[command(name = "forgetful")]
#[command(about = "Command-line interface for the Forgetful atomic memory store")]
#[command(version)]
struct Cli {
    /// Configuration file path (defaults to `FORGETFUL_CONFIG`, then built-in defaults)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Human)]
    format: OutputFormat,

    /// Enable verbose (debug-level) logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Memory CRUD, semantic query, and linking
    #[command(alias = "mem")]
    Memory {
        #[command(subcommand)]
        command: MemoryCommands,
    },
    /// Project CRUD
    #[command(alias = "proj")]
    Project {
        #[command(subcommand)]
        command: ProjectCommands,
    },
    /// Document CRUD
    #[command(alias = "doc")]
    Document {
        #[command(subcommand)]
        command: DocumentCommands,
    },
    /// Code artifact CRUD
    #[command(alias = "code")]
    CodeArtifact {
        #[command(subcommand)]
        command: CodeArtifactCommands,
    },
    /// Entity CRUD
    #[command(alias = "ent")]
    Entity {
        #[command(subcommand)]
        command: EntityCommands,
    },
    /// Graph traversal
    Graph {
        #[command(subcommand)]
        command: GraphCommands,
    },
    /// Batch re-embedding after an embedding provider/dimension change
    Reembed {
        #[command(subcommand)]
        command: ReembedCommands,
    },
    /// Storage backup/restore
    #[command(alias = "bak")]
    Backup {
        #[command(subcommand)]
        command: BackupCommands,
    },
    /// Configuration inspection
    #[command(alias = "cfg")]
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Run a long-lived server surface
    Serve {
        #[command(subcommand)]
        command: ServeCommands,
    },
    /// Print the resolved local user id this CLI acts on behalf of
    Whoami,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).with_writer(std::io::stderr).init();

    let config = forgetful_core::config::Config::load(cli.config.as_deref())
        .context_with_help("Failed to load configuration", helpers::CONFIG_ERROR_HELP)?;
    let user_id = context::resolve_local_user();

    // `serve` owns the context for the lifetime of the process and never
    // prints a formatted result; every other subcommand prints one value.
    if let Commands::Serve { command } = cli.command {
        let ctx = ServiceContext::build(config, user_id).await?;
        return commands::serve::run(ctx, command).await;
    }

    let ctx = ServiceContext::build(config, user_id).await?;

    let result = match cli.command {
        Commands::Memory { command } => commands::memory::run(&ctx, command).await,
        Commands::Project { command } => commands::project::run(&ctx, command).await,
        Commands::Document { command } => commands::document::run(&ctx, command).await,
        Commands::CodeArtifact { command } => commands::code_artifact::run(&ctx, command).await,
        Commands::Entity { command } => commands::entity::run(&ctx, command).await,
        Commands::Graph { command } => commands::graph::run(&ctx, command).await,
        Commands::Reembed { command } => commands::reembed::run(&ctx, command).await,
        Commands::Backup { command } => commands::backup::run(&ctx, command).await,
        Commands::Config { command } => commands::config::run(ctx.config.as_ref(), command),
        Commands::Serve { .. } => unreachable!("handled above"),
        Commands::Whoami => Ok(serde_json::json!({ "user_id": ctx.user_id.to_string() })),
    }?;

    cli.format.print(&result)
}
