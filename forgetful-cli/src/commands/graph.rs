//! `forgetful graph ...`

use crate::context::ServiceContext;
use clap::Subcommand;
use forgetful_core::tools::ToolExecutor;
use serde_json::{json, Value};

#[derive(Subcommand)]
pub enum GraphCommands {
    /// BFS traversal from one node (e.g. `memory:42`) out to `depth` hops.
    Subgraph {
        center_node_id: String,
        #[arg(long, default_value_t = 2)]
        depth: u8,
        #[arg(long, default_value_t = 100)]
        max_nodes: usize,
        #[arg(long, value_delimiter = ',')]
        node_types: Vec<String>,
    },
}

pub async fn run(ctx: &ServiceContext, command: GraphCommands) -> anyhow::Result<Value> {
    let value = match command {
        GraphCommands::Subgraph { center_node_id, depth, max_nodes, node_types } => {
            let args = json!({
                "center_node_id": center_node_id,
                "depth": depth,
                "max_nodes": max_nodes,
                "node_types": node_types,
            });
            ctx.executor().execute(ctx.user_id, "get_subgraph", args).await?
        }
    };
    Ok(value)
}
