//! `forgetful config ...`

use clap::Subcommand;
use forgetful_core::config::Config;
use serde_json::Value;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the fully resolved configuration (file + env overrides).
    Show,
}

pub fn run(config: &Config, command: ConfigCommands) -> anyhow::Result<Value> {
    let value = match command {
        ConfigCommands::Show => serde_json::to_value(config)?,
    };
    Ok(value)
}
