//! One module per top-level subcommand, each translating parsed `clap`
//! arguments into the same JSON argument shape the MCP surface accepts and
//! printing the result through [`crate::output::OutputFormat`].

pub mod backup;
pub mod code_artifact;
pub mod config;
pub mod document;
pub mod entity;
pub mod graph;
pub mod memory;
pub mod project;
pub mod reembed;
pub mod serve;
