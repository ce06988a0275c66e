//! MCP (Model Context Protocol) server for the Forgetful atomic memory
//! store: a JSON-RPC stdio transport exposing the three-tool meta-surface
//! (spec §4.J, §6) over [`forgetful_core::tools::ToolDispatcher`].
//!
//! This crate owns none of the domain logic — it frames JSON-RPC messages
//! ([`jsonrpc`]), answers the MCP handshake ([`protocol`]), and wires the
//! dispatcher to real services ([`executor::ServiceExecutor`]).

pub mod executor;
pub mod jsonrpc;
pub mod protocol;

pub use executor::ServiceExecutor;
