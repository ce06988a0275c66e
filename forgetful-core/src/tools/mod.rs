//! Scoped meta-tool dispatch for the MCP surface (spec §4.I).

pub mod coercion;
pub mod dispatcher;
pub mod registry;
pub mod scope;

pub use dispatcher::{ToolDispatcher, ToolDocs, ToolExecutor, ToolSummary};
pub use registry::{ToolDescriptor, ToolRegistry};
pub use scope::{parse_scopes, ScopeToken, ToolCategory, ToolScopeInfo};
