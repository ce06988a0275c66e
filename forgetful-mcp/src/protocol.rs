//! MCP handshake payloads: `initialize` and `tools/list`.
//!
//! The MCP tool surface is exactly the three meta-tools (spec §6); every
//! other tool name in [`forgetful_core::tools::ToolRegistry`] is reached
//! indirectly through `execute_forgetful_tool`. This keeps the list an LLM
//! client sees short and stable as the underlying catalog grows.

use serde_json::{json, Value};

pub const PROTOCOL_VERSION: &str = "2024-11-05";

#[must_use]
pub fn initialize_result() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": { "tools": { "listChanged": false } },
        "serverInfo": { "name": "forgetful-mcp", "version": env!("CARGO_PKG_VERSION") },
    })
}

#[must_use]
pub fn list_tools_result() -> Value {
    json!({
        "tools": [
            {
                "name": "discover_forgetful_tools",
                "description": "List the tool catalog available in the caller's effective scope, optionally filtered by category",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "category": {
                            "type": "string",
                            "description": "Optional category filter: users, memories, projects, code_artifacts, documents, entities, linking",
                        }
                    },
                },
            },
            {
                "name": "how_to_use_forgetful_tool",
                "description": "Return full documentation (argument schema, required scope) for one tool in the catalog",
                "inputSchema": {
                    "type": "object",
                    "properties": { "tool_name": { "type": "string" } },
                    "required": ["tool_name"],
                },
            },
            {
                "name": "execute_forgetful_tool",
                "description": "Invoke one tool from the catalog by name with its arguments",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "tool_name": { "type": "string" },
                        "arguments": { "type": "object" },
                    },
                    "required": ["tool_name"],
                },
            },
        ],
    })
}
