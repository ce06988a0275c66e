//! The three-tool MCP surface (spec §4.I): `discover_forgetful_tools`,
//! `how_to_use_forgetful_tool`, `execute_forgetful_tool`. Wrapping every
//! domain operation behind three meta-tools keeps the MCP tool list short
//! and stable while the underlying catalog grows.

use super::registry::ToolRegistry;
use super::scope::{effective_permitted_tools, ScopeToken};
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;

/// One entry in `discover_forgetful_tools`'s output.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ToolSummary {
    pub name: String,
    pub category: String,
    pub mutates: bool,
    pub summary: String,
}

/// The full documentation for one tool, as returned by
/// `how_to_use_forgetful_tool`.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ToolDocs {
    pub name: String,
    pub summary: String,
    pub input_schema_hint: String,
    pub required_scope: String,
}

/// Executes the concrete behavior named by a tool once scope has already
/// been checked. Implemented outside this crate (in the MCP server binary)
/// where domain services are wired together.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Run `tool_name` with `arguments`, returning its JSON result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unrecognized tool name, or
    /// whatever error the underlying operation produces.
    async fn execute(&self, user_id: crate::types::UserId, tool_name: &str, arguments: Value) -> Result<Value>;
}

/// Resolves scope, looks up tool metadata, and delegates execution.
pub struct ToolDispatcher {
    registry: ToolRegistry,
    executor: Arc<dyn ToolExecutor>,
    instance_scopes: HashSet<ScopeToken>,
}

impl ToolDispatcher {
    #[must_use]
    pub fn new(registry: ToolRegistry, executor: Arc<dyn ToolExecutor>, instance_scopes: HashSet<ScopeToken>) -> Self {
        Self {
            registry,
            executor,
            instance_scopes,
        }
    }

    /// `discover_forgetful_tools`: list every tool permitted for this
    /// session, without full documentation.
    #[must_use]
    pub fn discover(&self, session_scopes: Option<&HashSet<ScopeToken>>) -> Vec<ToolSummary> {
        let permitted = effective_permitted_tools(&self.instance_scopes, session_scopes, &self.registry.scope_infos());
        self.registry
            .list_all()
            .iter()
            .filter(|t| permitted.contains(t.name))
            .map(|t| ToolSummary {
                name: t.name.to_string(),
                category: t.category.scope_name().to_string(),
                mutates: t.mutates,
                summary: t.summary.to_string(),
            })
            .collect()
    }

    /// `how_to_use_forgetful_tool`: full input-shape documentation for a
    /// single tool.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if `tool_name` isn't registered, or
    /// [`Error::PermissionDenied`] if the session can't see this tool.
    pub fn how_to_use(&self, session_scopes: Option<&HashSet<ScopeToken>>, tool_name: &str) -> Result<ToolDocs> {
        let tool = self
            .registry
            .get(tool_name)
            .ok_or_else(|| Error::not_found("tool", tool_name))?;

        let permitted = effective_permitted_tools(&self.instance_scopes, session_scopes, &self.registry.scope_infos());
        if !permitted.contains(tool.name) {
            return Err(Error::PermissionDenied {
                required_scope: tool.required_scope(),
            });
        }

        Ok(ToolDocs {
            name: tool.name.to_string(),
            summary: tool.summary.to_string(),
            input_schema_hint: tool.input_schema_hint.to_string(),
            required_scope: tool.required_scope(),
        })
    }

    /// `execute_forgetful_tool`: scope-check then dispatch to the
    /// [`ToolExecutor`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unregistered tool,
    /// [`Error::PermissionDenied`] if out of scope, or whatever the
    /// executor returns.
    pub async fn execute(
        &self,
        user_id: crate::types::UserId,
        session_scopes: Option<&HashSet<ScopeToken>>,
        tool_name: &str,
        arguments: Value,
    ) -> Result<Value> {
        let tool = self
            .registry
            .get(tool_name)
            .ok_or_else(|| Error::not_found("tool", tool_name))?;

        let permitted = effective_permitted_tools(&self.instance_scopes, session_scopes, &self.registry.scope_infos());
        if !permitted.contains(tool.name) {
            return Err(Error::PermissionDenied {
                required_scope: tool.required_scope(),
            });
        }

        self.executor.execute(user_id, tool_name, arguments).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::scope::parse_scopes;

    struct EchoExecutor;

    #[async_trait]
    impl ToolExecutor for EchoExecutor {
        async fn execute(&self, _user_id: crate::types::UserId, tool_name: &str, arguments: Value) -> Result<Value> {
            Ok(serde_json::json!({ "tool": tool_name, "echo": arguments }))
        }
    }

    fn dispatcher(instance_scopes: &str) -> ToolDispatcher {
        ToolDispatcher::new(
            ToolRegistry::with_defaults(),
            Arc::new(EchoExecutor),
            parse_scopes(instance_scopes).unwrap(),
        )
    }

    #[test]
    fn discover_respects_instance_ceiling() {
        let d = dispatcher("read:memories");
        let tools = d.discover(None);
        assert!(tools.iter().any(|t| t.name == "query_memory"));
        assert!(!tools.iter().any(|t| t.name == "create_memory"));
    }

    #[test]
    fn how_to_use_denies_out_of_scope_tool() {
        let d = dispatcher("read:memories");
        let err = d.how_to_use(None, "create_memory").unwrap_err();
        assert!(matches!(err, Error::PermissionDenied { .. }));
    }

    #[test]
    fn how_to_use_unknown_tool_not_found() {
        let d = dispatcher("*");
        let err = d.how_to_use(None, "nonexistent").unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn execute_denies_out_of_scope() {
        let d = dispatcher("read");
        let err = d
            .execute(uuid::Uuid::nil(), None, "create_memory", serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::PermissionDenied { .. }));
    }

    #[tokio::test]
    async fn execute_delegates_to_executor() {
        let d = dispatcher("*");
        let result = d
            .execute(uuid::Uuid::nil(), None, "query_memory", serde_json::json!({"query": "x"}))
            .await
            .unwrap();
        assert_eq!(result["tool"], "query_memory");
    }

    #[tokio::test]
    async fn session_scope_intersects_with_instance() {
        let d = dispatcher("*");
        let session = parse_scopes("read").unwrap();
        let err = d
            .execute(uuid::Uuid::nil(), Some(&session), "create_memory", serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::PermissionDenied { .. }));
    }
}
