//! The tool registry: static metadata for every underlying domain
//! operation exposed through the three-tool MCP surface (spec §4.I).

use super::scope::{required_scope_for, ToolCategory, ToolScopeInfo};

/// A registered tool's full description, including the scope metadata in
/// [`ToolScopeInfo`] plus the human-facing documentation surfaced by
/// `how_to_use_forgetful_tool`.
#[derive(Debug, Clone)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub category: ToolCategory,
    pub mutates: bool,
    pub summary: &'static str,
    pub input_schema_hint: &'static str,
}

impl ToolDescriptor {
    #[must_use]
    pub fn scope_info(&self) -> ToolScopeInfo {
        ToolScopeInfo {
            name: self.name,
            category: self.category,
            mutates: self.mutates,
        }
    }

    #[must_use]
    pub fn required_scope(&self) -> String {
        required_scope_for(&self.scope_info())
    }
}

/// The static catalog of tools backing `execute_forgetful_tool`.
pub struct ToolRegistry {
    tools: Vec<ToolDescriptor>,
}

impl ToolRegistry {
    /// Build the registry with the full fixed catalog (spec §4.I, §4.H
    /// operations for each domain type).
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            tools: vec![
                ToolDescriptor {
                    name: "query_memory",
                    category: ToolCategory::Memory,
                    mutates: false,
                    summary: "Semantic search over memories with linked-memory expansion and token budgeting",
                    input_schema_hint: "{ query: string, query_context?: string, k?: int, include_links?: bool, max_links_per_primary?: int, token_context_threshold?: int, max_memories?: int, importance_threshold?: int, project_ids?: int[] }",
                },
                ToolDescriptor {
                    name: "create_memory",
                    category: ToolCategory::Memory,
                    mutates: true,
                    summary: "Create a new atomic memory, auto-linked to its nearest neighbors",
                    input_schema_hint: "{ title: string, content: string, context?: string, keywords?: string[], tags?: string[], importance?: int, project_ids?: int[] }",
                },
                ToolDescriptor {
                    name: "update_memory",
                    category: ToolCategory::Memory,
                    mutates: true,
                    summary: "Patch an existing memory's fields; regenerates its embedding if search-relevant fields change",
                    input_schema_hint: "{ memory_id: int, title?: string, content?: string, context?: string, keywords?: string[], tags?: string[], importance?: int }",
                },
                ToolDescriptor {
                    name: "mark_memory_obsolete",
                    category: ToolCategory::Memory,
                    mutates: true,
                    summary: "Soft-delete a memory, optionally recording why and what superseded it",
                    input_schema_hint: "{ memory_id: int, reason?: string, superseded_by?: int }",
                },
                ToolDescriptor {
                    name: "link_memories",
                    category: ToolCategory::Linking,
                    mutates: true,
                    summary: "Manually create bidirectional links from one memory to a set of targets",
                    input_schema_hint: "{ memory_id: int, related_ids: int[] }",
                },
                ToolDescriptor {
                    name: "get_subgraph",
                    category: ToolCategory::Linking,
                    mutates: false,
                    summary: "Traverse the memory/entity/project/document/code_artifact graph from a center node",
                    input_schema_hint: "{ center_node_id: string, depth?: int, node_types?: string[], max_nodes?: int }",
                },
                ToolDescriptor {
                    name: "create_project",
                    category: ToolCategory::Project,
                    mutates: true,
                    summary: "Create a project grouping",
                    input_schema_hint: "{ name: string, description?: string }",
                },
                ToolDescriptor {
                    name: "list_projects",
                    category: ToolCategory::Project,
                    mutates: false,
                    summary: "List projects for the current user",
                    input_schema_hint: "{ offset?: int, limit?: int }",
                },
                ToolDescriptor {
                    name: "create_document",
                    category: ToolCategory::Document,
                    mutates: true,
                    summary: "Create a reference document",
                    input_schema_hint: "{ title: string, content: string, source_url?: string, project_ids?: int[] }",
                },
                ToolDescriptor {
                    name: "create_code_artifact",
                    category: ToolCategory::CodeArtifact,
                    mutates: true,
                    summary: "Store a code fragment worth recalling verbatim",
                    input_schema_hint: "{ name: string, content: string, language?: string, file_path?: string, project_ids?: int[] }",
                },
                ToolDescriptor {
                    name: "create_entity",
                    category: ToolCategory::Entity,
                    mutates: true,
                    summary: "Create a named entity that memories can reference",
                    input_schema_hint: "{ name: string, entity_type: string, description?: string }",
                },
                ToolDescriptor {
                    name: "list_entities",
                    category: ToolCategory::Entity,
                    mutates: false,
                    summary: "List entities for the current user",
                    input_schema_hint: "{ offset?: int, limit?: int }",
                },
                ToolDescriptor {
                    name: "whoami",
                    category: ToolCategory::User,
                    mutates: false,
                    summary: "Return the identity of the currently authenticated user",
                    input_schema_hint: "{}",
                },
            ],
        }
    }

    #[must_use]
    pub fn list_all(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.iter().find(|t| t.name == name)
    }

    #[must_use]
    pub fn scope_infos(&self) -> Vec<ToolScopeInfo> {
        self.tools.iter().map(ToolDescriptor::scope_info).collect()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_has_unique_tool_names() {
        let registry = ToolRegistry::with_defaults();
        let mut names: Vec<&str> = registry.list_all().iter().map(|t| t.name).collect();
        let before = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), before);
    }

    #[test]
    fn get_finds_registered_tool() {
        let registry = ToolRegistry::with_defaults();
        assert!(registry.get("query_memory").is_some());
        assert!(registry.get("nonexistent_tool").is_none());
    }

    #[test]
    fn required_scope_matches_category_and_mutation() {
        let registry = ToolRegistry::with_defaults();
        let tool = registry.get("create_memory").unwrap();
        assert_eq!(tool.required_scope(), "write:memories");
        let tool = registry.get("query_memory").unwrap();
        assert_eq!(tool.required_scope(), "read:memories");
    }
}
