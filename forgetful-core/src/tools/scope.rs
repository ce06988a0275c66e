//! OAuth-style scope resolution for meta-tool dispatch (spec §4.I).
//!
//! Two-layer model:
//! 1. An instance-level ceiling (`Config::scopes`, default `"*"`).
//! 2. A per-session restriction (an OAuth token's `scope` claim, when
//!    present).
//!
//! The effective permission set is the *intersection* of the two — a
//! session can never exceed the instance ceiling, regardless of what its
//! token claims.

use crate::error::{Error, Result};
use std::collections::HashSet;

/// Tool categories. `Linking` is kept distinct from `Entity` rather than
/// folded into it (see DESIGN.md) — every other category here maps
/// one-to-one onto a domain noun named in the data model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolCategory {
    User,
    Memory,
    Project,
    CodeArtifact,
    Document,
    Entity,
    Linking,
}

impl ToolCategory {
    /// The plural scope-category name used in scope tokens, e.g. `"memories"`.
    #[must_use]
    pub fn scope_name(self) -> &'static str {
        match self {
            ToolCategory::User => "users",
            ToolCategory::Memory => "memories",
            ToolCategory::Project => "projects",
            ToolCategory::CodeArtifact => "code_artifacts",
            ToolCategory::Document => "documents",
            ToolCategory::Entity => "entities",
            ToolCategory::Linking => "linking",
        }
    }

    fn from_scope_name(name: &str) -> Option<Self> {
        Some(match name {
            "users" => ToolCategory::User,
            "memories" => ToolCategory::Memory,
            "projects" => ToolCategory::Project,
            "code_artifacts" => ToolCategory::CodeArtifact,
            "documents" => ToolCategory::Document,
            "entities" => ToolCategory::Entity,
            "linking" => ToolCategory::Linking,
            _ => return None,
        })
    }

    const ALL_SCOPE_NAMES: [&'static str; 7] = [
        "users",
        "memories",
        "projects",
        "code_artifacts",
        "documents",
        "entities",
        "linking",
    ];
}

/// A single parsed scope token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeToken {
    All,
    Read,
    Write,
    ReadCategory(ToolCategory),
    WriteCategory(ToolCategory),
}

/// Parse a comma-separated scope string (e.g. `"*"`, `"read"`,
/// `"read,write:memories"`) into a set of validated tokens.
///
/// # Errors
///
/// Returns [`Error::Validation`] if empty after trimming, or any token
/// doesn't match `*`, `read`, `write`, `read:<category>`, or
/// `write:<category>`.
pub fn parse_scopes(scope_string: &str) -> Result<HashSet<ScopeToken>> {
    let raw = scope_string.trim();
    if raw.is_empty() {
        return Err(Error::validation("scopes", "scope string cannot be empty"));
    }

    let mut tokens = HashSet::new();
    for part in raw.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        if part == "*" {
            tokens.insert(ScopeToken::All);
            continue;
        }

        if let Some((action, category)) = part.split_once(':') {
            let category = ToolCategory::from_scope_name(category).ok_or_else(|| {
                Error::validation(
                    "scopes",
                    format!(
                        "invalid scope category '{category}' in '{part}', expected one of {:?}",
                        ToolCategory::ALL_SCOPE_NAMES
                    ),
                )
            })?;
            match action {
                "read" => tokens.insert(ScopeToken::ReadCategory(category)),
                "write" => tokens.insert(ScopeToken::WriteCategory(category)),
                other => {
                    return Err(Error::validation(
                        "scopes",
                        format!("invalid scope action '{other}' in '{part}'"),
                    ))
                }
            };
            continue;
        }

        match part {
            "read" => {
                tokens.insert(ScopeToken::Read);
            }
            "write" => {
                tokens.insert(ScopeToken::Write);
            }
            other => {
                return Err(Error::validation(
                    "scopes",
                    format!(
                        "invalid scope token '{other}', expected *, read, write, read:<category>, or write:<category>"
                    ),
                ))
            }
        }
    }

    if tokens.is_empty() {
        return Err(Error::validation("scopes", "scope string cannot be empty"));
    }
    Ok(tokens)
}

/// A tool's static scope-relevant metadata.
#[derive(Debug, Clone, Copy)]
pub struct ToolScopeInfo {
    pub name: &'static str,
    pub category: ToolCategory,
    pub mutates: bool,
}

/// Resolve a set of scope tokens to the names of tools they permit.
#[must_use]
pub fn resolve_permitted_tools(scopes: &HashSet<ScopeToken>, tools: &[ToolScopeInfo]) -> HashSet<String> {
    if scopes.contains(&ScopeToken::All) {
        return tools.iter().map(|t| t.name.to_string()).collect();
    }

    let mut permitted = HashSet::new();
    for token in scopes {
        match token {
            ScopeToken::All => unreachable!("handled above"),
            ScopeToken::Read => {
                permitted.extend(tools.iter().filter(|t| !t.mutates).map(|t| t.name.to_string()));
            }
            ScopeToken::Write => {
                permitted.extend(tools.iter().filter(|t| t.mutates).map(|t| t.name.to_string()));
            }
            ScopeToken::ReadCategory(cat) => {
                permitted.extend(
                    tools
                        .iter()
                        .filter(|t| t.category == *cat && !t.mutates)
                        .map(|t| t.name.to_string()),
                );
            }
            ScopeToken::WriteCategory(cat) => {
                permitted.extend(
                    tools
                        .iter()
                        .filter(|t| t.category == *cat && t.mutates)
                        .map(|t| t.name.to_string()),
                );
            }
        }
    }
    permitted
}

/// The scope token string (e.g. `"write:memories"`) that would have
/// permitted a tool call, for use in permission-denied error messages.
#[must_use]
pub fn required_scope_for(tool: &ToolScopeInfo) -> String {
    let action = if tool.mutates { "write" } else { "read" };
    format!("{action}:{}", tool.category.scope_name())
}

/// Compute the effective permitted tool set for a request: the
/// intersection of the instance ceiling and the session/token scope, or
/// just the instance ceiling if no session scope is present.
#[must_use]
pub fn effective_permitted_tools(
    instance_scopes: &HashSet<ScopeToken>,
    session_scopes: Option<&HashSet<ScopeToken>>,
    tools: &[ToolScopeInfo],
) -> HashSet<String> {
    let instance_permitted = resolve_permitted_tools(instance_scopes, tools);
    match session_scopes {
        None => instance_permitted,
        Some(session) => {
            let session_permitted = resolve_permitted_tools(session, tools);
            instance_permitted
                .intersection(&session_permitted)
                .cloned()
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tools() -> Vec<ToolScopeInfo> {
        vec![
            ToolScopeInfo {
                name: "search_memories",
                category: ToolCategory::Memory,
                mutates: false,
            },
            ToolScopeInfo {
                name: "create_memory",
                category: ToolCategory::Memory,
                mutates: true,
            },
            ToolScopeInfo {
                name: "list_projects",
                category: ToolCategory::Project,
                mutates: false,
            },
        ]
    }

    #[test]
    fn star_permits_everything() {
        let scopes = parse_scopes("*").unwrap();
        let permitted = resolve_permitted_tools(&scopes, &sample_tools());
        assert_eq!(permitted.len(), 3);
    }

    #[test]
    fn bare_read_permits_only_non_mutating() {
        let scopes = parse_scopes("read").unwrap();
        let permitted = resolve_permitted_tools(&scopes, &sample_tools());
        assert!(permitted.contains("search_memories"));
        assert!(permitted.contains("list_projects"));
        assert!(!permitted.contains("create_memory"));
    }

    #[test]
    fn category_scoped_write_is_narrow() {
        let scopes = parse_scopes("write:memories").unwrap();
        let permitted = resolve_permitted_tools(&scopes, &sample_tools());
        assert_eq!(permitted, HashSet::from(["create_memory".to_string()]));
    }

    #[test]
    fn invalid_action_rejected() {
        assert!(parse_scopes("delete:memories").is_err());
    }

    #[test]
    fn invalid_category_rejected() {
        assert!(parse_scopes("read:widgets").is_err());
    }

    #[test]
    fn empty_scope_string_rejected() {
        assert!(parse_scopes("").is_err());
        assert!(parse_scopes("   ").is_err());
    }

    #[test]
    fn session_scope_narrows_instance_ceiling() {
        let instance = parse_scopes("*").unwrap();
        let session = parse_scopes("read").unwrap();
        let permitted = effective_permitted_tools(&instance, Some(&session), &sample_tools());
        assert!(!permitted.contains("create_memory"));
        assert!(permitted.contains("search_memories"));
    }

    #[test]
    fn session_cannot_exceed_instance_ceiling() {
        let instance = parse_scopes("read:memories").unwrap();
        let session = parse_scopes("*").unwrap();
        let permitted = effective_permitted_tools(&instance, Some(&session), &sample_tools());
        assert_eq!(permitted, HashSet::from(["search_memories".to_string()]));
    }

    #[test]
    fn no_session_scope_falls_back_to_instance_ceiling() {
        let instance = parse_scopes("read").unwrap();
        let permitted = effective_permitted_tools(&instance, None, &sample_tools());
        assert_eq!(permitted.len(), 2);
    }
}
