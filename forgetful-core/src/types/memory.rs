//! The memory entity: the system's central, atomic unit of knowledge.

use super::{Id, UserId};
use crate::config::MemoryConfig;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single atomic knowledge unit.
///
/// Follows the Zettelkasten-inspired atomic memory principle: one concept
/// per memory, easily titled and understood at a glance. Detailed analysis
/// beyond a few hundred words belongs in a [`crate::types::Document`] linked
/// from a small memory, not crammed into one oversized memory.
///
/// Good (atomic): "TTS engine preference: XTTS-v2".
/// Bad (mega): "Complete TTS evaluation with all pros/cons/results".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Memory {
    pub id: Id,
    pub user_id: UserId,
    pub title: String,
    pub content: String,
    pub context: String,
    pub keywords: Vec<String>,
    pub tags: Vec<String>,
    /// Importance score, 1-10.
    ///
    /// Scale: 9-10 personal facts / foundational patterns (always
    /// relevant); 8-9 critical technical solutions / major decisions; 7-8
    /// useful patterns / strong preferences; 6-7 project milestones /
    /// specific solutions; 5-6 minor context (manual creation only); below
    /// 5 generally discouraged (ephemeral information).
    pub importance: u8,
    pub project_ids: Vec<Id>,
    pub code_artifact_ids: Vec<Id>,
    pub document_ids: Vec<Id>,
    pub entity_ids: Vec<Id>,
    /// Unit-length embedding vector; dimension matches the provider
    /// configured at table-creation time exactly.
    pub embedding: Vec<f32>,
    pub is_obsolete: bool,
    pub obsolete_reason: Option<String>,
    pub superseded_by: Option<Id>,
    pub obsoleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// IDs of memories bound to this one via auto-linking or manual linking.
    /// Populated by the repository on read/create, not stored as a column.
    pub linked_memory_ids: Vec<Id>,
}

/// Request body for creating a memory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryCreate {
    pub title: String,
    pub content: String,
    pub context: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_importance")]
    pub importance: u8,
    #[serde(default)]
    pub project_ids: Vec<Id>,
    #[serde(default)]
    pub code_artifact_ids: Vec<Id>,
    #[serde(default)]
    pub document_ids: Vec<Id>,
    #[serde(default)]
    pub entity_ids: Vec<Id>,
}

fn default_importance() -> u8 {
    7
}

/// PATCH-semantics update: only fields present (`Some`) are changed.
/// Supplying an empty list for an M:N field clears the association.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub context: Option<String>,
    pub keywords: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub importance: Option<u8>,
    pub project_ids: Option<Vec<Id>>,
    pub code_artifact_ids: Option<Vec<Id>>,
    pub document_ids: Option<Vec<Id>>,
    pub entity_ids: Option<Vec<Id>>,
}

impl MemoryUpdate {
    /// Whether this update touches any field the embedding text is derived
    /// from (title, content, context, keywords, tags), requiring the
    /// repository to regenerate the embedding before write.
    #[must_use]
    pub fn search_fields_changed(&self) -> bool {
        self.title.is_some()
            || self.content.is_some()
            || self.context.is_some()
            || self.keywords.is_some()
            || self.tags.is_some()
    }
}

/// A single bidirectional link between two memories.
///
/// Stored once with the convention `source_id < target_id`; a unique index
/// on `(source_id, target_id)` enforces no duplicates. Self-links are
/// forbidden.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryLink {
    pub id: Id,
    pub user_id: UserId,
    pub source_id: Id,
    pub target_id: Id,
    pub created_at: DateTime<Utc>,
}

/// A linked (one-hop neighbor) memory surfaced alongside a primary query
/// result, annotated with which primary memory surfaced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkedMemory {
    pub memory: Memory,
    /// ID of the first primary memory that surfaced this link.
    pub link_source_id: Id,
}

/// Request body for `query_memory` / `POST /memories/search`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryQueryRequest {
    pub query: String,
    #[serde(default)]
    pub query_context: String,
    #[serde(default = "default_k")]
    pub k: usize,
    #[serde(default = "default_true")]
    pub include_links: bool,
    #[serde(default = "default_max_links_per_primary")]
    pub max_links_per_primary: usize,
    /// Per-request token budget. When present this takes precedence over
    /// the server-configured `MemoryConfig::token_budget` default (spec
    /// Open Question #1, resolved in DESIGN.md).
    pub token_context_threshold: Option<usize>,
    pub max_memories: Option<usize>,
    pub importance_threshold: Option<u8>,
    #[serde(default)]
    pub project_ids: Option<Vec<Id>>,
    #[serde(default)]
    pub exclude_ids: Option<Vec<Id>>,
    #[serde(default)]
    pub strict_project_filter: bool,
}

fn default_k() -> usize {
    5
}
fn default_true() -> bool {
    true
}
fn default_max_links_per_primary() -> usize {
    5
}

impl MemoryQueryRequest {
    /// Resolve the effective token budget for this request: the
    /// request-supplied value if present, otherwise the server default.
    #[must_use]
    pub fn effective_token_budget(&self, config: &MemoryConfig) -> usize {
        self.token_context_threshold.unwrap_or(config.token_budget)
    }

    /// Resolve the effective max-memories cap for this request.
    #[must_use]
    pub fn effective_max_memories(&self, config: &MemoryConfig) -> usize {
        self.max_memories.unwrap_or(config.max_memories)
    }
}

/// Response body for `query_memory`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryQueryResult {
    pub query: String,
    pub primary_memories: Vec<Memory>,
    pub linked_memories: Vec<LinkedMemory>,
    pub total_count: usize,
    pub token_count: usize,
    pub truncated: bool,
}

/// Request body for batch-linking a memory to a set of targets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryLinkRequest {
    pub memory_id: Id,
    pub related_ids: Vec<Id>,
}

/// Validate a [`MemoryCreate`] / merged-update against the configured
/// limits (spec §3 invariants (a), field-length limits from §4.D).
///
/// # Errors
///
/// Returns [`Error::Validation`] naming the first offending field.
pub fn validate_create(data: &MemoryCreate, config: &MemoryConfig) -> Result<()> {
    if data.title.trim().is_empty() {
        return Err(Error::validation("title", "must not be empty"));
    }
    if data.title.chars().count() > config.title_max_len {
        return Err(Error::validation(
            "title",
            format!("exceeds max length {}", config.title_max_len),
        ));
    }
    if data.content.trim().is_empty() {
        return Err(Error::validation("content", "must not be empty"));
    }
    if data.content.chars().count() > config.content_max_len {
        return Err(Error::validation(
            "content",
            format!("exceeds max length {}", config.content_max_len),
        ));
    }
    if data.context.chars().count() > config.context_max_len {
        return Err(Error::validation(
            "context",
            format!("exceeds max length {}", config.context_max_len),
        ));
    }
    if data.keywords.len() > config.keywords_max_count {
        return Err(Error::validation(
            "keywords",
            format!("too many keywords ({}, max {})", data.keywords.len(), config.keywords_max_count),
        ));
    }
    if data.tags.len() > config.tags_max_count {
        return Err(Error::validation(
            "tags",
            format!("too many tags ({}, max {})", data.tags.len(), config.tags_max_count),
        ));
    }
    if data.keywords.iter().any(|k| k.trim().is_empty()) {
        return Err(Error::validation("keywords", "must not contain empty strings"));
    }
    if data.tags.iter().any(|t| t.trim().is_empty()) {
        return Err(Error::validation("tags", "must not contain empty strings"));
    }
    if !(1..=10).contains(&data.importance) {
        return Err(Error::validation("importance", "must be between 1 and 10"));
    }
    Ok(())
}

/// Validate a [`MemoryLinkRequest`]: at least one target, and the source
/// must not appear among its own targets (spec §9, self-links forbidden).
///
/// # Errors
///
/// Returns [`Error::Validation`] if `related_ids` is empty or contains
/// `memory_id`.
pub fn validate_link_request(req: &MemoryLinkRequest) -> Result<()> {
    if req.related_ids.is_empty() {
        return Err(Error::validation("related_ids", "must not be empty"));
    }
    if req.related_ids.contains(&req.memory_id) {
        return Err(Error::validation("related_ids", "cannot link memory to itself"));
    }
    Ok(())
}

/// Build the canonical embedding text for a memory: the concatenation of
/// title, content, context, space-joined keywords, and space-joined tags
/// (spec §4.D).
#[must_use]
pub fn build_embedding_text(
    title: &str,
    content: &str,
    context: &str,
    keywords: &[String],
    tags: &[String],
) -> String {
    format!(
        "{title} {content} {context} {} {}",
        keywords.join(" "),
        tags.join(" ")
    )
}

/// Build the document text passed to the cross-encoder reranker (spec
/// §4.E stage 3): `title + "\n" + content + "\n" + context`, deliberately
/// narrower than [`build_embedding_text`] since keywords/tags add noise to
/// a reranker trained on natural-language passages.
#[must_use]
pub fn build_rerank_text(title: &str, content: &str, context: &str) -> String {
    format!("{title}\n{content}\n{context}")
}

/// Build the per-memory token-counting text (spec §4.G): identical shape to
/// the embedding text but joined with explicit separators matching the
/// Python prototype's `_count_memory_tokens` exactly (space-joined parts).
#[must_use]
pub fn token_counting_text(memory: &Memory) -> String {
    format!(
        "{} {} {} {} {}",
        memory.title,
        memory.content,
        memory.context,
        memory.keywords.join(" "),
        memory.tags.join(" ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_create() -> MemoryCreate {
        MemoryCreate {
            title: "Title".to_string(),
            content: "Content".to_string(),
            context: "Context".to_string(),
            keywords: vec!["a".to_string()],
            tags: vec!["b".to_string()],
            importance: 7,
            project_ids: vec![],
            code_artifact_ids: vec![],
            document_ids: vec![],
            entity_ids: vec![],
        }
    }

    #[test]
    fn valid_create_passes() {
        let config = MemoryConfig::default();
        assert!(validate_create(&sample_create(), &config).is_ok());
    }

    #[test]
    fn empty_title_rejected() {
        let config = MemoryConfig::default();
        let mut data = sample_create();
        data.title = "   ".to_string();
        assert!(validate_create(&data, &config).is_err());
    }

    #[test]
    fn oversized_content_rejected() {
        let config = MemoryConfig::default();
        let mut data = sample_create();
        data.content = "x".repeat(config.content_max_len + 1);
        assert!(validate_create(&data, &config).is_err());
    }

    #[test]
    fn importance_out_of_range_rejected() {
        let config = MemoryConfig::default();
        let mut data = sample_create();
        data.importance = 11;
        assert!(validate_create(&data, &config).is_err());
    }

    #[test]
    fn self_link_rejected() {
        let req = MemoryLinkRequest {
            memory_id: 1,
            related_ids: vec![1, 2],
        };
        assert!(validate_link_request(&req).is_err());
    }

    #[test]
    fn empty_related_ids_rejected() {
        let req = MemoryLinkRequest {
            memory_id: 1,
            related_ids: vec![],
        };
        assert!(validate_link_request(&req).is_err());
    }

    #[test]
    fn search_fields_changed_detects_title() {
        let update = MemoryUpdate {
            title: Some("new".to_string()),
            ..Default::default()
        };
        assert!(update.search_fields_changed());
    }

    #[test]
    fn search_fields_changed_false_for_importance_only() {
        let update = MemoryUpdate {
            importance: Some(9),
            ..Default::default()
        };
        assert!(!update.search_fields_changed());
    }
}
