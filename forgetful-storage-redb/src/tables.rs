//! redb table definitions.
//!
//! Every domain row is stored as a JSON-encoded value keyed by its
//! zero-padded id, so a full-table scan naturally yields ascending id
//! order. `user_id` lives inside the encoded value; this backend targets
//! single-tenant embedded deployments, so tenant filtering is a predicate
//! over the scan rather than a separate index.

use redb::TableDefinition;

pub(crate) const MEMORIES_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("memories");
pub(crate) const MEMORY_LINKS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("memory_links");
pub(crate) const PROJECTS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("projects");
pub(crate) const DOCUMENTS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("documents");
pub(crate) const CODE_ARTIFACTS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("code_artifacts");
pub(crate) const ENTITIES_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("entities");
pub(crate) const ENTITY_RELATIONSHIPS_TABLE: TableDefinition<&str, &[u8]> =
    TableDefinition::new("entity_relationships");
pub(crate) const COUNTERS_TABLE: TableDefinition<&str, u64> = TableDefinition::new("counters");

/// Maximum size for a single row's JSON encoding (1MB). Guards against a
/// corrupted file or a pathological embedding dimension from exhausting
/// memory on deserialization.
pub(crate) const MAX_ROW_SIZE: usize = 1_000_000;

/// Format an id as a fixed-width, lexically-sortable key.
#[must_use]
pub(crate) fn id_key(id: i64) -> String {
    format!("{id:020}")
}

/// Format a canonical link key from an already-ordered `(source_id, target_id)` pair.
#[must_use]
pub(crate) fn link_key(source_id: i64, target_id: i64) -> String {
    format!("{}_{}", id_key(source_id), id_key(target_id))
}
