//! Entities: named people, organizations, concepts, or systems that
//! memories can be attached to (spec §3).

use super::{Id, UserId};
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Coarse classification of an [`Entity`]. `Other` paired with
/// [`Entity::custom_type`] covers anything finer-grained than this fixed
/// set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Organization,
    Individual,
    Team,
    Device,
    Other,
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EntityType::Organization => "organization",
            EntityType::Individual => "individual",
            EntityType::Team => "team",
            EntityType::Device => "device",
            EntityType::Other => "other",
        };
        f.write_str(s)
    }
}

/// A named entity a memory can reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: Id,
    pub user_id: UserId,
    pub name: String,
    pub entity_type: EntityType,
    /// Free-form refinement of `entity_type` when `Other` doesn't say
    /// enough on its own (e.g. `"pet"`, `"vendor"`).
    #[serde(default)]
    pub custom_type: Option<String>,
    /// Alternate names searched alongside `name` (spec §3).
    #[serde(default)]
    pub aka: Vec<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityCreate {
    pub name: String,
    pub entity_type: EntityType,
    #[serde(default)]
    pub custom_type: Option<String>,
    #[serde(default)]
    pub aka: Vec<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityUpdate {
    pub name: Option<String>,
    pub entity_type: Option<EntityType>,
    pub custom_type: Option<String>,
    pub aka: Option<Vec<String>>,
    pub description: Option<String>,
}

/// A directed, typed relationship between two entities (e.g. `reports_to`,
/// `depends_on`), distinct from the undirected memory-to-memory
/// [`crate::types::MemoryLink`]. Unique per `(source_entity_id,
/// target_entity_id, relationship_type)` (spec §3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRelationship {
    pub id: Id,
    pub user_id: UserId,
    pub source_entity_id: Id,
    pub target_entity_id: Id,
    pub relationship_type: String,
    #[serde(default)]
    pub strength: Option<f32>,
    #[serde(default)]
    pub confidence: Option<f32>,
    #[serde(default)]
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityRelationshipCreate {
    pub source_entity_id: Id,
    pub target_entity_id: Id,
    pub relationship_type: String,
    #[serde(default)]
    pub strength: Option<f32>,
    #[serde(default)]
    pub confidence: Option<f32>,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// Validate an [`EntityCreate`].
///
/// # Errors
///
/// Returns [`Error::Validation`] if `name` is empty.
pub fn validate_create(data: &EntityCreate) -> Result<()> {
    if data.name.trim().is_empty() {
        return Err(Error::validation("name", "must not be empty"));
    }
    Ok(())
}

/// Validate an [`EntityRelationshipCreate`].
///
/// # Errors
///
/// Returns [`Error::Validation`] if the relationship is self-referential or
/// `relationship_type` is empty.
pub fn validate_relationship_create(data: &EntityRelationshipCreate) -> Result<()> {
    if data.source_entity_id == data.target_entity_id {
        return Err(Error::validation(
            "target_entity_id",
            "cannot relate an entity to itself",
        ));
    }
    if data.relationship_type.trim().is_empty() {
        return Err(Error::validation("relationship_type", "must not be empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_name() {
        let data = EntityCreate {
            name: "  ".to_string(),
            entity_type: EntityType::Other,
            custom_type: None,
            aka: vec![],
            description: None,
        };
        assert!(validate_create(&data).is_err());
    }

    #[test]
    fn rejects_self_relationship() {
        let data = EntityRelationshipCreate {
            source_entity_id: 1,
            target_entity_id: 1,
            relationship_type: "depends_on".to_string(),
            strength: None,
            confidence: None,
            metadata: serde_json::Value::Null,
        };
        assert!(validate_relationship_create(&data).is_err());
    }
}
