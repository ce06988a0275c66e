//! Data model for the Forgetful atomic memory store (spec §3).

pub mod code_artifact;
pub mod document;
pub mod entity;
pub mod memory;
pub mod project;
pub mod user;

pub use code_artifact::{CodeArtifact, CodeArtifactCreate, CodeArtifactUpdate};
pub use document::{Document, DocumentCreate, DocumentUpdate};
pub use entity::{
    Entity, EntityCreate, EntityRelationship, EntityRelationshipCreate, EntityType, EntityUpdate,
};
pub use memory::{
    LinkedMemory, Memory, MemoryCreate, MemoryLink, MemoryQueryRequest, MemoryQueryResult,
    MemoryUpdate,
};
pub use project::{Project, ProjectCreate, ProjectUpdate};
pub use user::User;

/// Monotonically increasing 64-bit row identifier, unique per table
/// globally (not per-user) per spec §3.
pub type Id = i64;

/// A per-user owner identifier. 128-bit UUID per spec §3.
pub type UserId = uuid::Uuid;
