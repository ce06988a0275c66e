//! # Test Utilities
//!
//! Shared fixtures for exercising the memory store without each test
//! crate re-deriving sample data or temp-storage boilerplate.
//!
//! Provides:
//! - Sample request builders for every create type
//! - A ready-to-use embedded storage backend over a temp directory

use forgetful_core::storage::StorageBackend;
use forgetful_core::types::{
    CodeArtifactCreate, DocumentCreate, EntityCreate, EntityType, MemoryCreate, ProjectCreate,
    UserId,
};
use forgetful_storage_redb::RedbStorage;
use std::sync::Arc;
use tempfile::TempDir;

/// A minimal, valid [`MemoryCreate`] with the given title.
#[must_use]
pub fn sample_memory(title: &str) -> MemoryCreate {
    MemoryCreate {
        title: title.to_string(),
        content: format!("Content for {title}"),
        context: String::new(),
        keywords: vec![],
        tags: vec![],
        importance: 5,
        project_ids: vec![],
        code_artifact_ids: vec![],
        document_ids: vec![],
        entity_ids: vec![],
    }
}

/// A [`MemoryCreate`] with explicit keywords, for auto-link overlap tests.
#[must_use]
pub fn sample_memory_with_keywords(title: &str, keywords: &[&str]) -> MemoryCreate {
    MemoryCreate {
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
        ..sample_memory(title)
    }
}

/// A minimal, valid [`ProjectCreate`].
#[must_use]
pub fn sample_project(name: &str) -> ProjectCreate {
    ProjectCreate {
        name: name.to_string(),
        description: None,
    }
}

/// A minimal, valid [`DocumentCreate`].
#[must_use]
pub fn sample_document(title: &str) -> DocumentCreate {
    DocumentCreate {
        title: title.to_string(),
        content: format!("Document body for {title}"),
        source_url: None,
        project_ids: vec![],
    }
}

/// A minimal, valid [`CodeArtifactCreate`].
#[must_use]
pub fn sample_code_artifact(name: &str) -> CodeArtifactCreate {
    CodeArtifactCreate {
        name: name.to_string(),
        language: Some("rust".to_string()),
        content: "fn main() {}".to_string(),
        file_path: None,
        project_ids: vec![],
    }
}

/// A minimal, valid [`EntityCreate`].
#[must_use]
pub fn sample_entity(name: &str) -> EntityCreate {
    EntityCreate {
        name: name.to_string(),
        entity_type: EntityType::Other,
        custom_type: None,
        aka: vec![],
        description: None,
    }
}

/// Open a fresh [`RedbStorage`] backend over a temp directory. The
/// directory is returned alongside the backend so the caller keeps it
/// alive for the storage's lifetime.
///
/// # Panics
///
/// Panics if the temp directory or the backend fails to open; acceptable
/// in test setup code.
pub async fn temp_storage() -> (Arc<dyn StorageBackend>, TempDir) {
    let dir = TempDir::new().expect("create temp dir");
    let storage = RedbStorage::open(&dir.path().join("test.redb"))
        .await
        .expect("open redb storage");
    (Arc::new(storage), dir)
}

/// A fresh random user id, for tests that don't care about identity beyond
/// tenant isolation.
#[must_use]
pub fn test_user() -> UserId {
    UserId::new_v4()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_memory_is_valid_shape() {
        let data = sample_memory("Test title");
        assert_eq!(data.title, "Test title");
        assert_eq!(data.importance, 5);
    }

    #[test]
    fn sample_memory_with_keywords_carries_keywords() {
        let data = sample_memory_with_keywords("T", &["a", "b"]);
        assert_eq!(data.keywords, vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn temp_storage_opens_and_accepts_writes() {
        let (storage, _dir) = temp_storage().await;
        let user = test_user();
        let memory = storage
            .create_memory(user, &sample_memory("hello"), vec![0.0; 8])
            .await
            .unwrap();
        assert_eq!(memory.title, "hello");
    }
}
