//! Cascade cleanup for hard deletes of project/document/code-artifact/entity
//! rows (spec §3 "Cascade deletes cross to junction tables").
//!
//! This backend inlines M:N associations as `Vec<Id>` fields on the owning
//! row rather than separate junction tables, so "cascade" here means
//! scanning the referencing table and stripping the deleted id out of each
//! row that mentions it.

use crate::tables::{id_key, CODE_ARTIFACTS_TABLE, DOCUMENTS_TABLE, ENTITY_RELATIONSHIPS_TABLE, MEMORIES_TABLE};
use crate::util::{decode_row, encode_row, internal};
use forgetful_core::error::Result;
use forgetful_core::types::{CodeArtifact, Document, EntityRelationship, Id, Memory, UserId};
use redb::{Database, ReadableTable};

/// Remove `project_id` from every memory's `project_ids` for `user_id`.
pub(crate) fn strip_project_from_memories(db: &Database, user_id: UserId, project_id: Id) -> Result<()> {
    let txn = db.begin_write().map_err(internal)?;
    {
        let mut table = txn.open_table(MEMORIES_TABLE).map_err(internal)?;
        let keys: Vec<String> = table.iter().map_err(internal)?.filter_map(|e| e.ok()).map(|(k, _)| k.value().to_string()).collect();
        for key in keys {
            let Some(bytes) = table.get(key.as_str()).map_err(internal)? else { continue };
            let mut memory: Memory = decode_row(bytes.value())?;
            drop(bytes);
            if memory.user_id != user_id || !memory.project_ids.contains(&project_id) {
                continue;
            }
            memory.project_ids.retain(|id| *id != project_id);
            table.insert(key.as_str(), encode_row(&memory)?.as_slice()).map_err(internal)?;
        }
    }
    txn.commit().map_err(internal)?;
    Ok(())
}

/// Remove `project_id` from every document's `project_ids` for `user_id`.
pub(crate) fn strip_project_from_documents(db: &Database, user_id: UserId, project_id: Id) -> Result<()> {
    let txn = db.begin_write().map_err(internal)?;
    {
        let mut table = txn.open_table(DOCUMENTS_TABLE).map_err(internal)?;
        let keys: Vec<String> = table.iter().map_err(internal)?.filter_map(|e| e.ok()).map(|(k, _)| k.value().to_string()).collect();
        for key in keys {
            let Some(bytes) = table.get(key.as_str()).map_err(internal)? else { continue };
            let mut document: Document = decode_row(bytes.value())?;
            drop(bytes);
            if document.user_id != user_id || !document.project_ids.contains(&project_id) {
                continue;
            }
            document.project_ids.retain(|id| *id != project_id);
            table.insert(key.as_str(), encode_row(&document)?.as_slice()).map_err(internal)?;
        }
    }
    txn.commit().map_err(internal)?;
    Ok(())
}

/// Remove `project_id` from every code artifact's `project_ids` for `user_id`.
pub(crate) fn strip_project_from_code_artifacts(db: &Database, user_id: UserId, project_id: Id) -> Result<()> {
    let txn = db.begin_write().map_err(internal)?;
    {
        let mut table = txn.open_table(CODE_ARTIFACTS_TABLE).map_err(internal)?;
        let keys: Vec<String> = table.iter().map_err(internal)?.filter_map(|e| e.ok()).map(|(k, _)| k.value().to_string()).collect();
        for key in keys {
            let Some(bytes) = table.get(key.as_str()).map_err(internal)? else { continue };
            let mut artifact: CodeArtifact = decode_row(bytes.value())?;
            drop(bytes);
            if artifact.user_id != user_id || !artifact.project_ids.contains(&project_id) {
                continue;
            }
            artifact.project_ids.retain(|id| *id != project_id);
            table.insert(key.as_str(), encode_row(&artifact)?.as_slice()).map_err(internal)?;
        }
    }
    txn.commit().map_err(internal)?;
    Ok(())
}

/// Remove `document_id` from every memory's `document_ids` for `user_id`.
pub(crate) fn strip_document_from_memories(db: &Database, user_id: UserId, document_id: Id) -> Result<()> {
    strip_memory_field(db, user_id, |m| &mut m.document_ids, document_id)
}

/// Remove `code_artifact_id` from every memory's `code_artifact_ids` for `user_id`.
pub(crate) fn strip_code_artifact_from_memories(db: &Database, user_id: UserId, code_artifact_id: Id) -> Result<()> {
    strip_memory_field(db, user_id, |m| &mut m.code_artifact_ids, code_artifact_id)
}

/// Remove `entity_id` from every memory's `entity_ids` for `user_id`.
pub(crate) fn strip_entity_from_memories(db: &Database, user_id: UserId, entity_id: Id) -> Result<()> {
    strip_memory_field(db, user_id, |m| &mut m.entity_ids, entity_id)
}

fn strip_memory_field(
    db: &Database,
    user_id: UserId,
    field: impl Fn(&mut Memory) -> &mut Vec<Id>,
    target_id: Id,
) -> Result<()> {
    let txn = db.begin_write().map_err(internal)?;
    {
        let mut table = txn.open_table(MEMORIES_TABLE).map_err(internal)?;
        let keys: Vec<String> = table.iter().map_err(internal)?.filter_map(|e| e.ok()).map(|(k, _)| k.value().to_string()).collect();
        for key in keys {
            let Some(bytes) = table.get(key.as_str()).map_err(internal)? else { continue };
            let mut memory: Memory = decode_row(bytes.value())?;
            drop(bytes);
            if memory.user_id != user_id || !field(&mut memory).contains(&target_id) {
                continue;
            }
            field(&mut memory).retain(|id| *id != target_id);
            table.insert(key.as_str(), encode_row(&memory)?.as_slice()).map_err(internal)?;
        }
    }
    txn.commit().map_err(internal)?;
    Ok(())
}

/// Delete every entity-relationship row touching `entity_id` for `user_id`.
pub(crate) fn delete_relationships_touching_entity(db: &Database, user_id: UserId, entity_id: Id) -> Result<()> {
    let txn = db.begin_write().map_err(internal)?;
    {
        let mut table = txn.open_table(ENTITY_RELATIONSHIPS_TABLE).map_err(internal)?;
        let mut to_remove = Vec::new();
        for entry in table.iter().map_err(internal)? {
            let (key, value) = entry.map_err(internal)?;
            let relationship: EntityRelationship = decode_row(value.value())?;
            if relationship.user_id == user_id
                && (relationship.source_entity_id == entity_id || relationship.target_entity_id == entity_id)
            {
                to_remove.push(key.value().to_string());
            }
        }
        for key in to_remove {
            table.remove(key.as_str()).map_err(internal)?;
        }
    }
    txn.commit().map_err(internal)?;
    Ok(())
}

/// Set `superseded_by` to `None` on any memory pointing at `deleted_id`
/// (spec §3 "`superseded_by` uses SET NULL on target deletion"). Memories
/// are soft-deleted, but a hard-delete code path (e.g. GDPR erasure) would
/// still need this; exposed for that future use and exercised in tests via
/// re-marking-obsolete chains.
#[allow(dead_code)]
pub(crate) fn clear_superseded_by(db: &Database, user_id: UserId, deleted_id: Id) -> Result<()> {
    let txn = db.begin_write().map_err(internal)?;
    {
        let mut table = txn.open_table(MEMORIES_TABLE).map_err(internal)?;
        let keys: Vec<String> = table.iter().map_err(internal)?.filter_map(|e| e.ok()).map(|(k, _)| k.value().to_string()).collect();
        for key in keys {
            let Some(bytes) = table.get(key.as_str()).map_err(internal)? else { continue };
            let mut memory: Memory = decode_row(bytes.value())?;
            drop(bytes);
            if memory.user_id != user_id || memory.superseded_by != Some(deleted_id) {
                continue;
            }
            memory.superseded_by = None;
            table.insert(key.as_str(), encode_row(&memory)?.as_slice()).map_err(internal)?;
        }
    }
    txn.commit().map_err(internal)?;
    Ok(())
}
