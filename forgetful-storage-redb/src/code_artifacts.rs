//! Code artifact row CRUD.

use crate::tables::{id_key, CODE_ARTIFACTS_TABLE};
use crate::util::{decode_row, encode_row, internal, next_id};
use chrono::Utc;
use forgetful_core::error::{Error, Result};
use forgetful_core::storage::pagination::Page;
use forgetful_core::types::{CodeArtifact, CodeArtifactCreate, CodeArtifactUpdate, Id, UserId};
use redb::{Database, ReadableTable};

pub(crate) fn create_code_artifact(db: &Database, user_id: UserId, data: &CodeArtifactCreate) -> Result<CodeArtifact> {
    let txn = db.begin_write().map_err(internal)?;
    let id = next_id(&txn, "code_artifact")?;
    let now = Utc::now();
    let artifact = CodeArtifact {
        id,
        user_id,
        name: data.name.clone(),
        language: data.language.clone(),
        content: data.content.clone(),
        file_path: data.file_path.clone(),
        project_ids: data.project_ids.clone(),
        created_at: now,
        updated_at: now,
    };
    {
        let mut table = txn.open_table(CODE_ARTIFACTS_TABLE).map_err(internal)?;
        table.insert(id_key(id).as_str(), encode_row(&artifact)?.as_slice()).map_err(internal)?;
    }
    txn.commit().map_err(internal)?;
    Ok(artifact)
}

fn read_code_artifact(db: &Database, user_id: UserId, id: Id) -> Result<CodeArtifact> {
    let txn = db.begin_read().map_err(internal)?;
    let table = txn.open_table(CODE_ARTIFACTS_TABLE).map_err(internal)?;
    match table.get(id_key(id).as_str()).map_err(internal)? {
        Some(bytes) => {
            let artifact: CodeArtifact = decode_row(bytes.value())?;
            if artifact.user_id != user_id {
                return Err(Error::not_found("code_artifact", id));
            }
            Ok(artifact)
        }
        None => Err(Error::not_found("code_artifact", id)),
    }
}

pub(crate) fn get_code_artifact(db: &Database, user_id: UserId, id: Id) -> Result<CodeArtifact> {
    read_code_artifact(db, user_id, id)
}

pub(crate) fn update_code_artifact(
    db: &Database,
    user_id: UserId,
    id: Id,
    update: &CodeArtifactUpdate,
) -> Result<CodeArtifact> {
    let mut artifact = read_code_artifact(db, user_id, id)?;
    if let Some(name) = &update.name {
        artifact.name = name.clone();
    }
    if let Some(language) = &update.language {
        artifact.language = Some(language.clone());
    }
    if let Some(content) = &update.content {
        artifact.content = content.clone();
    }
    if let Some(file_path) = &update.file_path {
        artifact.file_path = Some(file_path.clone());
    }
    if let Some(project_ids) = &update.project_ids {
        artifact.project_ids = project_ids.clone();
    }
    artifact.updated_at = Utc::now();

    let txn = db.begin_write().map_err(internal)?;
    {
        let mut table = txn.open_table(CODE_ARTIFACTS_TABLE).map_err(internal)?;
        table.insert(id_key(id).as_str(), encode_row(&artifact)?.as_slice()).map_err(internal)?;
    }
    txn.commit().map_err(internal)?;
    Ok(artifact)
}

pub(crate) fn delete_code_artifact(db: &Database, user_id: UserId, id: Id) -> Result<()> {
    read_code_artifact(db, user_id, id)?;
    let txn = db.begin_write().map_err(internal)?;
    {
        let mut table = txn.open_table(CODE_ARTIFACTS_TABLE).map_err(internal)?;
        table.remove(id_key(id).as_str()).map_err(internal)?;
    }
    txn.commit().map_err(internal)?;
    crate::cascade::strip_code_artifact_from_memories(db, user_id, id)?;
    Ok(())
}

pub(crate) fn list_code_artifacts(db: &Database, user_id: UserId, page: Page) -> Result<Vec<CodeArtifact>> {
    let txn = db.begin_read().map_err(internal)?;
    let table = txn.open_table(CODE_ARTIFACTS_TABLE).map_err(internal)?;
    let mut all = Vec::new();
    for entry in table.iter().map_err(internal)? {
        let (_key, value) = entry.map_err(internal)?;
        let artifact: CodeArtifact = decode_row(value.value())?;
        if artifact.user_id == user_id {
            all.push(artifact);
        }
    }
    Ok(all.into_iter().skip(page.offset).take(page.limit).collect())
}
