//! Project row CRUD.

use crate::tables::{id_key, PROJECTS_TABLE};
use crate::util::{decode_row, encode_row, internal, next_id};
use chrono::Utc;
use forgetful_core::error::{Error, Result};
use forgetful_core::storage::pagination::Page;
use forgetful_core::types::{Id, Project, ProjectCreate, ProjectUpdate, UserId};
use redb::{Database, ReadableTable};

pub(crate) fn create_project(db: &Database, user_id: UserId, data: &ProjectCreate) -> Result<Project> {
    let txn = db.begin_write().map_err(internal)?;
    let id = next_id(&txn, "project")?;
    let now = Utc::now();
    let project = Project {
        id,
        user_id,
        name: data.name.clone(),
        description: data.description.clone(),
        created_at: now,
        updated_at: now,
    };
    {
        let mut table = txn.open_table(PROJECTS_TABLE).map_err(internal)?;
        table.insert(id_key(id).as_str(), encode_row(&project)?.as_slice()).map_err(internal)?;
    }
    txn.commit().map_err(internal)?;
    Ok(project)
}

fn read_project(db: &Database, user_id: UserId, id: Id) -> Result<Project> {
    let txn = db.begin_read().map_err(internal)?;
    let table = txn.open_table(PROJECTS_TABLE).map_err(internal)?;
    match table.get(id_key(id).as_str()).map_err(internal)? {
        Some(bytes) => {
            let project: Project = decode_row(bytes.value())?;
            if project.user_id != user_id {
                return Err(Error::not_found("project", id));
            }
            Ok(project)
        }
        None => Err(Error::not_found("project", id)),
    }
}

pub(crate) fn get_project(db: &Database, user_id: UserId, id: Id) -> Result<Project> {
    read_project(db, user_id, id)
}

pub(crate) fn update_project(db: &Database, user_id: UserId, id: Id, update: &ProjectUpdate) -> Result<Project> {
    let mut project = read_project(db, user_id, id)?;
    if let Some(name) = &update.name {
        project.name = name.clone();
    }
    if let Some(description) = &update.description {
        project.description = Some(description.clone());
    }
    project.updated_at = Utc::now();

    let txn = db.begin_write().map_err(internal)?;
    {
        let mut table = txn.open_table(PROJECTS_TABLE).map_err(internal)?;
        table.insert(id_key(id).as_str(), encode_row(&project)?.as_slice()).map_err(internal)?;
    }
    txn.commit().map_err(internal)?;
    Ok(project)
}

pub(crate) fn delete_project(db: &Database, user_id: UserId, id: Id) -> Result<()> {
    read_project(db, user_id, id)?;
    let txn = db.begin_write().map_err(internal)?;
    {
        let mut table = txn.open_table(PROJECTS_TABLE).map_err(internal)?;
        table.remove(id_key(id).as_str()).map_err(internal)?;
    }
    txn.commit().map_err(internal)?;
    crate::cascade::strip_project_from_memories(db, user_id, id)?;
    crate::cascade::strip_project_from_documents(db, user_id, id)?;
    crate::cascade::strip_project_from_code_artifacts(db, user_id, id)?;
    Ok(())
}

pub(crate) fn list_projects(db: &Database, user_id: UserId, page: Page) -> Result<Vec<Project>> {
    let txn = db.begin_read().map_err(internal)?;
    let table = txn.open_table(PROJECTS_TABLE).map_err(internal)?;
    let mut all = Vec::new();
    for entry in table.iter().map_err(internal)? {
        let (_key, value) = entry.map_err(internal)?;
        let project: Project = decode_row(value.value())?;
        if project.user_id == user_id {
            all.push(project);
        }
    }
    Ok(all.into_iter().skip(page.offset).take(page.limit).collect())
}
