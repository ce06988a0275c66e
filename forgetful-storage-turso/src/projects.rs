//! Project row CRUD. Deleting a project relies on the junction tables'
//! `ON DELETE CASCADE` to drop the now-dangling `memory_projects` /
//! `document_projects` / `code_artifact_projects` rows — no manual cascade
//! scan needed, unlike the embedded backend's inlined `Vec<Id>` fields.

use crate::util::{internal, parse_timestamp, row_i64, row_text, row_text_opt};
use forgetful_core::error::{Error, Result};
use forgetful_core::storage::pagination::Page;
use forgetful_core::types::{Id, Project, ProjectCreate, ProjectUpdate, UserId};
use libsql::{params, Connection, Row};

const PROJECT_COLUMNS: &str = "id, user_id, name, description, created_at, updated_at";

fn row_to_project(row: &Row) -> Result<Project> {
    Ok(Project {
        id: row_i64(row, 0)?,
        user_id: row_text(row, 1)?.parse().map_err(internal)?,
        name: row_text(row, 2)?,
        description: row_text_opt(row, 3)?,
        created_at: parse_timestamp(&row_text(row, 4)?)?,
        updated_at: parse_timestamp(&row_text(row, 5)?)?,
    })
}

pub(crate) async fn create_project(conn: &Connection, user_id: UserId, data: &ProjectCreate) -> Result<Project> {
    let now = chrono::Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO projects (user_id, name, description, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?4)",
        params![user_id.to_string(), data.name.clone(), data.description.clone(), now],
    )
    .await
    .map_err(internal)?;
    get_project(conn, user_id, conn.last_insert_rowid()).await
}

pub(crate) async fn get_project(conn: &Connection, user_id: UserId, id: Id) -> Result<Project> {
    let sql = format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?1");
    let mut rows = conn.query(&sql, params![id]).await.map_err(internal)?;
    let Some(row) = rows.next().await.map_err(internal)? else {
        return Err(Error::not_found("project", id));
    };
    let project = row_to_project(&row)?;
    if project.user_id != user_id {
        return Err(Error::not_found("project", id));
    }
    Ok(project)
}

pub(crate) async fn update_project(conn: &Connection, user_id: UserId, id: Id, update: &ProjectUpdate) -> Result<Project> {
    let mut project = get_project(conn, user_id, id).await?;
    if let Some(name) = &update.name {
        project.name = name.clone();
    }
    if let Some(description) = &update.description {
        project.description = Some(description.clone());
    }
    project.updated_at = chrono::Utc::now();

    conn.execute(
        "UPDATE projects SET name = ?1, description = ?2, updated_at = ?3 WHERE id = ?4",
        params![project.name.clone(), project.description.clone(), project.updated_at.to_rfc3339(), id],
    )
    .await
    .map_err(internal)?;
    Ok(project)
}

pub(crate) async fn delete_project(conn: &Connection, user_id: UserId, id: Id) -> Result<()> {
    get_project(conn, user_id, id).await?;
    conn.execute("DELETE FROM projects WHERE id = ?1", params![id]).await.map_err(internal)?;
    Ok(())
}

pub(crate) async fn list_projects(conn: &Connection, user_id: UserId, page: Page) -> Result<Vec<Project>> {
    let sql = format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE user_id = ?1 ORDER BY id LIMIT ?2 OFFSET ?3");
    let mut rows = conn
        .query(&sql, params![user_id.to_string(), page.limit as i64, page.offset as i64])
        .await
        .map_err(internal)?;
    let mut out = Vec::new();
    while let Some(row) = rows.next().await.map_err(internal)? {
        out.push(row_to_project(&row)?);
    }
    Ok(out)
}
