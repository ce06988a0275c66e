//! Code artifact row CRUD, junction-backed the same way [`crate::documents`]
//! is.

use crate::memories::fetch_associated;
use crate::util::{internal, parse_timestamp, row_i64, row_text, row_text_opt};
use forgetful_core::error::{Error, Result};
use forgetful_core::storage::pagination::Page;
use forgetful_core::types::{CodeArtifact, CodeArtifactCreate, CodeArtifactUpdate, Id, UserId};
use libsql::{params, Connection, Row};

const ARTIFACT_COLUMNS: &str = "id, user_id, name, language, content, file_path, created_at, updated_at";

async fn row_to_artifact(conn: &Connection, row: &Row) -> Result<CodeArtifact> {
    let id = row_i64(row, 0)?;
    let project_ids = fetch_associated(conn, "code_artifact_projects", "code_artifact_id", "project_id", id).await?;
    Ok(CodeArtifact {
        id,
        user_id: row_text(row, 1)?.parse().map_err(internal)?,
        name: row_text(row, 2)?,
        language: row_text_opt(row, 3)?,
        content: row_text(row, 4)?,
        file_path: row_text_opt(row, 5)?,
        project_ids,
        created_at: parse_timestamp(&row_text(row, 6)?)?,
        updated_at: parse_timestamp(&row_text(row, 7)?)?,
    })
}

async fn replace_projects(conn: &Connection, artifact_id: Id, project_ids: &[Id]) -> Result<()> {
    conn.execute(
        "DELETE FROM code_artifact_projects WHERE code_artifact_id = ?1",
        params![artifact_id],
    )
    .await
    .map_err(internal)?;
    for project_id in project_ids {
        conn.execute(
            "INSERT OR IGNORE INTO code_artifact_projects (code_artifact_id, project_id) VALUES (?1, ?2)",
            params![artifact_id, *project_id],
        )
        .await
        .map_err(internal)?;
    }
    Ok(())
}

pub(crate) async fn create_code_artifact(conn: &Connection, user_id: UserId, data: &CodeArtifactCreate) -> Result<CodeArtifact> {
    let now = chrono::Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO code_artifacts (user_id, name, language, content, file_path, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
        params![
            user_id.to_string(),
            data.name.clone(),
            data.language.clone(),
            data.content.clone(),
            data.file_path.clone(),
            now,
        ],
    )
    .await
    .map_err(internal)?;
    let id = conn.last_insert_rowid();
    replace_projects(conn, id, &data.project_ids).await?;
    get_code_artifact(conn, user_id, id).await
}

pub(crate) async fn get_code_artifact(conn: &Connection, user_id: UserId, id: Id) -> Result<CodeArtifact> {
    let sql = format!("SELECT {ARTIFACT_COLUMNS} FROM code_artifacts WHERE id = ?1");
    let mut rows = conn.query(&sql, params![id]).await.map_err(internal)?;
    let Some(row) = rows.next().await.map_err(internal)? else {
        return Err(Error::not_found("code_artifact", id));
    };
    let artifact = row_to_artifact(conn, &row).await?;
    if artifact.user_id != user_id {
        return Err(Error::not_found("code_artifact", id));
    }
    Ok(artifact)
}

pub(crate) async fn update_code_artifact(
    conn: &Connection,
    user_id: UserId,
    id: Id,
    update: &CodeArtifactUpdate,
) -> Result<CodeArtifact> {
    let mut artifact = get_code_artifact(conn, user_id, id).await?;
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
    artifact.updated_at = chrono::Utc::now();

    conn.execute(
        "UPDATE code_artifacts SET name = ?1, language = ?2, content = ?3, file_path = ?4, updated_at = ?5 WHERE id = ?6",
        params![
            artifact.name.clone(),
            artifact.language.clone(),
            artifact.content.clone(),
            artifact.file_path.clone(),
            artifact.updated_at.to_rfc3339(),
            id,
        ],
    )
    .await
    .map_err(internal)?;

    if let Some(project_ids) = &update.project_ids {
        replace_projects(conn, id, project_ids).await?;
        artifact.project_ids.clone_from(project_ids);
    }
    Ok(artifact)
}

pub(crate) async fn delete_code_artifact(conn: &Connection, user_id: UserId, id: Id) -> Result<()> {
    get_code_artifact(conn, user_id, id).await?;
    conn.execute("DELETE FROM code_artifacts WHERE id = ?1", params![id]).await.map_err(internal)?;
    Ok(())
}

pub(crate) async fn list_code_artifacts(conn: &Connection, user_id: UserId, page: Page) -> Result<Vec<CodeArtifact>> {
    let sql = format!("SELECT {ARTIFACT_COLUMNS} FROM code_artifacts WHERE user_id = ?1 ORDER BY id LIMIT ?2 OFFSET ?3");
    let mut rows = conn
        .query(&sql, params![user_id.to_string(), page.limit as i64, page.offset as i64])
        .await
        .map_err(internal)?;
    let mut out = Vec::new();
    while let Some(row) = rows.next().await.map_err(internal)? {
        out.push(row_to_artifact(conn, &row).await?);
    }
    Ok(out)
}
