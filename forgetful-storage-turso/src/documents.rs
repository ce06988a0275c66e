//! Document row CRUD, with `document_projects` as the junction table this
//! backend uses in place of the embedded backend's inlined `project_ids`.

use crate::memories::fetch_associated;
use crate::util::{internal, parse_timestamp, row_i64, row_text, row_text_opt};
use forgetful_core::error::{Error, Result};
use forgetful_core::storage::pagination::Page;
use forgetful_core::types::{Document, DocumentCreate, DocumentUpdate, Id, UserId};
use libsql::{params, Connection, Row};

const DOCUMENT_COLUMNS: &str = "id, user_id, title, content, source_url, created_at, updated_at";

async fn row_to_document(conn: &Connection, row: &Row) -> Result<Document> {
    let id = row_i64(row, 0)?;
    let project_ids = fetch_associated(conn, "document_projects", "document_id", "project_id", id).await?;
    Ok(Document {
        id,
        user_id: row_text(row, 1)?.parse().map_err(internal)?,
        title: row_text(row, 2)?,
        content: row_text(row, 3)?,
        source_url: row_text_opt(row, 4)?,
        project_ids,
        created_at: parse_timestamp(&row_text(row, 5)?)?,
        updated_at: parse_timestamp(&row_text(row, 6)?)?,
    })
}

async fn replace_projects(conn: &Connection, document_id: Id, project_ids: &[Id]) -> Result<()> {
    conn.execute("DELETE FROM document_projects WHERE document_id = ?1", params![document_id])
        .await
        .map_err(internal)?;
    for project_id in project_ids {
        conn.execute(
            "INSERT OR IGNORE INTO document_projects (document_id, project_id) VALUES (?1, ?2)",
            params![document_id, *project_id],
        )
        .await
        .map_err(internal)?;
    }
    Ok(())
}

pub(crate) async fn create_document(conn: &Connection, user_id: UserId, data: &DocumentCreate) -> Result<Document> {
    let now = chrono::Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO documents (user_id, title, content, source_url, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
        params![user_id.to_string(), data.title.clone(), data.content.clone(), data.source_url.clone(), now],
    )
    .await
    .map_err(internal)?;
    let id = conn.last_insert_rowid();
    replace_projects(conn, id, &data.project_ids).await?;
    get_document(conn, user_id, id).await
}

pub(crate) async fn get_document(conn: &Connection, user_id: UserId, id: Id) -> Result<Document> {
    let sql = format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = ?1");
    let mut rows = conn.query(&sql, params![id]).await.map_err(internal)?;
    let Some(row) = rows.next().await.map_err(internal)? else {
        return Err(Error::not_found("document", id));
    };
    let document = row_to_document(conn, &row).await?;
    if document.user_id != user_id {
        return Err(Error::not_found("document", id));
    }
    Ok(document)
}

pub(crate) async fn update_document(conn: &Connection, user_id: UserId, id: Id, update: &DocumentUpdate) -> Result<Document> {
    let mut document = get_document(conn, user_id, id).await?;
    if let Some(title) = &update.title {
        document.title = title.clone();
    }
    if let Some(content) = &update.content {
        document.content = content.clone();
    }
    if let Some(source_url) = &update.source_url {
        document.source_url = Some(source_url.clone());
    }
    document.updated_at = chrono::Utc::now();

    conn.execute(
        "UPDATE documents SET title = ?1, content = ?2, source_url = ?3, updated_at = ?4 WHERE id = ?5",
        params![
            document.title.clone(),
            document.content.clone(),
            document.source_url.clone(),
            document.updated_at.to_rfc3339(),
            id,
        ],
    )
    .await
    .map_err(internal)?;

    if let Some(project_ids) = &update.project_ids {
        replace_projects(conn, id, project_ids).await?;
        document.project_ids.clone_from(project_ids);
    }
    Ok(document)
}

pub(crate) async fn delete_document(conn: &Connection, user_id: UserId, id: Id) -> Result<()> {
    get_document(conn, user_id, id).await?;
    conn.execute("DELETE FROM documents WHERE id = ?1", params![id]).await.map_err(internal)?;
    Ok(())
}

pub(crate) async fn list_documents(conn: &Connection, user_id: UserId, page: Page) -> Result<Vec<Document>> {
    let sql = format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE user_id = ?1 ORDER BY id LIMIT ?2 OFFSET ?3");
    let mut rows = conn
        .query(&sql, params![user_id.to_string(), page.limit as i64, page.offset as i64])
        .await
        .map_err(internal)?;
    let mut out = Vec::new();
    while let Some(row) = rows.next().await.map_err(internal)? {
        out.push(row_to_document(conn, &row).await?);
    }
    Ok(out)
}
