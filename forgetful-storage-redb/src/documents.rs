//! Document row CRUD.

use crate::tables::{id_key, DOCUMENTS_TABLE};
use crate::util::{decode_row, encode_row, internal, next_id};
use chrono::Utc;
use forgetful_core::error::{Error, Result};
use forgetful_core::storage::pagination::Page;
use forgetful_core::types::{Document, DocumentCreate, DocumentUpdate, Id, UserId};
use redb::{Database, ReadableTable};

pub(crate) fn create_document(db: &Database, user_id: UserId, data: &DocumentCreate) -> Result<Document> {
    let txn = db.begin_write().map_err(internal)?;
    let id = next_id(&txn, "document")?;
    let now = Utc::now();
    let document = Document {
        id,
        user_id,
        title: data.title.clone(),
        content: data.content.clone(),
        source_url: data.source_url.clone(),
        project_ids: data.project_ids.clone(),
        created_at: now,
        updated_at: now,
    };
    {
        let mut table = txn.open_table(DOCUMENTS_TABLE).map_err(internal)?;
        table.insert(id_key(id).as_str(), encode_row(&document)?.as_slice()).map_err(internal)?;
    }
    txn.commit().map_err(internal)?;
    Ok(document)
}

fn read_document(db: &Database, user_id: UserId, id: Id) -> Result<Document> {
    let txn = db.begin_read().map_err(internal)?;
    let table = txn.open_table(DOCUMENTS_TABLE).map_err(internal)?;
    match table.get(id_key(id).as_str()).map_err(internal)? {
        Some(bytes) => {
            let document: Document = decode_row(bytes.value())?;
            if document.user_id != user_id {
                return Err(Error::not_found("document", id));
            }
            Ok(document)
        }
        None => Err(Error::not_found("document", id)),
    }
}

pub(crate) fn get_document(db: &Database, user_id: UserId, id: Id) -> Result<Document> {
    read_document(db, user_id, id)
}

pub(crate) fn update_document(db: &Database, user_id: UserId, id: Id, update: &DocumentUpdate) -> Result<Document> {
    let mut document = read_document(db, user_id, id)?;
    if let Some(title) = &update.title {
        document.title = title.clone();
    }
    if let Some(content) = &update.content {
        document.content = content.clone();
    }
    if let Some(source_url) = &update.source_url {
        document.source_url = Some(source_url.clone());
    }
    if let Some(project_ids) = &update.project_ids {
        document.project_ids = project_ids.clone();
    }
    document.updated_at = Utc::now();

    let txn = db.begin_write().map_err(internal)?;
    {
        let mut table = txn.open_table(DOCUMENTS_TABLE).map_err(internal)?;
        table.insert(id_key(id).as_str(), encode_row(&document)?.as_slice()).map_err(internal)?;
    }
    txn.commit().map_err(internal)?;
    Ok(document)
}

pub(crate) fn delete_document(db: &Database, user_id: UserId, id: Id) -> Result<()> {
    read_document(db, user_id, id)?;
    let txn = db.begin_write().map_err(internal)?;
    {
        let mut table = txn.open_table(DOCUMENTS_TABLE).map_err(internal)?;
        table.remove(id_key(id).as_str()).map_err(internal)?;
    }
    txn.commit().map_err(internal)?;
    crate::cascade::strip_document_from_memories(db, user_id, id)?;
    Ok(())
}

pub(crate) fn list_documents(db: &Database, user_id: UserId, page: Page) -> Result<Vec<Document>> {
    let txn = db.begin_read().map_err(internal)?;
    let table = txn.open_table(DOCUMENTS_TABLE).map_err(internal)?;
    let mut all = Vec::new();
    for entry in table.iter().map_err(internal)? {
        let (_key, value) = entry.map_err(internal)?;
        let document: Document = decode_row(value.value())?;
        if document.user_id == user_id {
            all.push(document);
        }
    }
    Ok(all.into_iter().skip(page.offset).take(page.limit).collect())
}
