//! Entity row CRUD and entity-to-entity relationships.

use crate::util::{decode_json, encode_json, internal, parse_timestamp, row_f64_opt, row_i64, row_text, row_text_opt};
use forgetful_core::error::{Error, Result};
use forgetful_core::storage::pagination::Page;
use forgetful_core::types::{Entity, EntityCreate, EntityRelationship, EntityRelationshipCreate, EntityType, EntityUpdate, Id, UserId};
use libsql::{params, Connection, Row};

const ENTITY_COLUMNS: &str = "id, user_id, name, entity_type, custom_type, aka_json, description, created_at, updated_at";
const RELATIONSHIP_COLUMNS: &str =
    "id, user_id, source_entity_id, target_entity_id, relationship_type, strength, confidence, metadata_json, created_at";

fn encode_entity_type(entity_type: EntityType) -> Result<String> {
    encode_json(&entity_type)
}

fn decode_entity_type(text: &str) -> Result<EntityType> {
    decode_json(text)
}

fn row_to_entity(row: &Row) -> Result<Entity> {
    Ok(Entity {
        id: row_i64(row, 0)?,
        user_id: row_text(row, 1)?.parse().map_err(internal)?,
        name: row_text(row, 2)?,
        entity_type: decode_entity_type(&row_text(row, 3)?)?,
        custom_type: row_text_opt(row, 4)?,
        aka: decode_json(&row_text(row, 5)?)?,
        description: row_text_opt(row, 6)?,
        created_at: parse_timestamp(&row_text(row, 7)?)?,
        updated_at: parse_timestamp(&row_text(row, 8)?)?,
    })
}

fn row_to_relationship(row: &Row) -> Result<EntityRelationship> {
    Ok(EntityRelationship {
        id: row_i64(row, 0)?,
        user_id: row_text(row, 1)?.parse().map_err(internal)?,
        source_entity_id: row_i64(row, 2)?,
        target_entity_id: row_i64(row, 3)?,
        relationship_type: row_text(row, 4)?,
        strength: row_f64_opt(row, 5)?.map(|v| v as f32),
        confidence: row_f64_opt(row, 6)?.map(|v| v as f32),
        metadata: decode_json(&row_text(row, 7)?)?,
        created_at: parse_timestamp(&row_text(row, 8)?)?,
    })
}

pub(crate) async fn create_entity(conn: &Connection, user_id: UserId, data: &EntityCreate) -> Result<Entity> {
    let now = chrono::Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO entities (user_id, name, entity_type, custom_type, aka_json, description, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
        params![
            user_id.to_string(),
            data.name.clone(),
            encode_entity_type(data.entity_type)?,
            data.custom_type.clone(),
            encode_json(&data.aka)?,
            data.description.clone(),
            now,
        ],
    )
    .await
    .map_err(internal)?;
    get_entity(conn, user_id, conn.last_insert_rowid()).await
}

pub(crate) async fn get_entity(conn: &Connection, user_id: UserId, id: Id) -> Result<Entity> {
    let sql = format!("SELECT {ENTITY_COLUMNS} FROM entities WHERE id = ?1");
    let mut rows = conn.query(&sql, params![id]).await.map_err(internal)?;
    let Some(row) = rows.next().await.map_err(internal)? else {
        return Err(Error::not_found("entity", id));
    };
    let entity = row_to_entity(&row)?;
    if entity.user_id != user_id {
        return Err(Error::not_found("entity", id));
    }
    Ok(entity)
}

pub(crate) async fn update_entity(conn: &Connection, user_id: UserId, id: Id, update: &EntityUpdate) -> Result<Entity> {
    let mut entity = get_entity(conn, user_id, id).await?;
    if let Some(name) = &update.name {
        entity.name = name.clone();
    }
    if let Some(entity_type) = update.entity_type {
        entity.entity_type = entity_type;
    }
    if let Some(custom_type) = &update.custom_type {
        entity.custom_type = Some(custom_type.clone());
    }
    if let Some(aka) = &update.aka {
        entity.aka = aka.clone();
    }
    if let Some(description) = &update.description {
        entity.description = Some(description.clone());
    }
    entity.updated_at = chrono::Utc::now();

    conn.execute(
        "UPDATE entities SET name = ?1, entity_type = ?2, custom_type = ?3, aka_json = ?4, description = ?5, \
         updated_at = ?6 WHERE id = ?7",
        params![
            entity.name.clone(),
            encode_entity_type(entity.entity_type)?,
            entity.custom_type.clone(),
            encode_json(&entity.aka)?,
            entity.description.clone(),
            entity.updated_at.to_rfc3339(),
            id,
        ],
    )
    .await
    .map_err(internal)?;
    Ok(entity)
}

pub(crate) async fn delete_entity(conn: &Connection, user_id: UserId, id: Id) -> Result<()> {
    get_entity(conn, user_id, id).await?;
    conn.execute("DELETE FROM entities WHERE id = ?1", params![id]).await.map_err(internal)?;
    Ok(())
}

pub(crate) async fn list_entities(conn: &Connection, user_id: UserId, page: Page) -> Result<Vec<Entity>> {
    let sql = format!("SELECT {ENTITY_COLUMNS} FROM entities WHERE user_id = ?1 ORDER BY id LIMIT ?2 OFFSET ?3");
    let mut rows = conn
        .query(&sql, params![user_id.to_string(), page.limit as i64, page.offset as i64])
        .await
        .map_err(internal)?;
    let mut out = Vec::new();
    while let Some(row) = rows.next().await.map_err(internal)? {
        out.push(row_to_entity(&row)?);
    }
    Ok(out)
}

pub(crate) async fn create_entity_relationship(
    conn: &Connection,
    user_id: UserId,
    data: &EntityRelationshipCreate,
) -> Result<EntityRelationship> {
    get_entity(conn, user_id, data.source_entity_id).await?;
    get_entity(conn, user_id, data.target_entity_id).await?;

    let mut existing = conn
        .query(
            "SELECT id FROM entity_relationships WHERE source_entity_id = ?1 AND target_entity_id = ?2 AND relationship_type = ?3",
            params![data.source_entity_id, data.target_entity_id, data.relationship_type.clone()],
        )
        .await
        .map_err(internal)?;
    if existing.next().await.map_err(internal)?.is_some() {
        return Err(Error::AlreadyLinked {
            source_id: data.source_entity_id,
            target_id: data.target_entity_id,
        });
    }

    let now = chrono::Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO entity_relationships (user_id, source_entity_id, target_entity_id, relationship_type, \
         strength, confidence, metadata_json, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            user_id.to_string(),
            data.source_entity_id,
            data.target_entity_id,
            data.relationship_type.clone(),
            data.strength.map(f64::from),
            data.confidence.map(f64::from),
            encode_json(&data.metadata)?,
            now,
        ],
    )
    .await
    .map_err(internal)?;

    let id = conn.last_insert_rowid();
    let sql = format!("SELECT {RELATIONSHIP_COLUMNS} FROM entity_relationships WHERE id = ?1");
    let mut rows = conn.query(&sql, params![id]).await.map_err(internal)?;
    let row = rows
        .next()
        .await
        .map_err(internal)?
        .ok_or_else(|| Error::Internal("inserted entity_relationship row vanished".to_string()))?;
    row_to_relationship(&row)
}

pub(crate) async fn delete_entity_relationship(conn: &Connection, user_id: UserId, id: Id) -> Result<()> {
    let sql = format!("SELECT {RELATIONSHIP_COLUMNS} FROM entity_relationships WHERE id = ?1");
    let mut rows = conn.query(&sql, params![id]).await.map_err(internal)?;
    let Some(row) = rows.next().await.map_err(internal)? else {
        return Err(Error::not_found("entity_relationship", id));
    };
    let relationship = row_to_relationship(&row)?;
    if relationship.user_id != user_id {
        return Err(Error::not_found("entity_relationship", id));
    }
    conn.execute("DELETE FROM entity_relationships WHERE id = ?1", params![id])
        .await
        .map_err(internal)?;
    Ok(())
}

pub(crate) async fn all_relationships_touching(conn: &Connection, user_id: UserId, entity_id: Id) -> Result<Vec<EntityRelationship>> {
    let sql = format!(
        "SELECT {RELATIONSHIP_COLUMNS} FROM entity_relationships WHERE user_id = ?1 AND \
         (source_entity_id = ?2 OR target_entity_id = ?2)"
    );
    let mut rows = conn.query(&sql, params![user_id.to_string(), entity_id]).await.map_err(internal)?;
    let mut out = Vec::new();
    while let Some(row) = rows.next().await.map_err(internal)? {
        out.push(row_to_relationship(&row)?);
    }
    Ok(out)
}
