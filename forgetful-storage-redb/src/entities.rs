//! Entity row CRUD and entity-to-entity relationships.

use crate::tables::{id_key, ENTITIES_TABLE, ENTITY_RELATIONSHIPS_TABLE};
use crate::util::{decode_row, encode_row, internal, next_id};
use chrono::Utc;
use forgetful_core::error::{Error, Result};
use forgetful_core::storage::pagination::Page;
use forgetful_core::types::{Entity, EntityCreate, EntityRelationship, EntityRelationshipCreate, EntityUpdate, Id, UserId};
use redb::{Database, ReadableTable};

pub(crate) fn create_entity(db: &Database, user_id: UserId, data: &EntityCreate) -> Result<Entity> {
    let txn = db.begin_write().map_err(internal)?;
    let id = next_id(&txn, "entity")?;
    let now = Utc::now();
    let entity = Entity {
        id,
        user_id,
        name: data.name.clone(),
        entity_type: data.entity_type,
        custom_type: data.custom_type.clone(),
        aka: data.aka.clone(),
        description: data.description.clone(),
        created_at: now,
        updated_at: now,
    };
    {
        let mut table = txn.open_table(ENTITIES_TABLE).map_err(internal)?;
        table.insert(id_key(id).as_str(), encode_row(&entity)?.as_slice()).map_err(internal)?;
    }
    txn.commit().map_err(internal)?;
    Ok(entity)
}

fn read_entity(db: &Database, user_id: UserId, id: Id) -> Result<Entity> {
    let txn = db.begin_read().map_err(internal)?;
    let table = txn.open_table(ENTITIES_TABLE).map_err(internal)?;
    match table.get(id_key(id).as_str()).map_err(internal)? {
        Some(bytes) => {
            let entity: Entity = decode_row(bytes.value())?;
            if entity.user_id != user_id {
                return Err(Error::not_found("entity", id));
            }
            Ok(entity)
        }
        None => Err(Error::not_found("entity", id)),
    }
}

pub(crate) fn get_entity(db: &Database, user_id: UserId, id: Id) -> Result<Entity> {
    read_entity(db, user_id, id)
}

pub(crate) fn update_entity(db: &Database, user_id: UserId, id: Id, update: &EntityUpdate) -> Result<Entity> {
    let mut entity = read_entity(db, user_id, id)?;
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
    entity.updated_at = Utc::now();

    let txn = db.begin_write().map_err(internal)?;
    {
        let mut table = txn.open_table(ENTITIES_TABLE).map_err(internal)?;
        table.insert(id_key(id).as_str(), encode_row(&entity)?.as_slice()).map_err(internal)?;
    }
    txn.commit().map_err(internal)?;
    Ok(entity)
}

pub(crate) fn delete_entity(db: &Database, user_id: UserId, id: Id) -> Result<()> {
    read_entity(db, user_id, id)?;
    let txn = db.begin_write().map_err(internal)?;
    {
        let mut table = txn.open_table(ENTITIES_TABLE).map_err(internal)?;
        table.remove(id_key(id).as_str()).map_err(internal)?;
    }
    txn.commit().map_err(internal)?;
    crate::cascade::strip_entity_from_memories(db, user_id, id)?;
    crate::cascade::delete_relationships_touching_entity(db, user_id, id)?;
    Ok(())
}

pub(crate) fn list_entities(db: &Database, user_id: UserId, page: Page) -> Result<Vec<Entity>> {
    let txn = db.begin_read().map_err(internal)?;
    let table = txn.open_table(ENTITIES_TABLE).map_err(internal)?;
    let mut all = Vec::new();
    for entry in table.iter().map_err(internal)? {
        let (_key, value) = entry.map_err(internal)?;
        let entity: Entity = decode_row(value.value())?;
        if entity.user_id == user_id {
            all.push(entity);
        }
    }
    Ok(all.into_iter().skip(page.offset).take(page.limit).collect())
}

pub(crate) fn create_entity_relationship(
    db: &Database,
    user_id: UserId,
    data: &EntityRelationshipCreate,
) -> Result<EntityRelationship> {
    read_entity(db, user_id, data.source_entity_id)?;
    read_entity(db, user_id, data.target_entity_id)?;

    let txn = db.begin_write().map_err(internal)?;
    {
        let table = txn.open_table(ENTITY_RELATIONSHIPS_TABLE).map_err(internal)?;
        for entry in table.iter().map_err(internal)? {
            let (_key, value) = entry.map_err(internal)?;
            let existing: EntityRelationship = decode_row(value.value())?;
            if existing.user_id == user_id
                && existing.source_entity_id == data.source_entity_id
                && existing.target_entity_id == data.target_entity_id
                && existing.relationship_type == data.relationship_type
            {
                return Err(Error::AlreadyLinked {
                    source_id: data.source_entity_id,
                    target_id: data.target_entity_id,
                });
            }
        }
    }
    let id = next_id(&txn, "entity_relationship")?;
    let relationship = EntityRelationship {
        id,
        user_id,
        source_entity_id: data.source_entity_id,
        target_entity_id: data.target_entity_id,
        relationship_type: data.relationship_type.clone(),
        strength: data.strength,
        confidence: data.confidence,
        metadata: data.metadata.clone(),
        created_at: Utc::now(),
    };
    {
        let mut table = txn.open_table(ENTITY_RELATIONSHIPS_TABLE).map_err(internal)?;
        table.insert(id_key(id).as_str(), encode_row(&relationship)?.as_slice()).map_err(internal)?;
    }
    txn.commit().map_err(internal)?;
    Ok(relationship)
}

pub(crate) fn delete_entity_relationship(db: &Database, user_id: UserId, id: Id) -> Result<()> {
    let txn = db.begin_read().map_err(internal)?;
    {
        let table = txn.open_table(ENTITY_RELATIONSHIPS_TABLE).map_err(internal)?;
        match table.get(id_key(id).as_str()).map_err(internal)? {
            Some(bytes) => {
                let relationship: EntityRelationship = decode_row(bytes.value())?;
                if relationship.user_id != user_id {
                    return Err(Error::not_found("entity_relationship", id));
                }
            }
            None => return Err(Error::not_found("entity_relationship", id)),
        }
    }
    drop(txn);

    let txn = db.begin_write().map_err(internal)?;
    {
        let mut table = txn.open_table(ENTITY_RELATIONSHIPS_TABLE).map_err(internal)?;
        table.remove(id_key(id).as_str()).map_err(internal)?;
    }
    txn.commit().map_err(internal)?;
    Ok(())
}

pub(crate) fn all_relationships_touching(db: &Database, user_id: UserId, entity_id: Id) -> Result<Vec<EntityRelationship>> {
    let txn = db.begin_read().map_err(internal)?;
    let table = txn.open_table(ENTITY_RELATIONSHIPS_TABLE).map_err(internal)?;
    let mut out = Vec::new();
    for entry in table.iter().map_err(internal)? {
        let (_key, value) = entry.map_err(internal)?;
        let relationship: EntityRelationship = decode_row(value.value())?;
        if relationship.user_id == user_id
            && (relationship.source_entity_id == entity_id || relationship.target_entity_id == entity_id)
        {
            out.push(relationship);
        }
    }
    Ok(out)
}
