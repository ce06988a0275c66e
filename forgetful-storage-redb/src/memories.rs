//! Memory row CRUD and brute-force vector/lexical search.
//!
//! A single-tenant embedded deployment rarely holds more than a few
//! thousand memories, so an exhaustive cosine scan over the table is the
//! right tradeoff against the complexity of maintaining an ANN index file
//! alongside redb — the same call the source prototype's SQLite repository
//! makes for the same reason.

use crate::tables::{id_key, MEMORIES_TABLE};
use crate::util::{compare_scored, decode_row, encode_row, internal, next_id};
use chrono::Utc;
use forgetful_core::embeddings::cosine_similarity;
use forgetful_core::error::{Error, Result};
use forgetful_core::storage::ScoredMemory;
use forgetful_core::types::{Id, Memory, MemoryCreate, MemoryUpdate, UserId};
use redb::{Database, ReadableTable};

pub(crate) fn create_memory(db: &Database, user_id: UserId, data: &MemoryCreate, embedding: Vec<f32>) -> Result<Memory> {
    let txn = db.begin_write().map_err(internal)?;
    let id = next_id(&txn, "memory")?;
    let now = Utc::now();
    let memory = Memory {
        id,
        user_id,
        title: data.title.clone(),
        content: data.content.clone(),
        context: data.context.clone(),
        keywords: data.keywords.clone(),
        tags: data.tags.clone(),
        importance: data.importance,
        project_ids: data.project_ids.clone(),
        code_artifact_ids: data.code_artifact_ids.clone(),
        document_ids: data.document_ids.clone(),
        entity_ids: data.entity_ids.clone(),
        embedding,
        is_obsolete: false,
        obsolete_reason: None,
        superseded_by: None,
        obsoleted_at: None,
        created_at: now,
        updated_at: now,
        linked_memory_ids: vec![],
    };
    {
        let mut table = txn.open_table(MEMORIES_TABLE).map_err(internal)?;
        table.insert(id_key(id).as_str(), encode_row(&memory)?.as_slice()).map_err(internal)?;
    }
    txn.commit().map_err(internal)?;
    Ok(memory)
}

fn read_memory(db: &Database, user_id: UserId, id: Id) -> Result<Memory> {
    let txn = db.begin_read().map_err(internal)?;
    let table = txn.open_table(MEMORIES_TABLE).map_err(internal)?;
    let row = table.get(id_key(id).as_str()).map_err(internal)?;
    match row {
        Some(bytes) => {
            let memory: Memory = decode_row(bytes.value())?;
            if memory.user_id != user_id {
                return Err(Error::not_found("memory", id));
            }
            Ok(memory)
        }
        None => Err(Error::not_found("memory", id)),
    }
}

pub(crate) fn get_memory(db: &Database, user_id: UserId, id: Id) -> Result<Memory> {
    read_memory(db, user_id, id)
}

pub(crate) fn update_memory(
    db: &Database,
    user_id: UserId,
    id: Id,
    update: &MemoryUpdate,
    new_embedding: Option<Vec<f32>>,
) -> Result<Memory> {
    let mut memory = read_memory(db, user_id, id)?;
    if let Some(title) = &update.title {
        memory.title = title.clone();
    }
    if let Some(content) = &update.content {
        memory.content = content.clone();
    }
    if let Some(context) = &update.context {
        memory.context = context.clone();
    }
    if let Some(keywords) = &update.keywords {
        memory.keywords = keywords.clone();
    }
    if let Some(tags) = &update.tags {
        memory.tags = tags.clone();
    }
    if let Some(importance) = update.importance {
        memory.importance = importance;
    }
    if let Some(project_ids) = &update.project_ids {
        memory.project_ids = project_ids.clone();
    }
    if let Some(code_artifact_ids) = &update.code_artifact_ids {
        memory.code_artifact_ids = code_artifact_ids.clone();
    }
    if let Some(document_ids) = &update.document_ids {
        memory.document_ids = document_ids.clone();
    }
    if let Some(entity_ids) = &update.entity_ids {
        memory.entity_ids = entity_ids.clone();
    }
    if let Some(embedding) = new_embedding {
        memory.embedding = embedding;
    }
    memory.updated_at = Utc::now();

    let txn = db.begin_write().map_err(internal)?;
    {
        let mut table = txn.open_table(MEMORIES_TABLE).map_err(internal)?;
        table.insert(id_key(id).as_str(), encode_row(&memory)?.as_slice()).map_err(internal)?;
    }
    txn.commit().map_err(internal)?;
    Ok(memory)
}

pub(crate) fn mark_memory_obsolete(
    db: &Database,
    user_id: UserId,
    id: Id,
    reason: Option<String>,
    superseded_by: Option<Id>,
) -> Result<Memory> {
    if superseded_by == Some(id) {
        return Err(Error::validation("superseded_by", "cannot supersede itself"));
    }
    if let Some(other_id) = superseded_by {
        read_memory(db, user_id, other_id)?;
    }
    let mut memory = read_memory(db, user_id, id)?;
    memory.is_obsolete = true;
    memory.obsolete_reason = reason;
    memory.superseded_by = superseded_by;
    memory.obsoleted_at = Some(Utc::now());
    memory.updated_at = Utc::now();

    let txn = db.begin_write().map_err(internal)?;
    {
        let mut table = txn.open_table(MEMORIES_TABLE).map_err(internal)?;
        table.insert(id_key(id).as_str(), encode_row(&memory)?.as_slice()).map_err(internal)?;
    }
    txn.commit().map_err(internal)?;
    Ok(memory)
}

fn all_memories(db: &Database, user_id: UserId) -> Result<Vec<Memory>> {
    let txn = db.begin_read().map_err(internal)?;
    let table = txn.open_table(MEMORIES_TABLE).map_err(internal)?;
    let mut out = Vec::new();
    for entry in table.iter().map_err(internal)? {
        let (_key, value) = entry.map_err(internal)?;
        let memory: Memory = decode_row(value.value())?;
        if memory.user_id == user_id {
            out.push(memory);
        }
    }
    Ok(out)
}

fn project_filter_ok(memory: &Memory, project_ids: Option<&[Id]>) -> bool {
    match project_ids {
        None => true,
        Some(ids) => memory.project_ids.iter().any(|pid| ids.contains(pid)),
    }
}

fn importance_filter_ok(memory: &Memory, importance_threshold: Option<u8>) -> bool {
    importance_threshold.is_none_or(|threshold| memory.importance >= threshold)
}

fn exclude_filter_ok(memory: &Memory, exclude_ids: Option<&[Id]>) -> bool {
    match exclude_ids {
        None => true,
        Some(ids) => !ids.contains(&memory.id),
    }
}

pub(crate) fn semantic_search(
    db: &Database,
    user_id: UserId,
    query_embedding: &[f32],
    k: usize,
    project_ids: Option<&[Id]>,
    importance_threshold: Option<u8>,
    exclude_ids: Option<&[Id]>,
) -> Result<Vec<ScoredMemory>> {
    let mut scored: Vec<ScoredMemory> = all_memories(db, user_id)?
        .into_iter()
        .filter(|m| {
            !m.is_obsolete
                && project_filter_ok(m, project_ids)
                && importance_filter_ok(m, importance_threshold)
                && exclude_filter_ok(m, exclude_ids)
        })
        .map(|memory| {
            let score = cosine_similarity(query_embedding, &memory.embedding);
            ScoredMemory { memory, score }
        })
        .collect();
    scored.sort_by(compare_scored);
    scored.truncate(k);
    Ok(scored)
}

pub(crate) fn lexical_search(
    db: &Database,
    user_id: UserId,
    query_text: &str,
    k: usize,
    project_ids: Option<&[Id]>,
    importance_threshold: Option<u8>,
    exclude_ids: Option<&[Id]>,
) -> Result<Vec<ScoredMemory>> {
    let needle = query_text.to_lowercase();
    let terms: Vec<&str> = needle.split_whitespace().collect();
    let mut scored: Vec<ScoredMemory> = all_memories(db, user_id)?
        .into_iter()
        .filter(|m| {
            !m.is_obsolete
                && project_filter_ok(m, project_ids)
                && importance_filter_ok(m, importance_threshold)
                && exclude_filter_ok(m, exclude_ids)
        })
        .filter_map(|memory| {
            let haystack = format!(
                "{} {} {} {} {}",
                memory.title.to_lowercase(),
                memory.content.to_lowercase(),
                memory.context.to_lowercase(),
                memory.keywords.join(" ").to_lowercase(),
                memory.tags.join(" ").to_lowercase(),
            );
            let hits = terms.iter().filter(|t| haystack.contains(**t)).count();
            if hits == 0 {
                None
            } else {
                Some(ScoredMemory {
                    memory,
                    score: hits as f32,
                })
            }
        })
        .collect();
    scored.sort_by(compare_scored);
    scored.truncate(k);
    Ok(scored)
}

pub(crate) fn find_similar_memories(
    db: &Database,
    user_id: UserId,
    memory_id: Id,
    embedding: &[f32],
    k: usize,
) -> Result<Vec<ScoredMemory>> {
    let mut scored: Vec<ScoredMemory> = all_memories(db, user_id)?
        .into_iter()
        .filter(|m| !m.is_obsolete && m.id != memory_id)
        .map(|memory| {
            let score = cosine_similarity(embedding, &memory.embedding);
            ScoredMemory { memory, score }
        })
        .collect();
    scored.sort_by(compare_scored);
    scored.truncate(k);
    Ok(scored)
}

pub(crate) fn count_memories(db: &Database, user_id: UserId) -> Result<usize> {
    Ok(all_memories(db, user_id)?.into_iter().filter(|m| !m.is_obsolete).count())
}

pub(crate) fn page_memories_for_reembed(
    db: &Database,
    user_id: UserId,
    after_id: Option<Id>,
    limit: usize,
) -> Result<Vec<Memory>> {
    let mut memories = all_memories(db, user_id)?;
    memories.sort_by_key(|m| m.id);
    let start = match after_id {
        Some(after) => memories.iter().position(|m| m.id > after).unwrap_or(memories.len()),
        None => 0,
    };
    Ok(memories.into_iter().skip(start).take(limit).collect())
}

pub(crate) fn set_memory_embedding(db: &Database, user_id: UserId, id: Id, embedding: Vec<f32>) -> Result<()> {
    let mut memory = read_memory(db, user_id, id)?;
    memory.embedding = embedding;
    let txn = db.begin_write().map_err(internal)?;
    {
        let mut table = txn.open_table(MEMORIES_TABLE).map_err(internal)?;
        table.insert(id_key(id).as_str(), encode_row(&memory)?.as_slice()).map_err(internal)?;
    }
    txn.commit().map_err(internal)?;
    Ok(())
}

/// Clear every embedding for `user_id` to an empty vector, ahead of a full
/// re-embed pass (spec §4.K step 2).
pub(crate) fn reset_embedding_storage(db: &Database, user_id: UserId) -> Result<()> {
    let txn = db.begin_write().map_err(internal)?;
    {
        let mut table = txn.open_table(MEMORIES_TABLE).map_err(internal)?;
        let keys: Vec<String> = table
            .iter()
            .map_err(internal)?
            .filter_map(|e| e.ok())
            .map(|(k, _)| k.value().to_string())
            .collect();
        for key in keys {
            let Some(bytes) = table.get(key.as_str()).map_err(internal)? else { continue };
            let mut memory: Memory = decode_row(bytes.value())?;
            drop(bytes);
            if memory.user_id != user_id {
                continue;
            }
            memory.embedding.clear();
            table.insert(key.as_str(), encode_row(&memory)?.as_slice()).map_err(internal)?;
        }
    }
    txn.commit().map_err(internal)?;
    Ok(())
}

/// Apply every `(id, embedding)` pair in one write transaction.
pub(crate) fn bulk_update_embeddings(db: &Database, user_id: UserId, updates: &[(Id, Vec<f32>)]) -> Result<()> {
    let txn = db.begin_write().map_err(internal)?;
    {
        let mut table = txn.open_table(MEMORIES_TABLE).map_err(internal)?;
        for (id, embedding) in updates {
            let key = id_key(*id);
            let Some(bytes) = table.get(key.as_str()).map_err(internal)? else {
                return Err(Error::not_found("memory", *id));
            };
            let mut memory: Memory = decode_row(bytes.value())?;
            drop(bytes);
            if memory.user_id != user_id {
                return Err(Error::not_found("memory", *id));
            }
            memory.embedding = embedding.clone();
            table.insert(key.as_str(), encode_row(&memory)?.as_slice()).map_err(internal)?;
        }
    }
    txn.commit().map_err(internal)?;
    Ok(())
}
