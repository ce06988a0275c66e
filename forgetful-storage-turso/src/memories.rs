//! Memory row CRUD and ANN-backed vector search.
//!
//! Unlike the embedded backend's exhaustive cosine scan, [`semantic_search`]
//! and [`find_similar_memories`] lean on libsql's `vector_top_k` index over
//! the `embedding` `F32_BLOB` column: the index returns a ranked candidate
//! set, which is then re-scored with the exact cosine distance and the same
//! deterministic tie-break the embedded backend uses, so both backends
//! return identically-ordered results for identical data.

use crate::util::{decode_json, encode_json, encode_vector, internal, parse_timestamp, row_bool, row_i64, row_i64_opt, row_text, row_text_opt};
use forgetful_core::embeddings::cosine_similarity;
use forgetful_core::error::{Error, Result};
use forgetful_core::storage::ScoredMemory;
use forgetful_core::types::{Id, Memory, MemoryCreate, MemoryUpdate, UserId};
use libsql::{params, Connection, Row};

const MEMORY_COLUMNS: &str = "id, user_id, title, content, context, keywords_json, tags_json, importance, \
     embedding_json, is_obsolete, obsolete_reason, superseded_by, obsoleted_at, created_at, updated_at";

/// How many extra ANN candidates to pull per requested result, so re-scoring
/// and the importance/recency tie-break have enough of the true top-k to
/// choose from.
const OVERFETCH_FACTOR: usize = 4;
const MAX_CANDIDATES: usize = 500;

async fn row_to_memory(conn: &Connection, row: &Row) -> Result<Memory> {
    let id = row_i64(row, 0)?;
    let user_id: UserId = row_text(row, 1)?.parse().map_err(internal)?;
    let embedding: Vec<f32> = decode_json(&row_text(row, 8)?)?;
    let project_ids = fetch_associated(conn, "memory_projects", "memory_id", "project_id", id).await?;
    let document_ids = fetch_associated(conn, "memory_documents", "memory_id", "document_id", id).await?;
    let code_artifact_ids = fetch_associated(conn, "memory_code_artifacts", "memory_id", "code_artifact_id", id).await?;
    let entity_ids = fetch_associated(conn, "memory_entities", "memory_id", "entity_id", id).await?;
    let linked_memory_ids = fetch_linked_ids(conn, id).await?;
    Ok(Memory {
        id,
        user_id,
        title: row_text(row, 2)?,
        content: row_text(row, 3)?,
        context: row_text(row, 4)?,
        keywords: decode_json(&row_text(row, 5)?)?,
        tags: decode_json(&row_text(row, 6)?)?,
        importance: u8::try_from(row_i64(row, 7)?).map_err(internal)?,
        project_ids,
        code_artifact_ids,
        document_ids,
        entity_ids,
        embedding,
        is_obsolete: row_bool(row, 9)?,
        obsolete_reason: row_text_opt(row, 10)?,
        superseded_by: row_i64_opt(row, 11)?,
        obsoleted_at: row_text_opt(row, 12)?.map(|t| parse_timestamp(&t)).transpose()?,
        created_at: parse_timestamp(&row_text(row, 13)?)?,
        updated_at: parse_timestamp(&row_text(row, 14)?)?,
        linked_memory_ids,
    })
}

pub(crate) async fn fetch_associated(
    conn: &Connection,
    table: &str,
    owner_col: &str,
    other_col: &str,
    owner_id: Id,
) -> Result<Vec<Id>> {
    let sql = format!("SELECT {other_col} FROM {table} WHERE {owner_col} = ?1 ORDER BY {other_col}");
    let mut rows = conn.query(&sql, params![owner_id]).await.map_err(internal)?;
    let mut out = Vec::new();
    while let Some(row) = rows.next().await.map_err(internal)? {
        out.push(row_i64(&row, 0)?);
    }
    Ok(out)
}

async fn fetch_linked_ids(conn: &Connection, memory_id: Id) -> Result<Vec<Id>> {
    let mut rows = conn
        .query(
            "SELECT source_id, target_id FROM memory_links WHERE source_id = ?1 OR target_id = ?1",
            params![memory_id],
        )
        .await
        .map_err(internal)?;
    let mut out = Vec::new();
    while let Some(row) = rows.next().await.map_err(internal)? {
        let source = row_i64(&row, 0)?;
        let target = row_i64(&row, 1)?;
        out.push(if source == memory_id { target } else { source });
    }
    Ok(out)
}

async fn replace_associations(conn: &Connection, table: &str, owner_col: &str, other_col: &str, owner_id: Id, ids: &[Id]) -> Result<()> {
    conn.execute(&format!("DELETE FROM {table} WHERE {owner_col} = ?1"), params![owner_id])
        .await
        .map_err(internal)?;
    for other_id in ids {
        conn.execute(
            &format!("INSERT OR IGNORE INTO {table} ({owner_col}, {other_col}) VALUES (?1, ?2)"),
            params![owner_id, *other_id],
        )
        .await
        .map_err(internal)?;
    }
    Ok(())
}

fn check_dimensions(embedding: &[f32], dimensions: usize) -> Result<()> {
    if embedding.len() != dimensions {
        return Err(Error::Internal(format!(
            "embedding has {} dimensions, table is configured for {dimensions}",
            embedding.len()
        )));
    }
    Ok(())
}

pub(crate) async fn create_memory(
    conn: &Connection,
    dimensions: usize,
    user_id: UserId,
    data: &MemoryCreate,
    embedding: Vec<f32>,
) -> Result<Memory> {
    check_dimensions(&embedding, dimensions)?;
    let now = chrono::Utc::now().to_rfc3339();
    let embedding_json = encode_json(&embedding)?;
    let vector_literal = encode_vector(&embedding);

    conn.execute(
        &format!(
            "INSERT INTO memories (user_id, title, content, context, keywords_json, tags_json, importance, \
             embedding_json, embedding, is_obsolete, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, vector32(?9), 0, ?10, ?10)"
        ),
        params![
            user_id.to_string(),
            data.title.clone(),
            data.content.clone(),
            data.context.clone(),
            encode_json(&data.keywords)?,
            encode_json(&data.tags)?,
            i64::from(data.importance),
            embedding_json,
            vector_literal,
            now,
        ],
    )
    .await
    .map_err(internal)?;

    let id = conn.last_insert_rowid();
    replace_associations(conn, "memory_projects", "memory_id", "project_id", id, &data.project_ids).await?;
    replace_associations(conn, "memory_documents", "memory_id", "document_id", id, &data.document_ids).await?;
    replace_associations(
        conn,
        "memory_code_artifacts",
        "memory_id",
        "code_artifact_id",
        id,
        &data.code_artifact_ids,
    )
    .await?;
    replace_associations(conn, "memory_entities", "memory_id", "entity_id", id, &data.entity_ids).await?;

    get_memory(conn, user_id, id).await
}

pub(crate) async fn get_memory(conn: &Connection, user_id: UserId, id: Id) -> Result<Memory> {
    let sql = format!("SELECT {MEMORY_COLUMNS} FROM memories WHERE id = ?1");
    let mut rows = conn.query(&sql, params![id]).await.map_err(internal)?;
    let Some(row) = rows.next().await.map_err(internal)? else {
        return Err(Error::not_found("memory", id));
    };
    let memory = row_to_memory(conn, &row).await?;
    if memory.user_id != user_id {
        return Err(Error::not_found("memory", id));
    }
    Ok(memory)
}

pub(crate) async fn update_memory(
    conn: &Connection,
    dimensions: usize,
    user_id: UserId,
    id: Id,
    update: &MemoryUpdate,
    new_embedding: Option<Vec<f32>>,
) -> Result<Memory> {
    let mut memory = get_memory(conn, user_id, id).await?;
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
    if let Some(embedding) = &new_embedding {
        check_dimensions(embedding, dimensions)?;
        memory.embedding.clone_from(embedding);
    }
    memory.updated_at = chrono::Utc::now();

    conn.execute(
        "UPDATE memories SET title = ?1, content = ?2, context = ?3, keywords_json = ?4, tags_json = ?5, \
         importance = ?6, embedding_json = ?7, embedding = vector32(?8), updated_at = ?9 WHERE id = ?10",
        params![
            memory.title.clone(),
            memory.content.clone(),
            memory.context.clone(),
            encode_json(&memory.keywords)?,
            encode_json(&memory.tags)?,
            i64::from(memory.importance),
            encode_json(&memory.embedding)?,
            encode_vector(&memory.embedding),
            memory.updated_at.to_rfc3339(),
            id,
        ],
    )
    .await
    .map_err(internal)?;

    if let Some(project_ids) = &update.project_ids {
        replace_associations(conn, "memory_projects", "memory_id", "project_id", id, project_ids).await?;
        memory.project_ids.clone_from(project_ids);
    }
    if let Some(document_ids) = &update.document_ids {
        replace_associations(conn, "memory_documents", "memory_id", "document_id", id, document_ids).await?;
        memory.document_ids.clone_from(document_ids);
    }
    if let Some(code_artifact_ids) = &update.code_artifact_ids {
        replace_associations(
            conn,
            "memory_code_artifacts",
            "memory_id",
            "code_artifact_id",
            id,
            code_artifact_ids,
        )
        .await?;
        memory.code_artifact_ids.clone_from(code_artifact_ids);
    }
    if let Some(entity_ids) = &update.entity_ids {
        replace_associations(conn, "memory_entities", "memory_id", "entity_id", id, entity_ids).await?;
        memory.entity_ids.clone_from(entity_ids);
    }

    Ok(memory)
}

pub(crate) async fn mark_memory_obsolete(
    conn: &Connection,
    user_id: UserId,
    id: Id,
    reason: Option<String>,
    superseded_by: Option<Id>,
) -> Result<Memory> {
    if superseded_by == Some(id) {
        return Err(Error::validation("superseded_by", "cannot supersede itself"));
    }
    if let Some(other_id) = superseded_by {
        get_memory(conn, user_id, other_id).await?;
    }
    let mut memory = get_memory(conn, user_id, id).await?;
    let now = chrono::Utc::now();
    memory.is_obsolete = true;
    memory.obsolete_reason.clone_from(&reason);
    memory.superseded_by = superseded_by;
    memory.obsoleted_at = Some(now);
    memory.updated_at = now;

    conn.execute(
        "UPDATE memories SET is_obsolete = 1, obsolete_reason = ?1, superseded_by = ?2, obsoleted_at = ?3, \
         updated_at = ?4 WHERE id = ?5",
        params![reason, superseded_by, now.to_rfc3339(), now.to_rfc3339(), id],
    )
    .await
    .map_err(internal)?;

    Ok(memory)
}

/// Order two scored memories for ranked results: score descending, then the
/// deterministic tie-break from spec §4.D (higher `importance`, then newer
/// `created_at`, then smaller `id`).
fn compare_scored(a: &ScoredMemory, b: &ScoredMemory) -> std::cmp::Ordering {
    b.score
        .partial_cmp(&a.score)
        .unwrap_or(std::cmp::Ordering::Equal)
        .then_with(|| b.memory.importance.cmp(&a.memory.importance))
        .then_with(|| b.memory.created_at.cmp(&a.memory.created_at))
        .then_with(|| a.memory.id.cmp(&b.memory.id))
}

fn project_filter_ok(memory: &Memory, project_ids: Option<&[Id]>) -> bool {
    match project_ids {
        None => true,
        Some(ids) => memory.project_ids.iter().any(|pid| ids.contains(pid)),
    }
}

fn exclude_filter_ok(memory: &Memory, exclude_ids: Option<&[Id]>) -> bool {
    match exclude_ids {
        None => true,
        Some(ids) => !ids.contains(&memory.id),
    }
}

pub(crate) async fn semantic_search(
    conn: &Connection,
    dimensions: usize,
    user_id: UserId,
    query_embedding: &[f32],
    k: usize,
    project_ids: Option<&[Id]>,
    importance_threshold: Option<u8>,
    exclude_ids: Option<&[Id]>,
) -> Result<Vec<ScoredMemory>> {
    check_dimensions(query_embedding, dimensions)?;
    let candidate_limit = (k.saturating_mul(OVERFETCH_FACTOR)).clamp(k.max(1), MAX_CANDIDATES);

    let importance_clause = match importance_threshold {
        Some(_) => " AND m.importance >= ?4",
        None => "",
    };
    let sql = format!(
        "SELECT {MEMORY_COLUMNS} FROM vector_top_k('memories_embedding_idx', vector32(?1), ?2) AS v \
         JOIN memories m ON m.id = v.id WHERE m.user_id = ?3 AND m.is_obsolete = 0{importance_clause}"
    );
    let mut bind: Vec<libsql::Value> = vec![
        libsql::Value::Text(encode_vector(query_embedding)),
        libsql::Value::Integer(candidate_limit as i64),
        libsql::Value::Text(user_id.to_string()),
    ];
    if let Some(threshold) = importance_threshold {
        bind.push(libsql::Value::Integer(i64::from(threshold)));
    }
    let mut rows = conn.query(&sql, libsql::params_from_iter(bind)).await.map_err(internal)?;

    let mut scored = Vec::new();
    while let Some(row) = rows.next().await.map_err(internal)? {
        let memory = row_to_memory(conn, &row).await?;
        if !project_filter_ok(&memory, project_ids) || !exclude_filter_ok(&memory, exclude_ids) {
            continue;
        }
        let score = cosine_similarity(query_embedding, &memory.embedding);
        scored.push(ScoredMemory { memory, score });
    }
    scored.sort_by(compare_scored);
    scored.truncate(k);
    Ok(scored)
}

pub(crate) async fn find_similar_memories(
    conn: &Connection,
    dimensions: usize,
    user_id: UserId,
    memory_id: Id,
    embedding: &[f32],
    k: usize,
) -> Result<Vec<ScoredMemory>> {
    check_dimensions(embedding, dimensions)?;
    let candidate_limit = ((k + 1).saturating_mul(OVERFETCH_FACTOR)).clamp(k.max(1), MAX_CANDIDATES);

    let sql = format!(
        "SELECT {MEMORY_COLUMNS} FROM vector_top_k('memories_embedding_idx', vector32(?1), ?2) AS v \
         JOIN memories m ON m.id = v.id WHERE m.user_id = ?3 AND m.is_obsolete = 0 AND m.id != ?4"
    );
    let mut rows = conn
        .query(&sql, params![encode_vector(embedding), candidate_limit as i64, user_id.to_string(), memory_id])
        .await
        .map_err(internal)?;

    let mut scored = Vec::new();
    while let Some(row) = rows.next().await.map_err(internal)? {
        let memory = row_to_memory(conn, &row).await?;
        let score = cosine_similarity(embedding, &memory.embedding);
        scored.push(ScoredMemory { memory, score });
    }
    scored.sort_by(compare_scored);
    scored.truncate(k);
    Ok(scored)
}

/// Scans the user's non-obsolete memories applying a term-hit count, same
/// ranking the embedded backend uses — fusion only consumes rank, not raw
/// score, so an FTS index buys precision this store doesn't need yet.
pub(crate) async fn lexical_search(
    conn: &Connection,
    user_id: UserId,
    query_text: &str,
    k: usize,
    project_ids: Option<&[Id]>,
    importance_threshold: Option<u8>,
    exclude_ids: Option<&[Id]>,
) -> Result<Vec<ScoredMemory>> {
    let needle = query_text.to_lowercase();
    let terms: Vec<&str> = needle.split_whitespace().collect();
    if terms.is_empty() {
        return Ok(Vec::new());
    }

    let mut clauses = Vec::new();
    let mut like_params: Vec<String> = Vec::new();
    for term in &terms {
        clauses.push(
            "(lower(title) LIKE ?1 OR lower(content) LIKE ?1 OR lower(context) LIKE ?1 OR \
             lower(keywords_json) LIKE ?1 OR lower(tags_json) LIKE ?1)"
                .replace('1', &like_params.len().to_string()),
        );
        like_params.push(format!("%{term}%"));
    }
    let where_terms = clauses.join(" OR ");
    let importance_clause = match importance_threshold {
        Some(_) => " AND m.importance >= ?",
        None => "",
    };
    let sql = format!(
        "SELECT {MEMORY_COLUMNS} FROM memories m WHERE m.user_id = ? AND m.is_obsolete = 0 AND ({where_terms}){importance_clause}"
    );

    let mut bind: Vec<libsql::Value> = vec![libsql::Value::Text(user_id.to_string())];
    bind.extend(like_params.into_iter().map(libsql::Value::Text));
    if let Some(threshold) = importance_threshold {
        bind.push(libsql::Value::Integer(i64::from(threshold)));
    }

    let mut rows = conn.query(&sql, libsql::params_from_iter(bind)).await.map_err(internal)?;

    let mut scored = Vec::new();
    while let Some(row) = rows.next().await.map_err(internal)? {
        let memory = row_to_memory(conn, &row).await?;
        if !project_filter_ok(&memory, project_ids) || !exclude_filter_ok(&memory, exclude_ids) {
            continue;
        }
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
            continue;
        }
        scored.push(ScoredMemory {
            memory,
            score: hits as f32,
        });
    }
    scored.sort_by(compare_scored);
    scored.truncate(k);
    Ok(scored)
}

pub(crate) async fn count_memories(conn: &Connection, user_id: UserId) -> Result<usize> {
    let mut rows = conn
        .query(
            "SELECT COUNT(*) FROM memories WHERE user_id = ?1 AND is_obsolete = 0",
            params![user_id.to_string()],
        )
        .await
        .map_err(internal)?;
    let row = rows.next().await.map_err(internal)?.ok_or_else(|| Error::Internal("count query returned no row".to_string()))?;
    Ok(usize::try_from(row_i64(&row, 0)?).map_err(internal)?)
}

pub(crate) async fn page_memories_for_reembed(
    conn: &Connection,
    user_id: UserId,
    after_id: Option<Id>,
    limit: usize,
) -> Result<Vec<Memory>> {
    let sql = format!(
        "SELECT {MEMORY_COLUMNS} FROM memories WHERE user_id = ?1 AND (?2 IS NULL OR id > ?2) ORDER BY id LIMIT ?3"
    );
    let mut rows = conn
        .query(&sql, params![user_id.to_string(), after_id, limit as i64])
        .await
        .map_err(internal)?;
    let mut out = Vec::new();
    while let Some(row) = rows.next().await.map_err(internal)? {
        out.push(row_to_memory(conn, &row).await?);
    }
    Ok(out)
}

pub(crate) async fn set_memory_embedding(conn: &Connection, dimensions: usize, user_id: UserId, id: Id, embedding: Vec<f32>) -> Result<()> {
    check_dimensions(&embedding, dimensions)?;
    let affected = conn
        .execute(
            "UPDATE memories SET embedding_json = ?1, embedding = vector32(?2) WHERE id = ?3 AND user_id = ?4",
            params![encode_json(&embedding)?, encode_vector(&embedding), id, user_id.to_string()],
        )
        .await
        .map_err(internal)?;
    if affected == 0 {
        return Err(Error::not_found("memory", id));
    }
    Ok(())
}

pub(crate) async fn reset_embedding_storage(conn: &Connection, user_id: UserId) -> Result<()> {
    conn.execute(
        "UPDATE memories SET embedding_json = '[]', embedding = NULL WHERE user_id = ?1",
        params![user_id.to_string()],
    )
    .await
    .map_err(internal)?;
    Ok(())
}

pub(crate) async fn bulk_update_embeddings(conn: &Connection, dimensions: usize, user_id: UserId, updates: &[(Id, Vec<f32>)]) -> Result<()> {
    let tx = conn.transaction().await.map_err(internal)?;
    for (id, embedding) in updates {
        check_dimensions(embedding, dimensions)?;
        let affected = tx
            .execute(
                "UPDATE memories SET embedding_json = ?1, embedding = vector32(?2) WHERE id = ?3 AND user_id = ?4",
                params![encode_json(embedding)?, encode_vector(embedding), *id, user_id.to_string()],
            )
            .await
            .map_err(internal)?;
        if affected == 0 {
            tx.rollback().await.map_err(internal)?;
            return Err(Error::not_found("memory", *id));
        }
    }
    tx.commit().await.map_err(internal)?;
    Ok(())
}
