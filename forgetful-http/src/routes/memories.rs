//! `/api/v1/memories` — CRUD, search, and linking (spec §4, §6).

use crate::auth::AuthenticatedUser;
use crate::error::ApiError;
use crate::params;
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use forgetful_core::activity::{ActivityBus, ActivityEvent, ActivityKind};
use forgetful_core::types::memory::{build_embedding_text, validate_create, MemoryLinkRequest};
use forgetful_core::types::{Id, Memory, MemoryCreate, MemoryQueryRequest, MemoryUpdate, UserId};
use serde::Serialize;
use std::collections::HashMap;

fn publish(activity: &ActivityBus, user_id: UserId, entity_id: Option<Id>, kind: ActivityKind) {
    activity.publish(ActivityEvent {
        user_id,
        entity_type: "memory",
        entity_id,
        kind,
        timestamp: Utc::now(),
    });
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/memories", get(list_memories).post(create_memory))
        .route(
            "/api/v1/memories/{id}",
            get(get_memory).put(update_memory).delete(obsolete_memory),
        )
        .route("/api/v1/memories/search", post(search_memories))
        .route(
            "/api/v1/memories/{id}/links",
            get(get_links).post(create_links),
        )
}

/// A [`Memory`] without its embedding vector — clients never need the raw
/// floats, and shipping them would bloat every response by one vector's
/// worth of JSON.
#[derive(Serialize)]
struct MemoryResponse {
    id: Id,
    title: String,
    content: String,
    context: String,
    keywords: Vec<String>,
    tags: Vec<String>,
    importance: u8,
    project_ids: Vec<Id>,
    code_artifact_ids: Vec<Id>,
    document_ids: Vec<Id>,
    entity_ids: Vec<Id>,
    is_obsolete: bool,
    obsolete_reason: Option<String>,
    superseded_by: Option<Id>,
    obsoleted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    linked_memory_ids: Vec<Id>,
}

impl From<Memory> for MemoryResponse {
    fn from(m: Memory) -> Self {
        Self {
            id: m.id,
            title: m.title,
            content: m.content,
            context: m.context,
            keywords: m.keywords,
            tags: m.tags,
            importance: m.importance,
            project_ids: m.project_ids,
            code_artifact_ids: m.code_artifact_ids,
            document_ids: m.document_ids,
            entity_ids: m.entity_ids,
            is_obsolete: m.is_obsolete,
            obsolete_reason: m.obsolete_reason,
            superseded_by: m.superseded_by,
            obsoleted_at: m.obsoleted_at,
            created_at: m.created_at,
            updated_at: m.updated_at,
            linked_memory_ids: m.linked_memory_ids,
        }
    }
}

#[derive(Serialize)]
struct CreateMemoryResponse {
    #[serde(flatten)]
    memory: MemoryResponse,
    similar_memories: Vec<Id>,
}

async fn create_memory(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Json(data): Json<MemoryCreate>,
) -> Result<Json<CreateMemoryResponse>, ApiError> {
    validate_create(&data, &state.config.memory)?;

    let text = build_embedding_text(&data.title, &data.content, &data.context, &data.keywords, &data.tags);
    let embedding = state.embeddings.embed(&text).await?;

    let created = state.storage.create_memory(user_id, &data, embedding.clone()).await?;

    let similar = state
        .linker
        .auto_link(user_id, created.id, &embedding, state.config.memory.num_auto_link)
        .await;

    publish(&state.activity, user_id, Some(created.id), ActivityKind::Created);

    let refetched = state.storage.get_memory(user_id, created.id).await?;

    Ok(Json(CreateMemoryResponse {
        memory: refetched.into(),
        similar_memories: similar,
    }))
}

async fn get_memory(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Path(id): Path<Id>,
) -> Result<Json<MemoryResponse>, ApiError> {
    if state.config.activity_track_reads {
        publish(&state.activity, user_id, Some(id), ActivityKind::Queried);
    }
    let memory = state.storage.get_memory(user_id, id).await?;
    Ok(Json(memory.into()))
}

async fn update_memory(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Path(id): Path<Id>,
    Json(update): Json<MemoryUpdate>,
) -> Result<Json<MemoryResponse>, ApiError> {
    let new_embedding = if update.search_fields_changed() {
        let current = state.storage.get_memory(user_id, id).await?;
        let title = update.title.as_deref().unwrap_or(&current.title);
        let content = update.content.as_deref().unwrap_or(&current.content);
        let context = update.context.as_deref().unwrap_or(&current.context);
        let keywords = update.keywords.as_ref().unwrap_or(&current.keywords);
        let tags = update.tags.as_ref().unwrap_or(&current.tags);
        let text = build_embedding_text(title, content, context, keywords, tags);
        Some(state.embeddings.embed(&text).await?)
    } else {
        None
    };

    let updated = state.storage.update_memory(user_id, id, &update, new_embedding).await?;
    publish(&state.activity, user_id, Some(id), ActivityKind::Updated);
    Ok(Json(updated.into()))
}

#[derive(serde::Deserialize)]
struct ObsoleteBody {
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    superseded_by: Option<Id>,
}

async fn obsolete_memory(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Path(id): Path<Id>,
    body: Option<Json<ObsoleteBody>>,
) -> Result<Json<MemoryResponse>, ApiError> {
    let Json(body) = body.unwrap_or(Json(ObsoleteBody { reason: None, superseded_by: None }));
    let memory = state
        .storage
        .mark_memory_obsolete(user_id, id, body.reason, body.superseded_by)
        .await?;
    publish(&state.activity, user_id, Some(id), ActivityKind::Obsoleted);
    Ok(Json(memory.into()))
}

#[derive(Serialize)]
struct MemoryQueryResultResponse {
    query: String,
    primary_memories: Vec<MemoryResponse>,
    linked_memories: Vec<LinkedMemoryResponse>,
    total_count: usize,
    token_count: usize,
    truncated: bool,
}

#[derive(Serialize)]
struct LinkedMemoryResponse {
    #[serde(flatten)]
    memory: MemoryResponse,
    link_source_id: Id,
}

async fn search_memories(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Json(request): Json<MemoryQueryRequest>,
) -> Result<Json<MemoryQueryResultResponse>, ApiError> {
    let result = state.pipeline.query(user_id, &request, &state.config.memory).await?;
    publish(&state.activity, user_id, None, ActivityKind::Queried);

    Ok(Json(MemoryQueryResultResponse {
        query: result.query,
        primary_memories: result.primary_memories.into_iter().map(Into::into).collect(),
        linked_memories: result
            .linked_memories
            .into_iter()
            .map(|l| LinkedMemoryResponse {
                memory: l.memory.into(),
                link_source_id: l.link_source_id,
            })
            .collect(),
        total_count: result.total_count,
        token_count: result.token_count,
        truncated: result.truncated,
    }))
}

async fn create_links(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Path(id): Path<Id>,
    Json(mut request): Json<MemoryLinkRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    request.memory_id = id;
    let count = state.linker.link_memories(user_id, id, &request.related_ids).await?;
    publish(&state.activity, user_id, Some(id), ActivityKind::Linked);
    Ok(Json(serde_json::json!({ "linked_count": count })))
}

async fn get_links(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Path(id): Path<Id>,
) -> Result<Json<Vec<MemoryResponse>>, ApiError> {
    let linked = state.storage.get_linked_memories(user_id, &[id], usize::MAX).await?;
    Ok(Json(linked.into_iter().map(|(_, m)| m.into()).collect()))
}

/// Listing filters. There is no dedicated storage-layer "list memories"
/// query (unlike projects/documents/entities, which page directly) — the
/// only full-scan primitive over memories is the re-embed orchestrator's
/// id-ordered cursor, which this reuses, filtering/sorting/paginating in
/// process. Acceptable for a per-user memory store's expected scale; a
/// backend wanting this pushed down can add a dedicated storage method.
async fn list_memories(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let page = params::parse_pagination(&query)?;
    let include_obsolete = params::parse_bool(&query, "include_obsolete", false)?;
    let importance_min = params::parse_u8(&query, "importance_min")?;
    let project_id = params::parse_usize(&query, "project_id")?.map(|v| v as Id);
    let tags = params::parse_csv(&query, "tags");
    let sort_by = params::parse_enum(&query, "sort_by", &["created_at", "updated_at", "importance"], "created_at")?;
    let sort_order = params::parse_enum(&query, "sort_order", &["asc", "desc"], "desc")?;

    let mut all = Vec::new();
    let mut after: Option<Id> = None;
    loop {
        let batch = state.storage.page_memories_for_reembed(user_id, after, 200).await?;
        if batch.is_empty() {
            break;
        }
        after = batch.last().map(|m| m.id);
        let done = batch.len() < 200;
        all.extend(batch);
        if done {
            break;
        }
    }

    all.retain(|m| include_obsolete || !m.is_obsolete);
    if let Some(min) = importance_min {
        all.retain(|m| m.importance >= min);
    }
    if let Some(pid) = project_id {
        all.retain(|m| m.project_ids.contains(&pid));
    }
    if let Some(ref tags) = tags {
        all.retain(|m| tags.iter().any(|t| m.tags.contains(t)));
    }

    all.sort_by(|a, b| {
        let ord = match sort_by {
            "updated_at" => a.updated_at.cmp(&b.updated_at),
            "importance" => a.importance.cmp(&b.importance),
            _ => a.created_at.cmp(&b.created_at),
        };
        if sort_order == "desc" {
            ord.reverse()
        } else {
            ord
        }
    });

    let total = all.len();
    let page_items: Vec<MemoryResponse> = all
        .into_iter()
        .skip(page.offset)
        .take(page.limit)
        .map(Into::into)
        .collect();

    Ok(Json(serde_json::json!({
        "total": total,
        "offset": page.offset,
        "limit": page.limit,
        "memories": page_items,
    })))
}
