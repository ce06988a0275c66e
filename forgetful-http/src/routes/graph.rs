//! `/api/v1/graph` — full-graph listing and subgraph traversal (spec §4.F, §6).

use crate::auth::AuthenticatedUser;
use crate::error::ApiError;
use crate::params;
use crate::state::AppState;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use forgetful_core::error::Error;
use forgetful_core::graph::{parse_node_id, NODE_TYPES};
use forgetful_core::storage::pagination::Page;
use forgetful_core::types::Id;
use std::collections::{HashMap, HashSet};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/graph", get(list_graph))
        .route("/api/v1/graph/subgraph", get(get_subgraph))
}

struct ListedNode {
    node_id: String,
    node_type: &'static str,
    label: String,
}

/// `GET /api/v1/graph`: a flat, paginated listing of a user's graph nodes
/// (memories plus, when requested, entities/projects/documents/code
/// artifacts) and the edges among the returned page, for clients that want
/// to render the whole graph rather than traverse from a center node.
async fn list_graph(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let page = params::parse_pagination(&query)?;
    let include_entities = params::parse_bool(&query, "include_entities", false)?;
    let project_id = params::parse_usize(&query, "project_id")?.map(|v| v as Id);
    let sort_by = params::parse_enum(&query, "sort_by", &["node_id", "node_type", "label"], "node_id")?;
    let sort_order = params::parse_enum(&query, "sort_order", &["asc", "desc"], "asc")?;
    let node_types = params::parse_csv(&query, "node_types");

    let wanted_types: Vec<&'static str> = match &node_types {
        Some(requested) => {
            let mut out = Vec::with_capacity(requested.len());
            for t in requested {
                let matched = NODE_TYPES
                    .iter()
                    .find(|nt| **nt == t.as_str())
                    .ok_or_else(|| ApiError(Error::validation("node_types", format!("'{t}' is not a known node type"))))?;
                out.push(*matched);
            }
            out
        }
        None => {
            let mut out = vec!["memory"];
            if include_entities {
                out.push("entity");
            }
            out
        }
    };
    let wants = |node_type: &str| wanted_types.contains(&node_type);

    let mut nodes = Vec::new();

    if wants("memory") {
        let mut after: Option<Id> = None;
        loop {
            let batch = state.storage.page_memories_for_reembed(user_id, after, 200).await?;
            if batch.is_empty() {
                break;
            }
            after = batch.last().map(|m| m.id);
            let done = batch.len() < 200;
            for memory in &batch {
                if memory.is_obsolete {
                    continue;
                }
                if project_id.is_some_and(|pid| !memory.project_ids.contains(&pid)) {
                    continue;
                }
                nodes.push(ListedNode {
                    node_id: format!("memory_{}", memory.id),
                    node_type: "memory",
                    label: memory.title.clone(),
                });
            }
            if done {
                break;
            }
        }
    }

    if wants("entity") {
        let mut offset = 0;
        loop {
            let batch = state.storage.list_entities(user_id, Page::new(offset, 100)).await?;
            if batch.is_empty() {
                break;
            }
            let done = batch.len() < 100;
            offset += batch.len();
            for entity in batch {
                nodes.push(ListedNode {
                    node_id: format!("entity_{}", entity.id),
                    node_type: "entity",
                    label: entity.name,
                });
            }
            if done {
                break;
            }
        }
    }

    if wants("project") {
        let mut offset = 0;
        loop {
            let batch = state.storage.list_projects(user_id, Page::new(offset, 100)).await?;
            if batch.is_empty() {
                break;
            }
            let done = batch.len() < 100;
            offset += batch.len();
            for project in batch {
                if project_id.is_some_and(|pid| project.id != pid) {
                    continue;
                }
                nodes.push(ListedNode {
                    node_id: format!("project_{}", project.id),
                    node_type: "project",
                    label: project.name,
                });
            }
            if done {
                break;
            }
        }
    }

    if wants("document") {
        let mut offset = 0;
        loop {
            let batch = state.storage.list_documents(user_id, Page::new(offset, 100)).await?;
            if batch.is_empty() {
                break;
            }
            let done = batch.len() < 100;
            offset += batch.len();
            for document in batch {
                if project_id.is_some_and(|pid| !document.project_ids.contains(&pid)) {
                    continue;
                }
                nodes.push(ListedNode {
                    node_id: format!("document_{}", document.id),
                    node_type: "document",
                    label: document.title,
                });
            }
            if done {
                break;
            }
        }
    }

    if wants("code_artifact") {
        let mut offset = 0;
        loop {
            let batch = state.storage.list_code_artifacts(user_id, Page::new(offset, 100)).await?;
            if batch.is_empty() {
                break;
            }
            let done = batch.len() < 100;
            offset += batch.len();
            for artifact in batch {
                if project_id.is_some_and(|pid| !artifact.project_ids.contains(&pid)) {
                    continue;
                }
                nodes.push(ListedNode {
                    node_id: format!("code_artifact_{}", artifact.id),
                    node_type: "code_artifact",
                    label: artifact.name,
                });
            }
            if done {
                break;
            }
        }
    }

    nodes.sort_by(|a, b| {
        let ord = match sort_by {
            "node_type" => a.node_type.cmp(b.node_type),
            "label" => a.label.cmp(&b.label),
            _ => a.node_id.cmp(&b.node_id),
        };
        if sort_order == "desc" {
            ord.reverse()
        } else {
            ord
        }
    });

    let total = nodes.len();
    let page_nodes: Vec<ListedNode> = nodes.into_iter().skip(page.offset).take(page.limit).collect();

    let kept_ids: HashSet<&str> = page_nodes.iter().map(|n| n.node_id.as_str()).collect();
    let mut edges = Vec::new();
    let mut seen_edge_ids = HashSet::new();
    for node in &page_nodes {
        let (node_type, id) = parse_node_id(&node.node_id)?;
        for edge in state.storage.fetch_edges_for_node(user_id, node_type, id).await? {
            if !kept_ids.contains(edge.source_node_id.as_str()) || !kept_ids.contains(edge.target_node_id.as_str()) {
                continue;
            }
            if !seen_edge_ids.insert(edge.edge_id.clone()) {
                continue;
            }
            edges.push(serde_json::json!({
                "edge_id": edge.edge_id,
                "source_node_id": edge.source_node_id,
                "target_node_id": edge.target_node_id,
                "edge_type": edge.edge_type,
            }));
        }
    }

    Ok(Json(serde_json::json!({
        "nodes": page_nodes.iter().map(|n| serde_json::json!({
            "node_id": n.node_id,
            "node_type": n.node_type,
            "label": n.label,
        })).collect::<Vec<_>>(),
        "edges": edges,
        "meta": {
            "total": total,
            "offset": page.offset,
            "limit": page.limit,
        },
    })))
}

async fn get_subgraph(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let center = query
        .get("node_id")
        .cloned()
        .ok_or_else(|| ApiError(Error::validation("node_id", "is required")))?;
    let depth = params::parse_u8(&query, "depth")?.unwrap_or(2);
    let max_nodes = params::parse_usize(&query, "max_nodes")?.unwrap_or(100);
    let node_types = params::parse_csv(&query, "node_types");

    let allowed: Vec<&str> = match &node_types {
        None => Vec::new(),
        Some(types) => {
            let mut out = Vec::with_capacity(types.len());
            for t in types {
                let matched = NODE_TYPES
                    .iter()
                    .find(|nt| **nt == t.as_str())
                    .ok_or_else(|| ApiError(Error::validation("node_types", format!("'{t}' is not a known node type"))))?;
                out.push(*matched);
            }
            out
        }
    };
    let filter = if allowed.is_empty() { None } else { Some(allowed.as_slice()) };

    let subgraph = state.graph.get_subgraph(user_id, &center, depth, filter, max_nodes).await?;

    Ok(Json(serde_json::json!({
        "nodes": subgraph.nodes.iter().map(|n| serde_json::json!({
            "node_id": n.node_id,
            "node_type": n.node_type,
            "label": n.label,
            "depth": n.depth,
        })).collect::<Vec<_>>(),
        "edges": subgraph.edges.iter().map(|e| serde_json::json!({
            "edge_id": e.edge_id,
            "source_node_id": e.source_node_id,
            "target_node_id": e.target_node_id,
            "edge_type": e.edge_type,
        })).collect::<Vec<_>>(),
        "truncated": subgraph.truncated,
    })))
}
