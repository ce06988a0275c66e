//! Graph node/edge lookups backing subgraph traversal (spec §4.H).
//!
//! Unlike the embedded backend, associations here are real junction tables,
//! so each edge query is a single indexed join rather than a table scan.

use crate::util::{internal, row_i64, row_text};
use forgetful_core::error::{Error, Result};
use forgetful_core::graph::canonical_edge_id;
use forgetful_core::storage::{GraphEdgeRow, GraphNodeRow};
use forgetful_core::types::{Id, UserId};
use libsql::{params, Connection};

fn node_id(node_type: &str, id: Id) -> String {
    format!("{node_type}_{id}")
}

fn edge_row(edge_type: &str, a: &str, b: &str) -> GraphEdgeRow {
    GraphEdgeRow {
        edge_id: canonical_edge_id(edge_type, a, b),
        source_node_id: a.to_string(),
        target_node_id: b.to_string(),
        edge_type: edge_type.to_string(),
    }
}

async fn labeled_row(conn: &Connection, table: &str, label_col: &str, user_id: UserId, id: Id, node_type: &str) -> Result<String> {
    let sql = format!("SELECT user_id, {label_col} FROM {table} WHERE id = ?1");
    let mut rows = conn.query(&sql, params![id]).await.map_err(internal)?;
    let Some(row) = rows.next().await.map_err(internal)? else {
        return Err(Error::not_found(node_type, id));
    };
    let owner: UserId = row_text(&row, 0)?.parse().map_err(internal)?;
    if owner != user_id {
        return Err(Error::not_found(node_type, id));
    }
    row_text(&row, 1)
}

pub(crate) async fn fetch_node(conn: &Connection, user_id: UserId, node_type: &str, id: Id) -> Result<GraphNodeRow> {
    let label = match node_type {
        "memory" => labeled_row(conn, "memories", "title", user_id, id, "memory").await?,
        "entity" => labeled_row(conn, "entities", "name", user_id, id, "entity").await?,
        "project" => labeled_row(conn, "projects", "name", user_id, id, "project").await?,
        "document" => labeled_row(conn, "documents", "title", user_id, id, "document").await?,
        "code_artifact" => labeled_row(conn, "code_artifacts", "name", user_id, id, "code_artifact").await?,
        other => return Err(Error::validation("node_type", format!("unknown node type '{other}'"))),
    };
    Ok(GraphNodeRow {
        node_id: node_id(node_type, id),
        node_type: node_type.to_string(),
        label,
    })
}

async fn assert_owned(conn: &Connection, table: &str, user_id: UserId, id: Id, node_type: &str) -> Result<()> {
    labeled_row(conn, table, "id", user_id, id, node_type).await.map(|_| ())
}

pub(crate) async fn fetch_edges_for_node(conn: &Connection, user_id: UserId, node_type: &str, id: Id) -> Result<Vec<GraphEdgeRow>> {
    let this_node = node_id(node_type, id);
    let mut edges = Vec::new();

    match node_type {
        "memory" => {
            assert_owned(conn, "memories", user_id, id, "memory").await?;

            let mut rows = conn
                .query(
                    "SELECT source_id, target_id FROM memory_links WHERE user_id = ?1 AND (source_id = ?2 OR target_id = ?2)",
                    params![user_id.to_string(), id],
                )
                .await
                .map_err(internal)?;
            while let Some(row) = rows.next().await.map_err(internal)? {
                let source = row_i64(&row, 0)?;
                let target = row_i64(&row, 1)?;
                let other = if source == id { target } else { source };
                edges.push(edge_row("memory_link", &this_node, &node_id("memory", other)));
            }

            for (table, owner_col, other_col, other_type, edge_type) in [
                ("memory_projects", "memory_id", "project_id", "project", "memory_project"),
                ("memory_documents", "memory_id", "document_id", "document", "memory_document"),
                (
                    "memory_code_artifacts",
                    "memory_id",
                    "code_artifact_id",
                    "code_artifact",
                    "memory_code_artifact",
                ),
                ("memory_entities", "memory_id", "entity_id", "entity", "memory_entity"),
            ] {
                let sql = format!("SELECT {other_col} FROM {table} WHERE {owner_col} = ?1");
                let mut rows = conn.query(&sql, params![id]).await.map_err(internal)?;
                while let Some(row) = rows.next().await.map_err(internal)? {
                    let other_id = row_i64(&row, 0)?;
                    edges.push(edge_row(edge_type, &this_node, &node_id(other_type, other_id)));
                }
            }
        }
        "entity" => {
            assert_owned(conn, "entities", user_id, id, "entity").await?;

            let mut rows = conn
                .query("SELECT memory_id FROM memory_entities WHERE entity_id = ?1", params![id])
                .await
                .map_err(internal)?;
            while let Some(row) = rows.next().await.map_err(internal)? {
                let memory_id = row_i64(&row, 0)?;
                edges.push(edge_row("memory_entity", &node_id("memory", memory_id), &this_node));
            }

            let mut rows = conn
                .query(
                    "SELECT source_entity_id, target_entity_id, relationship_type FROM entity_relationships \
                     WHERE user_id = ?1 AND (source_entity_id = ?2 OR target_entity_id = ?2)",
                    params![user_id.to_string(), id],
                )
                .await
                .map_err(internal)?;
            while let Some(row) = rows.next().await.map_err(internal)? {
                let source = row_i64(&row, 0)?;
                let target = row_i64(&row, 1)?;
                let relationship_type = row_text(&row, 2)?;
                let other = if source == id { target } else { source };
                edges.push(edge_row(&relationship_type, &this_node, &node_id("entity", other)));
            }
        }
        "project" => {
            assert_owned(conn, "projects", user_id, id, "project").await?;

            for (table, owner_col, this_col, this_type, edge_type) in [
                ("memory_projects", "project_id", "memory_id", "memory", "memory_project"),
                ("document_projects", "project_id", "document_id", "document", "document_project"),
                (
                    "code_artifact_projects",
                    "project_id",
                    "code_artifact_id",
                    "code_artifact",
                    "code_artifact_project",
                ),
            ] {
                let sql = format!("SELECT {this_col} FROM {table} WHERE {owner_col} = ?1");
                let mut rows = conn.query(&sql, params![id]).await.map_err(internal)?;
                while let Some(row) = rows.next().await.map_err(internal)? {
                    let other_id = row_i64(&row, 0)?;
                    edges.push(edge_row(edge_type, &node_id(this_type, other_id), &this_node));
                }
            }
        }
        "document" => {
            assert_owned(conn, "documents", user_id, id, "document").await?;

            let mut rows = conn
                .query("SELECT memory_id FROM memory_documents WHERE document_id = ?1", params![id])
                .await
                .map_err(internal)?;
            while let Some(row) = rows.next().await.map_err(internal)? {
                let memory_id = row_i64(&row, 0)?;
                edges.push(edge_row("memory_document", &node_id("memory", memory_id), &this_node));
            }

            let mut rows = conn
                .query("SELECT project_id FROM document_projects WHERE document_id = ?1", params![id])
                .await
                .map_err(internal)?;
            while let Some(row) = rows.next().await.map_err(internal)? {
                let project_id = row_i64(&row, 0)?;
                edges.push(edge_row("document_project", &this_node, &node_id("project", project_id)));
            }
        }
        "code_artifact" => {
            assert_owned(conn, "code_artifacts", user_id, id, "code_artifact").await?;

            let mut rows = conn
                .query(
                    "SELECT memory_id FROM memory_code_artifacts WHERE code_artifact_id = ?1",
                    params![id],
                )
                .await
                .map_err(internal)?;
            while let Some(row) = rows.next().await.map_err(internal)? {
                let memory_id = row_i64(&row, 0)?;
                edges.push(edge_row("memory_code_artifact", &node_id("memory", memory_id), &this_node));
            }

            let mut rows = conn
                .query(
                    "SELECT project_id FROM code_artifact_projects WHERE code_artifact_id = ?1",
                    params![id],
                )
                .await
                .map_err(internal)?;
            while let Some(row) = rows.next().await.map_err(internal)? {
                let project_id = row_i64(&row, 0)?;
                edges.push(edge_row("code_artifact_project", &this_node, &node_id("project", project_id)));
            }
        }
        other => return Err(Error::validation("node_type", format!("unknown node type '{other}'"))),
    }

    Ok(edges)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_row_is_direction_independent() {
        let a = edge_row("memory_link", "memory_1", "memory_2");
        let b = edge_row("memory_link", "memory_2", "memory_1");
        assert_eq!(a.edge_id, b.edge_id);
    }
}
