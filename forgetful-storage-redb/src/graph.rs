//! Graph node/edge lookups backing subgraph traversal (spec §4.F).
//!
//! Associations are inlined as `Vec<Id>` fields rather than true junction
//! tables (see `cascade.rs`), so an "edge" here is reconstructed by scanning
//! the table on the other side of the association rather than following a
//! foreign key index.

use crate::tables::{
    id_key, CODE_ARTIFACTS_TABLE, DOCUMENTS_TABLE, ENTITIES_TABLE, ENTITY_RELATIONSHIPS_TABLE,
    MEMORIES_TABLE, MEMORY_LINKS_TABLE, PROJECTS_TABLE,
};
use crate::util::{decode_row, internal};
use forgetful_core::error::{Error, Result};
use forgetful_core::graph::canonical_edge_id;
use forgetful_core::storage::{GraphEdgeRow, GraphNodeRow};
use forgetful_core::types::{
    CodeArtifact, Document, Entity, EntityRelationship, Id, Memory, MemoryLink, Project, UserId,
};
use redb::{Database, ReadableTable};

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

pub(crate) fn fetch_node(db: &Database, user_id: UserId, node_type: &str, id: Id) -> Result<GraphNodeRow> {
    let txn = db.begin_read().map_err(internal)?;
    let label = match node_type {
        "memory" => {
            let table = txn.open_table(MEMORIES_TABLE).map_err(internal)?;
            let bytes = table
                .get(id_key(id).as_str())
                .map_err(internal)?
                .ok_or_else(|| Error::not_found("memory", id))?;
            let memory: Memory = decode_row(bytes.value())?;
            if memory.user_id != user_id {
                return Err(Error::not_found("memory", id));
            }
            memory.title
        }
        "entity" => {
            let table = txn.open_table(ENTITIES_TABLE).map_err(internal)?;
            let bytes = table
                .get(id_key(id).as_str())
                .map_err(internal)?
                .ok_or_else(|| Error::not_found("entity", id))?;
            let entity: Entity = decode_row(bytes.value())?;
            if entity.user_id != user_id {
                return Err(Error::not_found("entity", id));
            }
            entity.name
        }
        "project" => {
            let table = txn.open_table(PROJECTS_TABLE).map_err(internal)?;
            let bytes = table
                .get(id_key(id).as_str())
                .map_err(internal)?
                .ok_or_else(|| Error::not_found("project", id))?;
            let project: Project = decode_row(bytes.value())?;
            if project.user_id != user_id {
                return Err(Error::not_found("project", id));
            }
            project.name
        }
        "document" => {
            let table = txn.open_table(DOCUMENTS_TABLE).map_err(internal)?;
            let bytes = table
                .get(id_key(id).as_str())
                .map_err(internal)?
                .ok_or_else(|| Error::not_found("document", id))?;
            let document: Document = decode_row(bytes.value())?;
            if document.user_id != user_id {
                return Err(Error::not_found("document", id));
            }
            document.title
        }
        "code_artifact" => {
            let table = txn.open_table(CODE_ARTIFACTS_TABLE).map_err(internal)?;
            let bytes = table
                .get(id_key(id).as_str())
                .map_err(internal)?
                .ok_or_else(|| Error::not_found("code_artifact", id))?;
            let artifact: CodeArtifact = decode_row(bytes.value())?;
            if artifact.user_id != user_id {
                return Err(Error::not_found("code_artifact", id));
            }
            artifact.name
        }
        other => return Err(Error::validation("node_type", format!("unknown node type '{other}'"))),
    };
    Ok(GraphNodeRow {
        node_id: node_id(node_type, id),
        node_type: node_type.to_string(),
        label,
    })
}

pub(crate) fn fetch_edges_for_node(
    db: &Database,
    user_id: UserId,
    node_type: &str,
    id: Id,
) -> Result<Vec<GraphEdgeRow>> {
    let this_node = node_id(node_type, id);
    let txn = db.begin_read().map_err(internal)?;
    let mut edges = Vec::new();

    match node_type {
        "memory" => {
            let links_table = txn.open_table(MEMORY_LINKS_TABLE).map_err(internal)?;
            for entry in links_table.iter().map_err(internal)? {
                let (_key, value) = entry.map_err(internal)?;
                let link: MemoryLink = decode_row(value.value())?;
                if link.user_id != user_id {
                    continue;
                }
                let other = if link.source_id == id {
                    Some(link.target_id)
                } else if link.target_id == id {
                    Some(link.source_id)
                } else {
                    None
                };
                if let Some(other) = other {
                    edges.push(edge_row("memory_link", &this_node, &node_id("memory", other)));
                }
            }

            let memories_table = txn.open_table(MEMORIES_TABLE).map_err(internal)?;
            let bytes = memories_table
                .get(id_key(id).as_str())
                .map_err(internal)?
                .ok_or_else(|| Error::not_found("memory", id))?;
            let memory: Memory = decode_row(bytes.value())?;
            if memory.user_id != user_id {
                return Err(Error::not_found("memory", id));
            }
            for project_id in &memory.project_ids {
                edges.push(edge_row("memory_project", &this_node, &node_id("project", *project_id)));
            }
            for document_id in &memory.document_ids {
                edges.push(edge_row("memory_document", &this_node, &node_id("document", *document_id)));
            }
            for artifact_id in &memory.code_artifact_ids {
                edges.push(edge_row(
                    "memory_code_artifact",
                    &this_node,
                    &node_id("code_artifact", *artifact_id),
                ));
            }
            for entity_id in &memory.entity_ids {
                edges.push(edge_row("memory_entity", &this_node, &node_id("entity", *entity_id)));
            }
        }
        "entity" => {
            let memories_table = txn.open_table(MEMORIES_TABLE).map_err(internal)?;
            for entry in memories_table.iter().map_err(internal)? {
                let (_key, value) = entry.map_err(internal)?;
                let memory: Memory = decode_row(value.value())?;
                if memory.user_id == user_id && memory.entity_ids.contains(&id) {
                    edges.push(edge_row("memory_entity", &node_id("memory", memory.id), &this_node));
                }
            }

            let relationships_table = txn.open_table(ENTITY_RELATIONSHIPS_TABLE).map_err(internal)?;
            for entry in relationships_table.iter().map_err(internal)? {
                let (_key, value) = entry.map_err(internal)?;
                let relationship: EntityRelationship = decode_row(value.value())?;
                if relationship.user_id != user_id {
                    continue;
                }
                let other = if relationship.source_entity_id == id {
                    Some(relationship.target_entity_id)
                } else if relationship.target_entity_id == id {
                    Some(relationship.source_entity_id)
                } else {
                    None
                };
                if let Some(other) = other {
                    edges.push(edge_row(
                        &relationship.relationship_type,
                        &this_node,
                        &node_id("entity", other),
                    ));
                }
            }
        }
        "project" => {
            let memories_table = txn.open_table(MEMORIES_TABLE).map_err(internal)?;
            for entry in memories_table.iter().map_err(internal)? {
                let (_key, value) = entry.map_err(internal)?;
                let memory: Memory = decode_row(value.value())?;
                if memory.user_id == user_id && memory.project_ids.contains(&id) {
                    edges.push(edge_row("memory_project", &node_id("memory", memory.id), &this_node));
                }
            }

            let documents_table = txn.open_table(DOCUMENTS_TABLE).map_err(internal)?;
            for entry in documents_table.iter().map_err(internal)? {
                let (_key, value) = entry.map_err(internal)?;
                let document: Document = decode_row(value.value())?;
                if document.user_id == user_id && document.project_ids.contains(&id) {
                    edges.push(edge_row(
                        "document_project",
                        &node_id("document", document.id),
                        &this_node,
                    ));
                }
            }

            let artifacts_table = txn.open_table(CODE_ARTIFACTS_TABLE).map_err(internal)?;
            for entry in artifacts_table.iter().map_err(internal)? {
                let (_key, value) = entry.map_err(internal)?;
                let artifact: CodeArtifact = decode_row(value.value())?;
                if artifact.user_id == user_id && artifact.project_ids.contains(&id) {
                    edges.push(edge_row(
                        "code_artifact_project",
                        &node_id("code_artifact", artifact.id),
                        &this_node,
                    ));
                }
            }
        }
        "document" => {
            let memories_table = txn.open_table(MEMORIES_TABLE).map_err(internal)?;
            for entry in memories_table.iter().map_err(internal)? {
                let (_key, value) = entry.map_err(internal)?;
                let memory: Memory = decode_row(value.value())?;
                if memory.user_id == user_id && memory.document_ids.contains(&id) {
                    edges.push(edge_row("memory_document", &node_id("memory", memory.id), &this_node));
                }
            }

            let documents_table = txn.open_table(DOCUMENTS_TABLE).map_err(internal)?;
            let bytes = documents_table
                .get(id_key(id).as_str())
                .map_err(internal)?
                .ok_or_else(|| Error::not_found("document", id))?;
            let document: Document = decode_row(bytes.value())?;
            if document.user_id != user_id {
                return Err(Error::not_found("document", id));
            }
            for project_id in &document.project_ids {
                edges.push(edge_row("document_project", &this_node, &node_id("project", *project_id)));
            }
        }
        "code_artifact" => {
            let memories_table = txn.open_table(MEMORIES_TABLE).map_err(internal)?;
            for entry in memories_table.iter().map_err(internal)? {
                let (_key, value) = entry.map_err(internal)?;
                let memory: Memory = decode_row(value.value())?;
                if memory.user_id == user_id && memory.code_artifact_ids.contains(&id) {
                    edges.push(edge_row(
                        "memory_code_artifact",
                        &node_id("memory", memory.id),
                        &this_node,
                    ));
                }
            }

            let artifacts_table = txn.open_table(CODE_ARTIFACTS_TABLE).map_err(internal)?;
            let bytes = artifacts_table
                .get(id_key(id).as_str())
                .map_err(internal)?
                .ok_or_else(|| Error::not_found("code_artifact", id))?;
            let artifact: CodeArtifact = decode_row(bytes.value())?;
            if artifact.user_id != user_id {
                return Err(Error::not_found("code_artifact", id));
            }
            for project_id in &artifact.project_ids {
                edges.push(edge_row(
                    "code_artifact_project",
                    &this_node,
                    &node_id("project", *project_id),
                ));
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
