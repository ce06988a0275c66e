//! Subgraph traversal: BFS expansion from a center node across the
//! memory/entity/project/document/code_artifact graph (spec §4.F).

use crate::constants::{GRAPH_DEPTH_MAX, GRAPH_DEPTH_MIN, GRAPH_MAX_NODES_MAX, GRAPH_MAX_NODES_MIN};
use crate::error::{Error, Result};
use crate::storage::{GraphEdgeRow, GraphNodeRow, StorageBackend};
use crate::types::{Id, UserId};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

/// The five node kinds a graph node id can reference.
pub const NODE_TYPES: [&str; 5] = ["memory", "entity", "project", "document", "code_artifact"];

/// A node in a returned subgraph.
#[derive(Debug, Clone, PartialEq)]
pub struct SubgraphNode {
    pub node_id: String,
    pub node_type: String,
    pub label: String,
    pub depth: u8,
}

/// An edge in a returned subgraph, with a canonical, order-independent id.
#[derive(Debug, Clone, PartialEq)]
pub struct SubgraphEdge {
    pub edge_id: String,
    pub source_node_id: String,
    pub target_node_id: String,
    pub edge_type: String,
}

/// Subgraph traversal result plus bookkeeping metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct SubgraphResponse {
    pub nodes: Vec<SubgraphNode>,
    pub edges: Vec<SubgraphEdge>,
    pub truncated: bool,
}

/// Parse a `"{type}_{id}"` node id (e.g. `"memory_123"`).
///
/// # Errors
///
/// Returns [`Error::Validation`] if the prefix isn't one of
/// [`NODE_TYPES`] or the suffix isn't a valid [`Id`].
pub fn parse_node_id(node_id: &str) -> Result<(&'static str, Id)> {
    for node_type in NODE_TYPES {
        if let Some(rest) = node_id.strip_prefix(node_type).and_then(|r| r.strip_prefix('_')) {
            let id: Id = rest
                .parse()
                .map_err(|_| Error::validation("node_id", format!("invalid id in '{node_id}'")))?;
            return Ok((node_type, id));
        }
    }
    Err(Error::validation(
        "node_id",
        format!("'{node_id}' does not match any of {NODE_TYPES:?}"),
    ))
}

/// Canonical, order-independent edge id: the two endpoint node ids sorted by
/// their numeric id (not string order — `"memory_9"` must sort before
/// `"memory_10"`) and joined with the edge type, so a traversal from either
/// direction produces the same id.
#[must_use]
pub fn canonical_edge_id(edge_type: &str, a: &str, b: &str) -> String {
    let (low, high) = match (parse_node_id(a), parse_node_id(b)) {
        (Ok((_, id_a)), Ok((_, id_b))) if id_a <= id_b => (a, b),
        (Ok(_), Ok(_)) => (b, a),
        _ => {
            if a <= b {
                (a, b)
            } else {
                (b, a)
            }
        }
    };
    format!("{edge_type}_{low}_{high}")
}

/// BFS subgraph traversal over the storage backend's node/edge
/// primitives.
pub struct GraphTraversal {
    storage: Arc<dyn StorageBackend>,
}

impl GraphTraversal {
    #[must_use]
    pub fn new(storage: Arc<dyn StorageBackend>) -> Self {
        Self { storage }
    }

    /// Expand the subgraph centered on `center_node_id` out to `depth` hops,
    /// restricted to `node_type_filter` if given, capped at `max_nodes`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for a malformed `center_node_id`, or
    /// [`Error::NotFound`] if the center node doesn't exist.
    pub async fn get_subgraph(
        &self,
        user_id: UserId,
        center_node_id: &str,
        depth: u8,
        node_type_filter: Option<&[&str]>,
        max_nodes: usize,
    ) -> Result<SubgraphResponse> {
        let (center_type, center_id) = parse_node_id(center_node_id)?;
        self.storage.fetch_node(user_id, center_type, center_id).await?;

        let depth = depth.clamp(GRAPH_DEPTH_MIN, GRAPH_DEPTH_MAX);
        let max_nodes = max_nodes.clamp(GRAPH_MAX_NODES_MIN, GRAPH_MAX_NODES_MAX);

        let mut visited: HashSet<String> = HashSet::new();
        visited.insert(center_node_id.to_string());

        let mut node_rows: Vec<(GraphNodeRow, u8)> = Vec::new();
        let mut edge_rows: Vec<GraphEdgeRow> = Vec::new();
        let mut truncated = false;

        let mut frontier: VecDeque<(String, &'static str, Id, u8)> = VecDeque::new();
        frontier.push_back((center_node_id.to_string(), center_type, center_id, 0));

        while let Some((node_id, node_type, id, current_depth)) = frontier.pop_front() {
            let row = self.storage.fetch_node(user_id, node_type, id).await?;
            node_rows.push((row, current_depth));

            if visited.len() >= max_nodes {
                truncated = true;
                break;
            }

            if current_depth >= depth {
                continue;
            }

            let edges = self.storage.fetch_edges_for_node(user_id, node_type, id).await?;
            for edge in edges {
                let neighbor_node_id = if edge.source_node_id == node_id {
                    edge.target_node_id.clone()
                } else {
                    edge.source_node_id.clone()
                };

                let Ok((neighbor_type, neighbor_id)) = parse_node_id(&neighbor_node_id) else {
                    continue;
                };

                // Edges restricted to allowed target types (spec §4.F step 3):
                // a type excluded from node_type_filter is neither traversed
                // into nor surfaced as an edge endpoint.
                if !node_type_filter.is_none_or(|types| types.contains(&neighbor_type)) {
                    continue;
                }

                edge_rows.push(edge.clone());

                if visited.contains(&neighbor_node_id) {
                    continue;
                }
                if visited.len() >= max_nodes {
                    truncated = true;
                    continue;
                }
                visited.insert(neighbor_node_id.clone());
                frontier.push_back((neighbor_node_id, neighbor_type, neighbor_id, current_depth + 1));
            }
        }

        if !frontier.is_empty() {
            truncated = true;
        }

        let kept_ids: HashSet<&String> = node_rows.iter().map(|(row, _)| &row.node_id).collect();
        let mut seen_edge_ids = HashSet::new();
        let edges = edge_rows
            .into_iter()
            .filter(|e| kept_ids.contains(&e.source_node_id) && kept_ids.contains(&e.target_node_id))
            .filter(|e| seen_edge_ids.insert(e.edge_id.clone()))
            .map(|e| SubgraphEdge {
                edge_id: e.edge_id,
                source_node_id: e.source_node_id,
                target_node_id: e.target_node_id,
                edge_type: e.edge_type,
            })
            .collect();

        let nodes = node_rows
            .into_iter()
            .map(|(row, depth)| SubgraphNode {
                node_id: row.node_id,
                node_type: row.node_type,
                label: row.label,
                depth,
            })
            .collect();

        Ok(SubgraphResponse {
            nodes,
            edges,
            truncated,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_node_id() {
        assert_eq!(parse_node_id("memory_42").unwrap(), ("memory", 42));
        assert_eq!(parse_node_id("code_artifact_7").unwrap(), ("code_artifact", 7));
    }

    #[test]
    fn rejects_unknown_prefix() {
        assert!(parse_node_id("widget_1").is_err());
    }

    #[test]
    fn rejects_non_numeric_suffix() {
        assert!(parse_node_id("memory_abc").is_err());
    }

    #[test]
    fn canonical_edge_id_is_direction_independent() {
        let a = canonical_edge_id("memory_link", "memory_1", "memory_2");
        let b = canonical_edge_id("memory_link", "memory_2", "memory_1");
        assert_eq!(a, b);
    }

    #[test]
    fn canonical_edge_id_orders_numerically_not_lexically() {
        let from_high_first = canonical_edge_id("memory_link", "memory_10", "memory_9");
        let from_low_first = canonical_edge_id("memory_link", "memory_9", "memory_10");
        assert_eq!(from_high_first, from_low_first);
        assert_eq!(from_high_first, "memory_link_memory_9_memory_10");
    }
}
