use std::collections::{HashSet, VecDeque};

use anyhow::Result;
use petgraph::stable_graph::NodeIndex;
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use petgraph::Direction;

use crate::error::SchemaDocError;

use super::types::*;

/// Keep a focus table plus `parents` levels of referenced tables and
/// `children` levels of referencing tables (`None` = unlimited)
pub fn focus_graph(
    graph: &RelationshipGraph,
    focus_table: &str,
    parents: Option<usize>,
    children: Option<usize>,
) -> Result<RelationshipGraph> {
    let focus_idx = graph
        .node_indices()
        .find(|&idx| graph[idx].full_name == focus_table)
        .or_else(|| graph.node_indices().find(|&idx| graph[idx].label == focus_table))
        .ok_or_else(|| SchemaDocError::TableNotFound(focus_table.to_string()))?;

    let mut keep_nodes: HashSet<NodeIndex> = HashSet::new();
    keep_nodes.insert(focus_idx);

    // Referenced tables are reached along outgoing edges
    bfs_collect(graph, focus_idx, Direction::Outgoing, parents, &mut keep_nodes);
    bfs_collect(graph, focus_idx, Direction::Incoming, children, &mut keep_nodes);

    Ok(subgraph(graph, &keep_nodes))
}

/// BFS from a start node in a given direction, optionally limited by depth
fn bfs_collect(
    graph: &RelationshipGraph,
    start: NodeIndex,
    direction: Direction,
    max_depth: Option<usize>,
    visited: &mut HashSet<NodeIndex>,
) {
    let mut queue: VecDeque<(NodeIndex, usize)> = VecDeque::new();
    queue.push_back((start, 0));

    while let Some((current, depth)) = queue.pop_front() {
        if let Some(max) = max_depth {
            if depth >= max {
                continue;
            }
        }

        for edge in graph.edges_directed(current, direction) {
            let neighbor = match direction {
                Direction::Outgoing => edge.target(),
                Direction::Incoming => edge.source(),
            };
            if visited.insert(neighbor) {
                queue.push_back((neighbor, depth + 1));
            }
        }
    }
}

/// Build a new graph containing only the kept nodes and the edges between them
fn subgraph(graph: &RelationshipGraph, keep: &HashSet<NodeIndex>) -> RelationshipGraph {
    let mut filtered = RelationshipGraph::new();
    let mut index_map = std::collections::HashMap::new();

    // Preserve the original node order
    for idx in graph.node_indices().filter(|idx| keep.contains(idx)) {
        let new_idx = filtered.add_node(graph[idx].clone());
        index_map.insert(idx, new_idx);
    }

    for edge in graph.edge_references() {
        if let (Some(&src), Some(&tgt)) = (index_map.get(&edge.source()), index_map.get(&edge.target())) {
            filtered.add_edge(src, tgt, edge.weight().clone());
        }
    }

    filtered
}
