use std::io::{self, Write};

use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use serde::Serialize;

use crate::graph::types::*;

#[derive(Serialize)]
struct JsonGraph {
    nodes: Vec<JsonNode>,
    edges: Vec<JsonEdge>,
}

#[derive(Serialize)]
struct JsonNode {
    full_name: String,
    label: String,
    kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    schema: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    remarks: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    columns: Vec<JsonColumn>,
}

#[derive(Serialize)]
struct JsonColumn {
    name: String,
    data_type: String,
    primary_key: bool,
    foreign_key: bool,
}

#[derive(Serialize)]
struct JsonEdge {
    source: String,
    target: String,
    edge_type: String,
    name: String,
    columns: Vec<[String; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    delete_rule: Option<String>,
}

/// Render the relationship graph as JSON (nodes + edges)
pub fn render_json_to_writer<W: Write>(graph: &RelationshipGraph, w: &mut W) -> io::Result<()> {
    let nodes: Vec<JsonNode> = graph
        .node_indices()
        .map(|idx| {
            let node = &graph[idx];
            JsonNode {
                full_name: node.full_name.clone(),
                label: node.label.clone(),
                kind: node.kind.label().to_string(),
                schema: node.schema.clone(),
                remarks: node.remarks.clone(),
                columns: node
                    .columns
                    .iter()
                    .map(|c| JsonColumn {
                        name: c.name.clone(),
                        data_type: c.data_type.clone(),
                        primary_key: c.primary_key,
                        foreign_key: c.foreign_key,
                    })
                    .collect(),
            }
        })
        .collect();

    let edges: Vec<JsonEdge> = graph
        .edge_references()
        .map(|edge| {
            let weight = edge.weight();
            JsonEdge {
                source: graph[edge.source()].full_name.clone(),
                target: graph[edge.target()].full_name.clone(),
                edge_type: weight.edge_type.label().to_string(),
                name: weight.name.clone(),
                columns: weight
                    .column_pairs
                    .iter()
                    .map(|(from, to)| [from.clone(), to.clone()])
                    .collect(),
                delete_rule: weight.delete_rule.clone(),
            }
        })
        .collect();

    serde_json::to_writer_pretty(&mut *w, &JsonGraph { nodes, edges })?;
    writeln!(w)
}
