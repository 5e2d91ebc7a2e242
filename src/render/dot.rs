use std::io::{self, Write};

use petgraph::visit::{EdgeRef, IntoEdgeReferences};

use crate::graph::types::*;

/// Render the relationship graph as Graphviz DOT
pub fn render_dot_to_writer<W: Write>(graph: &RelationshipGraph, w: &mut W) -> io::Result<()> {
    writeln!(w, "digraph schema {{")?;
    writeln!(w, "  rankdir=LR;")?;
    writeln!(w, "  node [shape=box, style=filled, fontname=\"Helvetica\"];")?;
    writeln!(w)?;

    for idx in graph.node_indices() {
        let node = &graph[idx];
        let (color, fontcolor) = node_colors(node.kind);
        writeln!(
            w,
            "  \"{}\" [label=\"{}\", fillcolor=\"{}\", fontcolor=\"{}\"];",
            escape(&node.full_name),
            escape(&node_label(node)),
            color,
            fontcolor
        )?;
    }

    writeln!(w)?;

    for edge in graph.edge_references() {
        let source = &graph[edge.source()];
        let target = &graph[edge.target()];
        let weight = edge.weight();
        let style = match weight.edge_type {
            EdgeType::ForeignKey => "",
            EdgeType::Weak => ", style=dashed",
        };
        writeln!(
            w,
            "  \"{}\" -> \"{}\" [label=\"{}\"{style}];",
            escape(&source.full_name),
            escape(&target.full_name),
            escape(&edge_label(weight)),
        )?;
    }

    writeln!(w, "}}")
}

fn node_label(node: &TableNode) -> String {
    match node.kind {
        NodeKind::Table => format!("{}\\n({} columns)", node.full_name, node.columns.len()),
        NodeKind::Phantom => node.display_name(),
    }
}

fn edge_label(edge: &RefEdge) -> String {
    let columns: Vec<&str> = edge.column_pairs.iter().map(|(from, _)| from.as_str()).collect();
    if columns.is_empty() {
        edge.edge_type.label().to_string()
    } else {
        columns.join(", ")
    }
}

// Only quotes need escaping inside DOT string literals; `\n` is kept as a label break
fn escape(value: &str) -> String {
    value.replace('"', "\\\"")
}

fn node_colors(kind: NodeKind) -> (&'static str, &'static str) {
    match kind {
        NodeKind::Table => ("#4A90D9", "white"),
        NodeKind::Phantom => ("#BDC3C7", "black"),
    }
}
