use std::io::{self, Write};

use petgraph::visit::{EdgeRef, IntoEdgeReferences};

use crate::graph::types::*;

/// Render the relationship graph as a Mermaid entity relationship diagram
pub fn render_mermaid_to_writer<W: Write>(graph: &RelationshipGraph, w: &mut W) -> io::Result<()> {
    writeln!(w, "erDiagram")?;

    for idx in graph.node_indices() {
        let node = &graph[idx];
        let id = mermaid_id(&node.full_name);
        if node.columns.is_empty() {
            writeln!(w, "    {}", id)?;
            continue;
        }

        writeln!(w, "    {} {{", id)?;
        for column in &node.columns {
            let keys: Vec<&str> = [(column.primary_key, "PK"), (column.foreign_key, "FK")]
                .iter()
                .filter(|(flag, _)| *flag)
                .map(|(_, key)| *key)
                .collect();
            if keys.is_empty() {
                writeln!(w, "        {} {}", mermaid_id(&column.data_type), mermaid_id(&column.name))?;
            } else {
                writeln!(
                    w,
                    "        {} {} {}",
                    mermaid_id(&column.data_type),
                    mermaid_id(&column.name),
                    keys.join(", ")
                )?;
            }
        }
        writeln!(w, "    }}")?;
    }

    for edge in graph.edge_references() {
        let source = &graph[edge.source()];
        let target = &graph[edge.target()];
        let weight = edge.weight();
        // Many referencing rows to exactly one referenced row; dotted when not enforced
        let connector = match weight.edge_type {
            EdgeType::ForeignKey => "}o--||",
            EdgeType::Weak => "}o..||",
        };
        writeln!(
            w,
            "    {} {} {} : \"{}\"",
            mermaid_id(&source.full_name),
            connector,
            mermaid_id(&target.full_name),
            relationship_label(weight)
        )?;
    }

    Ok(())
}

fn relationship_label(edge: &RefEdge) -> String {
    if edge.column_pairs.is_empty() {
        return edge.name.replace('"', "'");
    }
    edge.column_pairs
        .iter()
        .map(|(from, _)| from.as_str())
        .collect::<Vec<_>>()
        .join(", ")
        .replace('"', "'")
}

/// Mermaid identifiers only allow word characters and hyphens
fn mermaid_id(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect()
}
