use std::io::{self, Write};

use comfy_table::{presets, Table as TextTable};
use petgraph::visit::{EdgeRef, IntoEdgeReferences};

use crate::graph::types::*;

/// Render every relationship as one row per column pair
pub fn render_markdown_to_writer<W: Write>(graph: &RelationshipGraph, w: &mut W) -> io::Result<()> {
    let mut table = TextTable::new();
    table.load_preset(presets::ASCII_MARKDOWN);
    table.set_header(vec![
        "Referencing Table",
        "Column",
        "Referenced Table",
        "Column",
        "Kind",
        "On Delete",
    ]);

    let mut rows: Vec<[String; 6]> = Vec::new();
    for edge in graph.edge_references() {
        let weight = edge.weight();
        let source = graph[edge.source()].display_name();
        let target = graph[edge.target()].display_name();
        let on_delete = weight.delete_rule.clone().unwrap_or_default();

        if weight.column_pairs.is_empty() {
            rows.push([
                source,
                String::new(),
                target,
                String::new(),
                weight.edge_type.label().to_string(),
                on_delete,
            ]);
            continue;
        }

        for (from, to) in &weight.column_pairs {
            rows.push([
                source.clone(),
                from.clone(),
                target.clone(),
                to.clone(),
                weight.edge_type.label().to_string(),
                on_delete.clone(),
            ]);
        }
    }

    rows.sort();
    for row in rows {
        table.add_row(row.to_vec());
    }

    writeln!(w, "{}", table)
}
