pub mod annotations;
pub mod dbml;
pub mod dictionary;
pub mod dot;
pub mod json;
pub mod markdown;
pub mod mermaid;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};

use crate::graph::types::RelationshipGraph;

/// Output formats for the relationship graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ErdFormat {
    Dot,
    Mermaid,
    Markdown,
    Json,
}

pub fn render_erd_to_writer<W: Write>(graph: &RelationshipGraph, format: ErdFormat, w: &mut W) -> io::Result<()> {
    match format {
        ErdFormat::Dot => dot::render_dot_to_writer(graph, w),
        ErdFormat::Mermaid => mermaid::render_mermaid_to_writer(graph, w),
        ErdFormat::Markdown => markdown::render_markdown_to_writer(graph, w),
        ErdFormat::Json => json::render_json_to_writer(graph, w),
    }
}

/// Open the output file (creating parent directories), or stdout when no path is given
pub fn output_writer(path: Option<&Path>) -> Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory {}", parent.display()))?;
            }
            let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(io::stdout().lock())),
    }
}
