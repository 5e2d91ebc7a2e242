use std::path::Path;

use anyhow::Result;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::SchemaDocError;

use super::types::Catalog;

/// SchemaCrawler attributes file (`dictionary.yaml`)
#[derive(Debug, Deserialize, Serialize, Default)]
pub struct AttributesFile {
    #[serde(default)]
    pub tables: Vec<TableAttributes>,

    #[serde(
        rename = "weak-associations",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub weak_associations: Vec<WeakAssociation>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TableAttributes {
    pub name: String,
    #[serde(default)]
    pub remarks: Remarks,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<ColumnAttributes>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ColumnAttributes {
    pub name: String,
    #[serde(default)]
    pub remarks: Remarks,
}

/// Remarks can be written as a single string or a list of lines
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum Remarks {
    Text(String),
    Lines(Vec<String>),
}

impl Default for Remarks {
    fn default() -> Self {
        Remarks::Text(String::new())
    }
}

impl Remarks {
    pub fn joined(&self) -> String {
        match self {
            Remarks::Text(text) => text.clone(),
            Remarks::Lines(lines) => lines.join("\n"),
        }
    }
}

/// A relationship not declared as a foreign key in the database
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WeakAssociation {
    #[serde(rename = "referencing-table")]
    pub referencing_table: String,
    #[serde(rename = "referenced-table")]
    pub referenced_table: String,
    /// referencing column -> referenced column
    #[serde(rename = "column-references", default)]
    pub column_references: IndexMap<String, String>,
}

pub fn parse_attributes(content: &str) -> Result<AttributesFile, serde_yaml::Error> {
    if content.trim().is_empty() {
        return Ok(AttributesFile::default());
    }
    serde_yaml::from_str(content)
}

pub fn load_attributes(path: &Path) -> Result<AttributesFile> {
    let content =
        std::fs::read_to_string(path).map_err(|e| SchemaDocError::FileReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

    let attributes = parse_attributes(&content).map_err(|e| SchemaDocError::YamlParseError {
        path: path.to_path_buf(),
        source: e,
    })?;

    Ok(attributes)
}

/// Overwrite catalog remarks with those from the attributes file.
/// Returns the number of tables and columns updated.
pub fn apply_attributes(catalog: &mut Catalog, attributes: &AttributesFile) -> usize {
    let mut applied = 0;

    for entry in &attributes.tables {
        let Some(table) = catalog.find_table_mut(&entry.name) else {
            tracing::warn!(table = %entry.name, "attributes reference an unknown table");
            continue;
        };

        let remarks = entry.remarks.joined();
        if !remarks.is_empty() {
            table.remarks = remarks;
            applied += 1;
        }

        for col_entry in &entry.columns {
            match table.columns.iter_mut().find(|c| c.name == col_entry.name) {
                Some(column) => {
                    let remarks = col_entry.remarks.joined();
                    if !remarks.is_empty() {
                        column.remarks = remarks;
                        applied += 1;
                    }
                }
                None => tracing::warn!(
                    table = %entry.name,
                    column = %col_entry.name,
                    "attributes reference an unknown column"
                ),
            }
        }
    }

    applied
}

/// Build an attributes skeleton listing every table and column
pub fn skeleton(catalog: &Catalog) -> AttributesFile {
    let tables = catalog
        .tables
        .iter()
        .map(|table| TableAttributes {
            name: table.full_name.clone(),
            remarks: Remarks::Text(table.remarks.clone()),
            columns: table
                .columns
                .iter()
                .map(|c| ColumnAttributes {
                    name: c.name.clone(),
                    remarks: Remarks::Text(c.remarks.clone()),
                })
                .collect(),
        })
        .collect();

    AttributesFile {
        tables,
        weak_associations: Vec::new(),
    }
}
