use std::io::Write;

use anyhow::Result;
use comfy_table::{presets, Table as TextTable};
use serde::Serialize;

use crate::catalog::types::*;

/// Output formats for the data dictionary
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum DictionaryFormat {
    Csv,
    Markdown,
    Json,
}

pub const HEADERS: [&str; 11] = [
    "Schema",
    "Table",
    "Column",
    "Position",
    "Data Type",
    "Size",
    "Nullable",
    "PK",
    "FK",
    "Default",
    "Remarks",
];

/// One data dictionary line per column
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DictionaryRow {
    #[serde(rename = "Schema")]
    pub schema: String,
    #[serde(rename = "Table")]
    pub table: String,
    #[serde(rename = "Column")]
    pub column: String,
    #[serde(rename = "Position")]
    pub position: Option<i64>,
    #[serde(rename = "Data Type")]
    pub data_type: String,
    #[serde(rename = "Size")]
    pub size: Option<i64>,
    #[serde(rename = "Nullable")]
    pub nullable: &'static str,
    #[serde(rename = "PK")]
    pub primary_key: &'static str,
    #[serde(rename = "FK")]
    pub foreign_key: &'static str,
    #[serde(rename = "Default")]
    pub default_value: String,
    #[serde(rename = "Remarks")]
    pub remarks: String,
}

impl DictionaryRow {
    fn cells(&self) -> Vec<String> {
        vec![
            self.schema.clone(),
            self.table.clone(),
            self.column.clone(),
            self.position.map(|p| p.to_string()).unwrap_or_default(),
            self.data_type.clone(),
            self.size.map(|s| s.to_string()).unwrap_or_default(),
            self.nullable.to_string(),
            self.primary_key.to_string(),
            self.foreign_key.to_string(),
            self.default_value.clone(),
            self.remarks.clone(),
        ]
    }
}

/// Flatten a catalog into dictionary rows, table by table
pub fn dictionary_rows(catalog: &Catalog) -> Vec<DictionaryRow> {
    catalog
        .tables
        .iter()
        .flat_map(|table| table.columns.iter().map(move |column| row(table, column)))
        .collect()
}

fn row(table: &Table, column: &Column) -> DictionaryRow {
    let data_type = match &column.data_type {
        DataTypeRef::Named(name) => name.clone(),
        DataTypeRef::Dangling(_) => "Unknown Ref".to_string(),
        DataTypeRef::Missing => "Unknown".to_string(),
    };

    DictionaryRow {
        schema: table.schema.clone().unwrap_or_default(),
        table: table.name.clone(),
        column: column.name.clone(),
        position: column.ordinal_position,
        data_type,
        size: column.size,
        nullable: yes_no(column.nullable),
        primary_key: yes_no(column.part_of_primary_key || table.is_primary_key_column(&column.name)),
        foreign_key: yes_no(column.part_of_foreign_key),
        default_value: column.default_value.clone().unwrap_or_default(),
        remarks: column.remarks.clone(),
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}

pub fn render_dictionary_to_writer<W: Write>(
    rows: &[DictionaryRow],
    format: DictionaryFormat,
    w: &mut W,
) -> Result<()> {
    match format {
        DictionaryFormat::Csv => {
            let mut writer = csv::Writer::from_writer(w);
            for row in rows {
                writer.serialize(row)?;
            }
            writer.flush()?;
        }
        DictionaryFormat::Markdown => {
            let mut table = TextTable::new();
            table.load_preset(presets::ASCII_MARKDOWN);
            table.set_header(HEADERS.to_vec());
            for row in rows {
                table.add_row(row.cells());
            }
            writeln!(w, "{}", table)?;
        }
        DictionaryFormat::Json => {
            serde_json::to_writer_pretty(&mut *w, rows)?;
            writeln!(w)?;
        }
    }
    Ok(())
}
