use std::collections::HashSet;
use std::path::Path;

use anyhow::Result;
use indexmap::IndexMap;
use serde_json::Value;

use crate::error::SchemaDocError;

use super::crawl_info::crawl_info;
use super::document::{enum_value, first_str, unwrap_list, Document};
use super::types::*;

/// Load a SchemaCrawler JSON export and build its catalog
pub fn load_catalog(path: &Path) -> Result<Catalog> {
    let doc = Document::load(path)?;
    if let Some(info) = crawl_info(&doc) {
        tracing::info!(
            path = %path.display(),
            crawled_at = ?info.crawled_at,
            database = info.database_product.as_deref().unwrap_or("unknown"),
            schemacrawler = info.schemacrawler_version.as_deref().unwrap_or("unknown"),
            "export metadata"
        );
    }
    let catalog = build_catalog(&doc)?;
    tracing::debug!(
        path = %path.display(),
        tables = catalog.tables.len(),
        columns = catalog.column_count(),
        "loaded catalog"
    );
    Ok(catalog)
}

/// Build a typed catalog from a parsed export.
///
/// Tables come from `catalog.tables` when the export has them; otherwise
/// the flat `all-table-columns` list is grouped by column full name.
pub fn build_catalog(doc: &Document) -> Result<Catalog> {
    let table_entries: Vec<&Value> = doc
        .root
        .get("catalog")
        .and_then(|c| c.get("tables"))
        .map(unwrap_list)
        .unwrap_or(&[])
        .iter()
        .filter_map(|entry| doc.resolve(entry))
        .filter(|t| t.is_object())
        .collect();

    let column_block = all_table_columns(&doc.root);

    if !table_entries.is_empty() {
        let tables = table_entries
            .into_iter()
            .map(|t| parse_table(doc, t))
            .collect();
        return Ok(Catalog { tables });
    }

    let columns = column_block.ok_or(SchemaDocError::MissingColumnBlock)?;
    Ok(group_columns(doc, columns))
}

/// The `[type, list]` pair under `all-table-columns`
fn all_table_columns(root: &Value) -> Option<&[Value]> {
    let block = root.get("all-table-columns")?.as_array()?;
    if block.len() < 2 {
        return None;
    }
    block[1].as_array().map(Vec::as_slice)
}

fn group_columns(doc: &Document, columns: &[Value]) -> Catalog {
    let mut tables: IndexMap<(Option<String>, String), Table> = IndexMap::new();

    for entry in columns.iter().filter(|c| c.is_object()) {
        let full_name = entry.get("full-name").and_then(Value::as_str).unwrap_or("");
        let parts: Vec<&str> = full_name.splitn(3, '.').collect();
        let (schema, table) = match parts.as_slice() {
            [schema, table, _] => (Some(schema.to_string()), table.to_string()),
            [table, _] => (None, table.to_string()),
            _ => {
                tracing::warn!(full_name, "skipping column without a table-qualified name");
                continue;
            }
        };

        let column = parse_column(doc, entry);
        tables
            .entry((schema.clone(), table.clone()))
            .or_insert_with(|| Table::new(schema, table))
            .columns
            .push(column);
    }

    let tables = tables
        .into_values()
        .map(|mut table| {
            sort_columns(&mut table.columns);
            table.primary_key = table
                .columns
                .iter()
                .filter(|c| c.part_of_primary_key)
                .map(|c| c.name.clone())
                .collect();
            table
        })
        .collect();

    Catalog { tables }
}

fn parse_table(doc: &Document, obj: &Value) -> Table {
    let full_name = first_str(obj, &["full-name", "name"]).unwrap_or("").to_string();
    let name = first_str(obj, &["name"])
        .map(str::to_string)
        .unwrap_or_else(|| last_segment(&full_name).to_string());

    let schema = full_name
        .strip_suffix(&format!(".{}", name))
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .or_else(|| {
            obj.get("schema")
                .and_then(|s| doc.resolve(s))
                .and_then(|s| first_str(s, &["full-name", "name"]))
                .map(str::to_string)
        });

    let mut table = Table::new(schema, name);
    if !full_name.is_empty() {
        table.full_name = full_name;
    }
    table.remarks = first_str(obj, &["remarks"]).unwrap_or("").trim().to_string();

    table.columns = obj
        .get("columns")
        .map(unwrap_list)
        .unwrap_or(&[])
        .iter()
        .filter_map(|c| doc.resolve(c))
        .map(|c| parse_column(doc, c))
        .collect();
    sort_columns(&mut table.columns);

    table.primary_key = obj
        .get("primary-key")
        .and_then(|pk| doc.resolve(pk))
        .map(|pk| names_of(doc, pk.get("columns")))
        .unwrap_or_default();
    if table.primary_key.is_empty() {
        table.primary_key = table
            .columns
            .iter()
            .filter(|c| c.part_of_primary_key)
            .map(|c| c.name.clone())
            .collect();
    }

    table.indexes = parse_indexes(doc, obj);
    table.foreign_keys = obj
        .get("foreign-keys")
        .map(unwrap_list)
        .unwrap_or(&[])
        .iter()
        .filter_map(|fk| doc.resolve(fk))
        .map(|fk| parse_foreign_key(doc, fk, &table.full_name))
        .collect();

    table
}

fn parse_column(doc: &Document, obj: &Value) -> Column {
    let full_name = first_str(obj, &["full-name"]).unwrap_or("");
    let name = first_str(obj, &["name"]).unwrap_or_else(|| last_segment(full_name));

    let mut column = Column::new(name);
    if !full_name.is_empty() {
        column.full_name = full_name.to_string();
    }
    column.ordinal_position = obj.get("ordinal-position").and_then(Value::as_i64);
    column.data_type = resolve_data_type(doc, obj);
    column.width = obj.get("width").and_then(Value::as_str).map(str::to_string);
    column.size = obj.get("size").and_then(Value::as_i64);
    column.nullable = flag(obj, "nullable", true);
    column.default_value = obj.get("default-value").and_then(scalar_to_string);
    column.part_of_primary_key = flag(obj, "part-of-primary-key", false);
    column.part_of_unique_index = flag(obj, "part-of-unique-index", false);
    column.part_of_foreign_key = flag(obj, "part-of-foreign-key", false);
    column.auto_incremented = flag(obj, "auto-incremented", false);
    column.generated = flag(obj, "generated", false);
    column.remarks = first_str(obj, &["remarks"])
        .or_else(|| obj.get("attributes").and_then(|a| first_str(a, &["REMARKS"])))
        .unwrap_or("")
        .to_string();
    column
}

/// Resolve the column type from `column-data-type`, falling back to `type`
pub fn resolve_data_type(doc: &Document, column: &Value) -> DataTypeRef {
    if let Some(reference) = column.get("column-data-type") {
        return match reference {
            Value::String(uuid) => match doc.get(uuid) {
                Some(obj) => named_type(obj, &["name", "database-specific-type-name", "full-name"]),
                None => DataTypeRef::Dangling(uuid.clone()),
            },
            obj @ Value::Object(_) => {
                named_type(obj, &["name", "database-specific-type-name", "full-name"])
            }
            _ => DataTypeRef::Missing,
        };
    }

    if let Some(Value::String(uuid)) = column.get("type") {
        return match doc.get(uuid) {
            Some(obj) => named_type(
                obj,
                &["database-specific-type-name", "local-type-name", "standard-type-name"],
            ),
            None => DataTypeRef::Dangling(uuid.clone()),
        };
    }

    DataTypeRef::Missing
}

fn named_type(obj: &Value, keys: &[&str]) -> DataTypeRef {
    first_str(obj, keys)
        .map(|n| DataTypeRef::Named(n.to_string()))
        .unwrap_or(DataTypeRef::Missing)
}

fn parse_indexes(doc: &Document, table: &Value) -> Vec<Index> {
    let declared = table.get("indexes").map(unwrap_list).unwrap_or(&[]);
    let constraints = table
        .get("table-constraints")
        .map(unwrap_list)
        .unwrap_or(&[]);

    let mut seen = HashSet::new();
    let mut indexes = Vec::new();

    let candidates = declared
        .iter()
        .filter_map(|i| doc.resolve(i))
        .chain(
            constraints
                .iter()
                .filter_map(|i| doc.resolve(i))
                .filter(|i| {
                    i.get("@class")
                        .and_then(Value::as_str)
                        .is_some_and(|class| class.ends_with("Index"))
                }),
        );

    for obj in candidates {
        let name = first_str(obj, &["name", "full-name"]).unwrap_or("").to_string();
        let key = first_str(obj, &["@uuid"])
            .map(str::to_string)
            .unwrap_or_else(|| name.clone());
        if !seen.insert(key) {
            continue;
        }
        let columns = names_of(doc, obj.get("columns"));
        if columns.is_empty() {
            continue;
        }
        indexes.push(Index {
            name,
            unique: flag(obj, "unique", false),
            columns,
        });
    }

    indexes
}

fn parse_foreign_key(doc: &Document, fk: &Value, owner_table: &str) -> ForeignKey {
    let referenced_table = fk
        .get("referenced-table")
        .and_then(|t| doc.resolve(t))
        .and_then(|t| first_str(t, &["full-name", "name"]))
        .unwrap_or(owner_table)
        .to_string();

    let references = fk
        .get("column-references")
        .map(unwrap_list)
        .unwrap_or(&[])
        .iter()
        .filter_map(|cr| doc.resolve(cr))
        .filter_map(|cr| {
            let (fk_table, fk_column) =
                column_location(doc, cr.get("foreign-key-column")?, owner_table)?;
            let (pk_table, pk_column) =
                column_location(doc, cr.get("primary-key-column")?, &referenced_table)?;
            Some(ColumnReference {
                fk_table,
                fk_column,
                pk_table,
                pk_column,
            })
        })
        .collect();

    ForeignKey {
        name: first_str(fk, &["name", "full-name"]).unwrap_or("").to_string(),
        references,
        delete_rule: enum_value(fk.get("delete-rule")),
        update_rule: enum_value(fk.get("update-rule")),
    }
}

/// (table full name, column name) for a column reference
fn column_location(doc: &Document, reference: &Value, default_table: &str) -> Option<(String, String)> {
    let column = doc.resolve(reference)?;
    let name = first_str(column, &["name"])?;
    let table = first_str(column, &["full-name"])
        .and_then(|full| full.strip_suffix(&format!(".{}", name)))
        .filter(|t| !t.is_empty())
        .unwrap_or(default_table);
    Some((table.to_string(), name.to_string()))
}

/// Names of the objects in a (possibly wrapped) list of references
fn names_of(doc: &Document, list: Option<&Value>) -> Vec<String> {
    list.map(unwrap_list)
        .unwrap_or(&[])
        .iter()
        .filter_map(|r| doc.resolve(r))
        .filter_map(|o| first_str(o, &["name"]))
        .map(str::to_string)
        .collect()
}

fn sort_columns(columns: &mut [Column]) {
    columns.sort_by_key(|c| c.ordinal_position.unwrap_or(0));
}

fn flag(obj: &Value, key: &str, default: bool) -> bool {
    obj.get(key).and_then(Value::as_bool).unwrap_or(default)
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn last_segment(full_name: &str) -> &str {
    full_name.rsplit('.').next().unwrap_or(full_name)
}
