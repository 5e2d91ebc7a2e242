use std::collections::HashSet;
use std::io::{self, Write};
use std::sync::LazyLock;

use regex::Regex;

use crate::catalog::types::*;

/// DBML flavours produced from a catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum DbmlStyle {
    /// Schema-qualified tables sorted by name, column remarks as comments
    Columns,
    /// Tables in catalog order with notes, indexes and refs
    Catalog,
}

static PLAIN_IDENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

const QUOTE_TRIGGERS: &[char] = &[' ', '-', '.', ':', '/', '\\', '`', '"', '\''];

const EXPRESSION_PREFIXES: &[&str] = &["nextval", "uuid_", "now", "current_", "gen_random_uuid"];

/// Render a catalog as DBML into a string
pub fn render_dbml(catalog: &Catalog, style: DbmlStyle) -> String {
    let mut buf = Vec::new();
    render_dbml_to_writer(catalog, style, &mut buf).expect("writing to a Vec cannot fail");
    String::from_utf8_lossy(&buf).into_owned()
}

pub fn render_dbml_to_writer<W: Write>(catalog: &Catalog, style: DbmlStyle, w: &mut W) -> io::Result<()> {
    match style {
        DbmlStyle::Columns => render_columns_style(catalog, w),
        DbmlStyle::Catalog => render_catalog_style(catalog, w),
    }
}

fn render_columns_style<W: Write>(catalog: &Catalog, w: &mut W) -> io::Result<()> {
    let mut tables: Vec<&Table> = catalog.tables.iter().collect();
    tables.sort_by(|a, b| (&a.schema, &a.name).cmp(&(&b.schema, &b.name)));

    for table in tables {
        writeln!(w, "Table {} {{", quoted_ident(&table.full_name))?;

        for column in &table.columns {
            let mut attrs: Vec<String> = Vec::new();
            if column.part_of_primary_key || table.is_primary_key_column(&column.name) {
                attrs.push("pk".into());
            }
            if column.part_of_unique_index {
                attrs.push("unique".into());
            }
            if column.auto_incremented {
                attrs.push("increment".into());
            }
            if !column.nullable {
                attrs.push("not null".into());
            }
            if let Some(default) = sanitize_default(column.default_value.as_deref()) {
                if default != "null" {
                    attrs.push(format!("default: {}", default));
                }
            }

            let note = if column.remarks.is_empty() {
                String::new()
            } else {
                format!(" // {}", column.remarks.replace('"', "\\\"").replace('\n', " "))
            };

            writeln!(
                w,
                "  {} {}{}{}{}",
                quoted_ident(&column.name),
                column.data_type.name_or("text"),
                column.size_suffix(),
                attr_list(&attrs),
                note
            )?;
        }

        writeln!(w, "}}")?;
        writeln!(w)?;
    }

    Ok(())
}

fn render_catalog_style<W: Write>(catalog: &Catalog, w: &mut W) -> io::Result<()> {
    let mut refs: Vec<String> = Vec::new();
    let mut seen_refs: HashSet<String> = HashSet::new();

    for table in &catalog.tables {
        let pk = &table.primary_key;
        writeln!(w, "Table {} {{", backtick_ident(&table.name))?;

        for column in &table.columns {
            let in_pk = table.is_primary_key_column(&column.name);
            let mut attrs: Vec<String> = Vec::new();
            if in_pk && pk.len() == 1 {
                attrs.push("pk".into());
            }
            if !column.nullable {
                attrs.push("not null".into());
            }
            if column.part_of_unique_index && !in_pk {
                attrs.push("unique".into());
            }
            if let Some(default) = column.default_value.as_deref().filter(|d| !d.is_empty()) {
                attrs.push(format!("default: `{}`", default.replace('\n', " ")));
            }
            let note = column.remarks.trim();
            if !note.is_empty() {
                attrs.push(format!("note: '{}'", note.replace('\'', "''")));
            }

            writeln!(
                w,
                "  {} {}{}",
                backtick_ident(&column.name),
                column.data_type.name_or("varchar"),
                attr_list(&attrs)
            )?;
        }

        if !table.remarks.trim().is_empty() {
            writeln!(w, "  Note: '{}'", table.remarks.trim().replace('\'', "''"))?;
        }

        let mut index_lines: Vec<String> = Vec::new();
        if pk.len() > 1 {
            index_lines.push(format!("    ({}) [pk]", ident_list(pk)));
        }
        for index in table.indexes.iter().filter(|i| i.unique) {
            if same_columns(&index.columns, pk) {
                continue;
            }
            index_lines.push(format!("    ({}) [unique]", ident_list(&index.columns)));
        }
        if !index_lines.is_empty() {
            writeln!(w, "  indexes {{")?;
            for line in &index_lines {
                writeln!(w, "{}", line)?;
            }
            writeln!(w, "  }}")?;
        }

        writeln!(w, "}}")?;
        writeln!(w)?;

        for fk in &table.foreign_keys {
            for r in &fk.references {
                if r.fk_table == r.pk_table && r.fk_column == r.pk_column {
                    continue;
                }
                let line = ref_line(catalog, fk, r);
                if seen_refs.insert(line.clone()) {
                    refs.push(line);
                }
            }
        }
    }

    for line in refs {
        writeln!(w, "{}", line)?;
    }

    Ok(())
}

/// `Ref: parent.pk < child.fk [delete: x, update: y]`
fn ref_line(catalog: &Catalog, fk: &ForeignKey, r: &ColumnReference) -> String {
    let mut opts: Vec<String> = Vec::new();
    if let Some(rule) = &fk.delete_rule {
        opts.push(format!("delete: {}", rule));
    }
    if let Some(rule) = &fk.update_rule {
        opts.push(format!("update: {}", rule));
    }
    format!(
        "Ref: {}.{} < {}.{}{}",
        backtick_ident(bare_table_name(catalog, &r.pk_table)),
        backtick_ident(&r.pk_column),
        backtick_ident(bare_table_name(catalog, &r.fk_table)),
        backtick_ident(&r.fk_column),
        attr_list(&opts)
    )
}

fn bare_table_name<'a>(catalog: &'a Catalog, full_name: &'a str) -> &'a str {
    catalog
        .tables
        .iter()
        .find(|t| t.full_name == full_name)
        .map(|t| t.name.as_str())
        .unwrap_or_else(|| full_name.rsplit('.').next().unwrap_or(full_name))
}

/// Make a SQL default expression safe to embed in DBML
pub fn sanitize_default(value: Option<&str>) -> Option<String> {
    let dv = value?.trim();
    if dv.is_empty() {
        return None;
    }

    let lower = dv.to_lowercase();
    let is_expression = dv.contains(['(', ')'])
        || dv.contains("::")
        || EXPRESSION_PREFIXES.iter().any(|p| lower.starts_with(p));

    if is_expression || dv.contains([' ', ':', '\'', '"']) {
        return Some(format!("\"{}\"", dv.replace('"', "\\\"")));
    }

    Some(dv.to_string())
}

/// Double-quote identifiers containing spaces or punctuation
pub fn quoted_ident(name: &str) -> String {
    if name.contains(QUOTE_TRIGGERS) {
        format!("\"{}\"", name.replace('"', "\\\""))
    } else {
        name.to_string()
    }
}

/// Backtick identifiers that are not plain SQL identifiers
pub fn backtick_ident(name: &str) -> String {
    if PLAIN_IDENT.is_match(name) {
        name.to_string()
    } else {
        format!("`{}`", name)
    }
}

fn ident_list(names: &[String]) -> String {
    names
        .iter()
        .map(|n| backtick_ident(n))
        .collect::<Vec<_>>()
        .join(", ")
}

fn attr_list(attrs: &[String]) -> String {
    if attrs.is_empty() {
        String::new()
    } else {
        format!(" [{}]", attrs.join(", "))
    }
}

fn same_columns(a: &[String], b: &[String]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let set: HashSet<&String> = a.iter().collect();
    b.iter().all(|c| set.contains(c))
}
