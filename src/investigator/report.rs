use std::io::{self, Write};

use comfy_table::{presets, Table};

use super::features::Feature;
use super::metadata::{ColumnDescription, TableEntry};
use super::origin::OriginAnalysis;
use super::source::RowSet;
use super::trace::TraceReport;
use super::uniqueness::Uniqueness;

fn markdown_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::ASCII_MARKDOWN);
    table.set_header(header);
    table
}

fn banner(title: &str) -> String {
    format!("{} {} {}", "=".repeat(30), title, "=".repeat(30))
}

pub fn write_features<W: Write>(features: &[Feature], w: &mut W) -> io::Result<()> {
    writeln!(w, "Available investigation features:")?;
    let mut table = markdown_table(vec!["Feature", "Usage", "Description"]);
    for feature in features {
        table.add_row(vec![
            feature.name.to_string(),
            feature.usage.replace('|', "\\|"),
            feature.description.to_string(),
        ]);
    }
    writeln!(w, "{}", table)
}

pub fn write_tables<W: Write>(entries: &[TableEntry], w: &mut W) -> io::Result<()> {
    if entries.is_empty() {
        return writeln!(w, "No tables found.");
    }
    let mut table = markdown_table(vec!["Schema", "Table Name"]);
    for entry in entries {
        table.add_row(vec![entry.schema.as_str(), entry.table.as_str()]);
    }
    writeln!(w, "{}", table)
}

pub fn write_description<W: Write>(columns: &[ColumnDescription], w: &mut W) -> io::Result<()> {
    let mut table = markdown_table(vec!["Column", "Type", "Nullable", "Primary Key", "Foreign Key"]);
    for column in columns {
        table.add_row(vec![
            column.column.clone(),
            column.data_type.clone(),
            column.nullable.to_string(),
            if column.primary_key { "YES" } else { "" }.to_string(),
            column.foreign_key.clone().unwrap_or_default(),
        ]);
    }
    writeln!(w, "{}", table)
}

pub fn write_rows<W: Write>(rows: &RowSet, w: &mut W) -> io::Result<()> {
    let mut table = markdown_table(rows.columns.iter().map(String::as_str).collect());
    for row in &rows.rows {
        table.add_row(
            row.iter()
                .map(|value| value.clone().unwrap_or_else(|| "NULL".to_string()))
                .collect::<Vec<_>>(),
        );
    }
    writeln!(w, "{}", table)
}

pub fn write_trace_report<W: Write>(report: &TraceReport, w: &mut W) -> io::Result<()> {
    for found in report.matches.iter().filter(|m| !m.records.is_empty()) {
        for records in &found.records {
            writeln!(
                w,
                "--- Matching records in {} for {} ({} shown) ---",
                found.full_name(),
                records.criteria,
                records.rows.len()
            )?;
            write_rows(&records.rows, w)?;
            writeln!(w)?;
        }
    }

    writeln!(w, "{}", banner("TRACE SUMMARY"))?;
    writeln!(w, "Criteria: {} (Mode: {})", report.criteria, report.mode)?;

    if report.matches.is_empty() {
        return writeln!(w, "Trace complete. No matches found.");
    }

    writeln!(w, "Trace complete. Found matches in the following tables (sorted by match count):")?;
    let mut table = markdown_table(vec!["Schema", "Table", "Match Count", "Detail"]);
    for found in &report.matches {
        table.add_row(vec![
            found.schema.clone(),
            found.table.clone(),
            found.match_count.to_string(),
            found.detail.clone(),
        ]);
    }
    writeln!(w, "{}", table)
}

pub fn write_origin_analysis<W: Write>(analysis: &OriginAnalysis, w: &mut W) -> io::Result<()> {
    if analysis.sources.is_empty() {
        return writeln!(w, "No data from the JSON was found in the database.");
    }

    writeln!(w, "{}", banner("TABLE SOURCE SUMMARY"))?;
    writeln!(w, "The following tables contributed data to the JSON object:")?;
    for source in &analysis.sources {
        writeln!(w)?;
        writeln!(w, "[Table] {} (Matched {} keys)", source.table, source.keys.len())?;
        writeln!(w, "  Contributed Keys: {}", source.keys.join(", "))?;
    }

    writeln!(w)?;
    writeln!(w, "{}", banner("LOGICAL LINK ANALYSIS"))?;
    if analysis.links.is_empty() {
        return writeln!(
            w,
            "No logical links found. Data may be from isolated tables or a single table."
        );
    }

    writeln!(w, "The following keys were found in multiple tables, suggesting logical joins:")?;
    for link in &analysis.links {
        writeln!(w)?;
        writeln!(w, "[Key] '{}' (Value: '{}')", link.key, link.value)?;
        writeln!(w, "  Found in {} tables:", link.tables.len())?;
        for table in &link.tables {
            writeln!(w, "    - {}", table)?;
        }
    }
    Ok(())
}

pub fn write_uniqueness<W: Write>(columns: &[String], result: &Uniqueness, w: &mut W) -> io::Result<()> {
    let combination = columns.join(", ");
    match result {
        Uniqueness::Unique => {
            writeln!(w, "RESULT: UNIQUE")?;
            writeln!(w, "The combination of [{}] is strictly unique across the table.", combination)?;
            writeln!(w, "This combination is a valid candidate for a primary key.")
        }
        Uniqueness::NotUnique(groups) => {
            writeln!(w, "RESULT: NOT UNIQUE (duplicates found)")?;
            writeln!(w, "The combination of [{}] contains duplicates.", combination)?;
            writeln!(w, "Showing top {} duplicate groups:", groups.len())?;
            write_rows(groups, w)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::investigator::features::FEATURES;
    use crate::investigator::origin::{LogicalLink, TableSource};
    use crate::investigator::trace::{MatchedRecords, TraceMatch, TraceMode};

    fn render(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_features() {
        let output = render(|w| write_features(FEATURES, w));
        assert!(output.contains("schemadoc inspect trace"));
        assert!(output.contains("Checks whether a column combination is unique"));
    }

    #[test]
    fn test_empty_tables() {
        assert_eq!(render(|w| write_tables(&[], w)), "No tables found.\n");
    }

    #[test]
    fn test_tables() {
        let entries = vec![TableEntry {
            schema: "public".into(),
            table: "orders".into(),
        }];
        let output = render(|w| write_tables(&entries, w));
        assert!(output.contains("Table Name"));
        assert!(output.contains("| public"));
        assert!(output.contains("orders"));
    }

    #[test]
    fn test_description() {
        let columns = vec![ColumnDescription {
            column: "customer_id".into(),
            data_type: "integer".into(),
            nullable: false,
            primary_key: true,
            foreign_key: Some("customers.id".into()),
        }];
        let output = render(|w| write_description(&columns, w));
        assert!(output.contains("Primary Key"));
        assert!(output.contains("YES"));
        assert!(output.contains("customers.id"));
        assert!(output.contains("false"));
    }

    #[test]
    fn test_trace_report_with_records() {
        let report = TraceReport {
            criteria: "(wh_id = 254)".into(),
            mode: TraceMode::Or,
            matches: vec![TraceMatch {
                schema: "public".into(),
                table: "stock".into(),
                match_count: 1,
                detail: "wh_id = 254".into(),
                matched_columns: vec!["wh_id".into()],
                records: vec![MatchedRecords {
                    criteria: "wh_id = 254".into(),
                    rows: RowSet {
                        columns: vec!["wh_id".into(), "note".into()],
                        rows: vec![vec![Some("254".into()), None]],
                    },
                }],
            }],
        };
        let output = render(|w| write_trace_report(&report, w));
        assert!(output.contains("--- Matching records in public.stock for wh_id = 254 (1 shown) ---"));
        assert!(output.contains("NULL"));
        assert!(output.contains("Criteria: (wh_id = 254) (Mode: OR)"));
        assert!(output.contains("Match Count"));
    }

    #[test]
    fn test_trace_report_without_matches() {
        let report = TraceReport {
            criteria: "(a = 1) AND (b = 2)".into(),
            mode: TraceMode::And,
            matches: vec![],
        };
        let output = render(|w| write_trace_report(&report, w));
        assert!(output.contains("TRACE SUMMARY"));
        assert!(output.contains("(Mode: AND)"));
        assert!(output.ends_with("Trace complete. No matches found.\n"));
    }

    #[test]
    fn test_origin_analysis() {
        let analysis = OriginAnalysis {
            sources: vec![
                TableSource {
                    table: "public.stock".into(),
                    keys: vec!["pro_id".into(), "wh_id".into()],
                },
                TableSource {
                    table: "public.products".into(),
                    keys: vec!["pro_id".into()],
                },
            ],
            links: vec![LogicalLink {
                key: "pro_id".into(),
                value: "780".into(),
                tables: vec!["public.products".into(), "public.stock".into()],
            }],
        };
        let output = render(|w| write_origin_analysis(&analysis, w));
        assert!(output.contains("[Table] public.stock (Matched 2 keys)"));
        assert!(output.contains("  Contributed Keys: pro_id, wh_id"));
        assert!(output.contains("[Key] 'pro_id' (Value: '780')"));
        assert!(output.contains("  Found in 2 tables:"));
        assert!(output.contains("    - public.products"));
    }

    #[test]
    fn test_origin_without_links() {
        let analysis = OriginAnalysis {
            sources: vec![TableSource {
                table: "public.stock".into(),
                keys: vec!["wh_id".into()],
            }],
            links: vec![],
        };
        let output = render(|w| write_origin_analysis(&analysis, w));
        assert!(output.contains("No logical links found."));

        let empty = render(|w| write_origin_analysis(&OriginAnalysis::default(), w));
        assert_eq!(empty, "No data from the JSON was found in the database.\n");
    }

    #[test]
    fn test_uniqueness() {
        let columns = vec!["wh_id".to_string(), "pro_id".to_string()];
        let unique = render(|w| write_uniqueness(&columns, &Uniqueness::Unique, w));
        assert!(unique.starts_with("RESULT: UNIQUE\n"));
        assert!(unique.contains("[wh_id, pro_id]"));

        let groups = RowSet {
            columns: vec!["wh_id".into(), "pro_id".into(), "duplicate_count".into()],
            rows: vec![vec![Some("1".into()), Some("10".into()), Some("2".into())]],
        };
        let not_unique = render(|w| write_uniqueness(&columns, &Uniqueness::NotUnique(groups), w));
        assert!(not_unique.starts_with("RESULT: NOT UNIQUE"));
        assert!(not_unique.contains("Showing top 1 duplicate groups:"));
        assert!(not_unique.contains("duplicate_count"));
    }
}
