use std::collections::{BTreeMap, BTreeSet};

use anyhow::{bail, Result};
use serde_json::Value;

use super::source::MetadataSource;
use super::trace::{trace, SchemaScope, SearchPairs, TraceMode, TraceOptions, TraceReport};

/// Keys a table supplied to the JSON object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSource {
    pub table: String,
    pub keys: Vec<String>,
}

/// A key present in more than one table, hinting at a join
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalLink {
    pub key: String,
    pub value: String,
    pub tables: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OriginAnalysis {
    /// Most contributing tables first
    pub sources: Vec<TableSource>,
    /// Most shared keys first
    pub links: Vec<LogicalLink>,
}

/// Turn a JSON object into search pairs, dropping null and empty-string values
pub fn search_pairs_from_json(value: &Value) -> Result<SearchPairs> {
    let Some(object) = value.as_object() else {
        bail!("Input JSON must be an object");
    };

    let pairs: SearchPairs = object
        .iter()
        .filter_map(|(key, value)| json_text(value).map(|text| (key.clone(), text)))
        .collect();

    if pairs.is_empty() {
        bail!("Input JSON is empty or contains only null values");
    }
    Ok(pairs)
}

/// Text form compared against `column::text`
fn json_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Group trace matches by table and by key
pub fn analyze(report: &TraceReport, pairs: &SearchPairs) -> OriginAnalysis {
    let mut table_keys: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    let mut key_tables: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

    for found in &report.matches {
        let table = found.full_name();
        for key in &found.matched_columns {
            table_keys.entry(table.clone()).or_default().insert(key.clone());
            key_tables.entry(key.clone()).or_default().insert(table.clone());
        }
    }

    let mut sources: Vec<TableSource> = table_keys
        .into_iter()
        .map(|(table, keys)| TableSource {
            table,
            keys: keys.into_iter().collect(),
        })
        .collect();
    sources.sort_by(|a, b| b.keys.len().cmp(&a.keys.len()));

    let mut links: Vec<LogicalLink> = key_tables
        .into_iter()
        .filter(|(_, tables)| tables.len() > 1)
        .map(|(key, tables)| LogicalLink {
            value: pairs.get(&key).cloned().unwrap_or_default(),
            key,
            tables: tables.into_iter().collect(),
        })
        .collect();
    links.sort_by(|a, b| b.tables.len().cmp(&a.tables.len()));

    OriginAnalysis { sources, links }
}

/// OR-trace every field of a JSON object across all schemas, then analyze
pub async fn trace_origin<S: MetadataSource>(source: &S, json: &Value) -> Result<(TraceReport, OriginAnalysis)> {
    let pairs = search_pairs_from_json(json)?;
    tracing::info!(keys = pairs.len(), "starting JSON origin trace");

    let options = TraceOptions {
        mode: TraceMode::Or,
        scope: SchemaScope::All,
        show_records: false,
        ..Default::default()
    };
    let report = trace(source, &pairs, &options).await?;
    let analysis = analyze(&report, &pairs);
    Ok((report, analysis))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::investigator::source::fake::{FakeSource, FakeTable};
    use serde_json::json;

    #[test]
    fn test_search_pairs_from_json() {
        let pairs = search_pairs_from_json(&json!({
            "pro_id": 780,
            "pro_code": "300134",
            "note": "",
            "deleted_at": null,
            "active": true,
            "ratio": 1.5
        }))
        .unwrap();
        let items: Vec<(&str, &str)> = pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        assert_eq!(items.len(), 4);
        assert!(items.contains(&("pro_id", "780")));
        assert!(items.contains(&("pro_code", "300134")));
        assert!(items.contains(&("active", "true")));
        assert!(items.contains(&("ratio", "1.5")));
    }

    #[test]
    fn test_empty_json_is_error() {
        let err = search_pairs_from_json(&json!({"a": null, "b": ""})).unwrap_err();
        assert!(err.to_string().contains("empty or contains only null values"));
        assert!(search_pairs_from_json(&json!([1, 2])).is_err());
    }

    #[tokio::test]
    async fn test_trace_origin_analysis() {
        let source = FakeSource::default()
            .with(
                "public",
                "stock",
                FakeTable::new(&["wh_id", "pro_id", "qty"]).row(&["254", "780", "1200"]),
            )
            .with(
                "public",
                "products",
                FakeTable::new(&["pro_id", "pro_code"]).row(&["780", "300134"]),
            )
            .with("sales", "lines", FakeTable::new(&["pro_id", "amount"]).row(&["780", "9"]));

        let json = json!({"pro_id": 780, "pro_code": "300134", "total_qty": 1200, "wh_id": 254});
        let (report, analysis) = trace_origin(&source, &json).await.unwrap();
        assert_eq!(report.matches.len(), 3);

        assert_eq!(
            analysis.sources[0],
            TableSource {
                table: "public.products".into(),
                keys: vec!["pro_code".into(), "pro_id".into()],
            }
        );
        assert_eq!(analysis.sources[1].table, "public.stock");
        assert_eq!(analysis.sources[1].keys, vec!["pro_id", "wh_id"]);
        assert_eq!(analysis.sources[2].table, "sales.lines");

        assert_eq!(
            analysis.links,
            vec![LogicalLink {
                key: "pro_id".into(),
                value: "780".into(),
                tables: vec!["public.products".into(), "public.stock".into(), "sales.lines".into()],
            }]
        );
    }

    #[tokio::test]
    async fn test_no_matches() {
        let source = FakeSource::default().with("public", "t", FakeTable::new(&["a"]));
        let (report, analysis) = trace_origin(&source, &json!({"a": 1})).await.unwrap();
        assert!(report.matches.is_empty());
        assert_eq!(analysis, OriginAnalysis::default());
    }
}
