use std::fmt;
use std::str::FromStr;

use anyhow::Result;
use indexmap::IndexMap;

use crate::error::SchemaDocError;

use super::source::{MetadataSource, Probe, RowSet};

/// How multiple search pairs combine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TraceMode {
    /// A single row must match every pair
    And,
    /// Each pair is looked up on its own
    #[default]
    Or,
}

impl TraceMode {
    pub fn keyword(&self) -> &'static str {
        match self {
            TraceMode::And => "AND",
            TraceMode::Or => "OR",
        }
    }
}

impl fmt::Display for TraceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl FromStr for TraceMode {
    type Err = SchemaDocError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AND" => Ok(TraceMode::And),
            "OR" => Ok(TraceMode::Or),
            _ => Err(SchemaDocError::InvalidTraceMode(s.to_string())),
        }
    }
}

/// Column -> searched value, in the order given
pub type SearchPairs = IndexMap<String, String>;

/// Parse `column=value`; the value may itself contain `=`
pub fn parse_search_pair(s: &str) -> Result<(String, String), SchemaDocError> {
    let (column, value) = s
        .split_once('=')
        .ok_or_else(|| SchemaDocError::InvalidSearchPair(s.to_string()))?;
    let column = column.trim();
    if column.is_empty() {
        return Err(SchemaDocError::InvalidSearchPair(s.to_string()));
    }
    Ok((column.to_string(), value.to_string()))
}

/// `(c1 = v1) AND (c2 = v2)`
pub fn criteria_summary(pairs: &SearchPairs, mode: TraceMode) -> String {
    pairs
        .iter()
        .map(|(column, value)| format!("({} = {})", column, value))
        .collect::<Vec<_>>()
        .join(&format!(" {} ", mode.keyword()))
}

/// Which schemas an operation scans
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaScope {
    One(String),
    All,
}

impl SchemaScope {
    pub fn new(schema: &str, all_schemas: bool) -> Self {
        if all_schemas {
            SchemaScope::All
        } else {
            SchemaScope::One(schema.to_string())
        }
    }
}

impl fmt::Display for SchemaScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaScope::One(schema) => write!(f, "schema '{}'", schema),
            SchemaScope::All => f.write_str("all schemas"),
        }
    }
}

/// Expand a scope to schema names
pub async fn resolve_schemas<S: MetadataSource>(source: &S, scope: &SchemaScope) -> Result<Vec<String>> {
    match scope {
        SchemaScope::One(schema) => Ok(vec![schema.clone()]),
        SchemaScope::All => source.schema_names().await,
    }
}

#[derive(Debug, Clone)]
pub struct TraceOptions {
    pub mode: TraceMode,
    pub scope: SchemaScope,
    pub show_records: bool,
    pub limit: usize,
}

impl Default for TraceOptions {
    fn default() -> Self {
        Self {
            mode: TraceMode::Or,
            scope: SchemaScope::One("public".to_string()),
            show_records: false,
            limit: 5,
        }
    }
}

/// Sample rows returned for one matching lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedRecords {
    /// Criteria the rows matched
    pub criteria: String,
    pub rows: RowSet,
}

/// A table holding at least one of the searched values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceMatch {
    pub schema: String,
    pub table: String,
    pub match_count: usize,
    pub detail: String,
    /// Searched columns that matched in this table
    pub matched_columns: Vec<String>,
    pub records: Vec<MatchedRecords>,
}

impl TraceMatch {
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.schema, self.table)
    }
}

#[derive(Debug, Clone)]
pub struct TraceReport {
    pub criteria: String,
    pub mode: TraceMode,
    /// Sorted by match count, highest first
    pub matches: Vec<TraceMatch>,
}

/// Find every table containing the searched values.
///
/// Schemas, tables and queries that fail are logged and skipped; only a
/// failure to list schemas aborts the trace.
pub async fn trace<S: MetadataSource>(source: &S, pairs: &SearchPairs, options: &TraceOptions) -> Result<TraceReport> {
    let criteria = criteria_summary(pairs, options.mode);
    tracing::info!(mode = %options.mode, scope = %options.scope, "tracing {}", criteria);

    let mut matches = Vec::new();
    for schema in resolve_schemas(source, &options.scope).await? {
        let tables = match source.table_names(&schema).await {
            Ok(tables) => tables,
            Err(e) => {
                tracing::warn!(schema = %schema, "could not list tables, skipping: {:#}", e);
                continue;
            }
        };
        if tables.is_empty() {
            tracing::debug!(schema = %schema, "no tables in schema");
            continue;
        }

        for table in tables {
            let columns: Vec<String> = match source.columns(&schema, &table).await {
                Ok(columns) => columns.into_iter().map(|c| c.name).collect(),
                Err(e) => {
                    tracing::warn!(schema = %schema, table = %table, "failed to inspect columns, skipping: {:#}", e);
                    continue;
                }
            };

            let found = match options.mode {
                TraceMode::And => trace_all(source, &schema, &table, &columns, pairs, &criteria, options).await,
                TraceMode::Or => trace_any(source, &schema, &table, &columns, pairs, options).await,
            };
            if let Some(found) = found {
                tracing::info!(table = %found.full_name(), matches = found.match_count, "match found");
                matches.push(found);
            }
        }
    }

    // Stable, so equal counts keep scan order
    matches.sort_by(|a, b| b.match_count.cmp(&a.match_count));

    Ok(TraceReport {
        criteria,
        mode: options.mode,
        matches,
    })
}

async fn trace_all<S: MetadataSource>(
    source: &S,
    schema: &str,
    table: &str,
    columns: &[String],
    pairs: &SearchPairs,
    criteria: &str,
    options: &TraceOptions,
) -> Option<TraceMatch> {
    if !pairs.keys().all(|column| columns.contains(column)) {
        tracing::debug!(schema, table, "table lacks one or more searched columns");
        return None;
    }

    let conditions: Vec<(String, String)> = pairs.iter().map(|(c, v)| (c.clone(), v.clone())).collect();
    let rows = run_probe(source, schema, table, columns, conditions, options).await?;
    if rows.is_empty() {
        return None;
    }

    let records = if options.show_records {
        vec![MatchedRecords {
            criteria: criteria.to_string(),
            rows,
        }]
    } else {
        Vec::new()
    };

    Some(TraceMatch {
        schema: schema.to_string(),
        table: table.to_string(),
        match_count: pairs.len(),
        detail: criteria.to_string(),
        matched_columns: pairs.keys().cloned().collect(),
        records,
    })
}

async fn trace_any<S: MetadataSource>(
    source: &S,
    schema: &str,
    table: &str,
    columns: &[String],
    pairs: &SearchPairs,
    options: &TraceOptions,
) -> Option<TraceMatch> {
    let relevant: Vec<(&String, &String)> = pairs.iter().filter(|(c, _)| columns.contains(*c)).collect();
    if relevant.is_empty() {
        tracing::debug!(schema, table, "no searched columns in table");
        return None;
    }

    let mut details = Vec::new();
    let mut matched_columns = Vec::new();
    let mut records = Vec::new();
    for (column, value) in relevant {
        let conditions = vec![(column.clone(), value.clone())];
        let Some(rows) = run_probe(source, schema, table, columns, conditions, options).await else {
            continue;
        };
        if rows.is_empty() {
            continue;
        }

        let detail = format!("{} = {}", column, value);
        if options.show_records {
            records.push(MatchedRecords {
                criteria: detail.clone(),
                rows,
            });
        }
        details.push(detail);
        matched_columns.push(column.clone());
    }

    if details.is_empty() {
        return None;
    }

    Some(TraceMatch {
        schema: schema.to_string(),
        table: table.to_string(),
        match_count: details.len(),
        detail: details.join(", "),
        matched_columns,
        records,
    })
}

/// Run one lookup; failures are logged and reported as `None`
async fn run_probe<S: MetadataSource>(
    source: &S,
    schema: &str,
    table: &str,
    columns: &[String],
    conditions: Vec<(String, String)>,
    options: &TraceOptions,
) -> Option<RowSet> {
    let probe = Probe {
        schema: schema.to_string(),
        table: table.to_string(),
        conditions,
        select: options.show_records.then(|| columns.to_vec()),
        limit: if options.show_records { options.limit.max(1) } else { 1 },
    };

    match source.probe(&probe).await {
        Ok(rows) => Some(rows),
        Err(e) => {
            tracing::warn!(schema, table, "query failed: {:#}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::investigator::source::fake::{FakeSource, FakeTable};

    fn pairs(items: &[(&str, &str)]) -> SearchPairs {
        items.iter().map(|(c, v)| (c.to_string(), v.to_string())).collect()
    }

    fn warehouse() -> FakeSource {
        FakeSource::default()
            .with(
                "public",
                "stock",
                FakeTable::new(&["wh_id", "pro_id", "qty"])
                    .row(&["254", "780", "12"])
                    .row(&["254", "781", "3"])
                    .row(&["255", "780", "0"]),
            )
            .with(
                "public",
                "products",
                FakeTable::new(&["pro_id", "pro_code"]).row(&["780", "300134"]),
            )
            .with("public", "warehouses", FakeTable::new(&["wh_id", "name"]).row(&["254", "Main"]))
            .with("archive", "stock", FakeTable::new(&["wh_id", "pro_id"]).row(&["254", "780"]))
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("and".parse::<TraceMode>().unwrap(), TraceMode::And);
        assert_eq!("Or".parse::<TraceMode>().unwrap(), TraceMode::Or);
        let err = "xor".parse::<TraceMode>().unwrap_err();
        assert_eq!(err.to_string(), "invalid trace mode 'xor': must be 'AND' or 'OR'");
    }

    #[test]
    fn test_parse_search_pair() {
        assert_eq!(parse_search_pair("wh_id=254").unwrap(), ("wh_id".into(), "254".into()));
        assert_eq!(parse_search_pair("expr=a=b").unwrap(), ("expr".into(), "a=b".into()));
        assert_eq!(parse_search_pair("note=").unwrap(), ("note".into(), "".into()));
        assert!(parse_search_pair("wh_id").is_err());
        assert!(parse_search_pair("=254").is_err());
    }

    #[test]
    fn test_criteria_summary() {
        let p = pairs(&[("wh_id", "254"), ("pro_id", "780")]);
        assert_eq!(criteria_summary(&p, TraceMode::And), "(wh_id = 254) AND (pro_id = 780)");
        assert_eq!(criteria_summary(&p, TraceMode::Or), "(wh_id = 254) OR (pro_id = 780)");
    }

    #[tokio::test]
    async fn test_and_mode_requires_every_column() {
        let options = TraceOptions {
            mode: TraceMode::And,
            ..Default::default()
        };
        let report = trace(&warehouse(), &pairs(&[("wh_id", "254"), ("pro_id", "780")]), &options)
            .await
            .unwrap();

        assert_eq!(report.matches.len(), 1);
        let hit = &report.matches[0];
        assert_eq!(hit.full_name(), "public.stock");
        assert_eq!(hit.match_count, 2);
        assert_eq!(hit.detail, "(wh_id = 254) AND (pro_id = 780)");
        assert!(hit.records.is_empty());
    }

    #[tokio::test]
    async fn test_and_mode_without_matching_row() {
        let options = TraceOptions {
            mode: TraceMode::And,
            ..Default::default()
        };
        let report = trace(&warehouse(), &pairs(&[("wh_id", "255"), ("pro_id", "781")]), &options)
            .await
            .unwrap();
        assert!(report.matches.is_empty());
    }

    #[tokio::test]
    async fn test_or_mode_counts_and_sorts() {
        let report = trace(
            &warehouse(),
            &pairs(&[("wh_id", "254"), ("pro_id", "780"), ("pro_code", "300134")]),
            &TraceOptions::default(),
        )
        .await
        .unwrap();

        let summary: Vec<(String, usize)> = report
            .matches
            .iter()
            .map(|m| (m.table.clone(), m.match_count))
            .collect();
        // BTreeMap order in the fake: products, stock, warehouses
        assert_eq!(
            summary,
            vec![("products".into(), 2), ("stock".into(), 2), ("warehouses".into(), 1)]
        );
        assert_eq!(report.matches[0].detail, "pro_id = 780, pro_code = 300134");
        assert_eq!(report.matches[1].matched_columns, vec!["wh_id", "pro_id"]);
    }

    #[tokio::test]
    async fn test_all_schemas_and_records() {
        let options = TraceOptions {
            mode: TraceMode::Or,
            scope: SchemaScope::All,
            show_records: true,
            limit: 1,
        };
        let report = trace(&warehouse(), &pairs(&[("wh_id", "254")]), &options).await.unwrap();

        let tables: Vec<String> = report.matches.iter().map(|m| m.full_name()).collect();
        assert_eq!(tables, vec!["archive.stock", "public.stock", "public.warehouses"]);

        let stock = &report.matches[1];
        assert_eq!(stock.records.len(), 1);
        assert_eq!(stock.records[0].criteria, "wh_id = 254");
        assert_eq!(stock.records[0].rows.columns, vec!["wh_id", "pro_id", "qty"]);
        assert_eq!(stock.records[0].rows.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_queries_are_skipped() {
        let mut source = warehouse();
        source.broken.insert("stock".to_string());
        let report = trace(&source, &pairs(&[("wh_id", "254")]), &TraceOptions::default())
            .await
            .unwrap();
        let tables: Vec<&str> = report.matches.iter().map(|m| m.table.as_str()).collect();
        assert_eq!(tables, vec!["warehouses"]);
    }
}
