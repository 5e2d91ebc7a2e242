//! SQL text for the investigator queries. Identifiers are always quoted and
//! values are always bound as `$n` parameters.

use super::source::Probe;

/// Quote an identifier, doubling embedded quotes
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

pub fn qualified(schema: &str, table: &str) -> String {
    format!("{}.{}", quote_ident(schema), quote_ident(table))
}

/// `SELECT` for a probe; bind the condition values in order
pub fn probe_sql(probe: &Probe) -> String {
    let select = match &probe.select {
        Some(columns) if !columns.is_empty() => columns
            .iter()
            .map(|c| format!("{}::text AS {}", quote_ident(c), quote_ident(c)))
            .collect::<Vec<_>>()
            .join(", "),
        _ => "1".to_string(),
    };

    let mut sql = format!("SELECT {} FROM {}", select, qualified(&probe.schema, &probe.table));
    if !probe.conditions.is_empty() {
        let conditions: Vec<String> = probe
            .conditions
            .iter()
            .enumerate()
            .map(|(i, (column, _))| format!("{}::text = ${}", quote_ident(column), i + 1))
            .collect();
        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" AND "));
    }
    sql.push_str(&format!(" LIMIT {}", probe.limit));
    sql
}

/// Duplicate groups of a column combination, most frequent first
pub fn duplicate_sql(schema: &str, table: &str, columns: &[String], limit: usize) -> String {
    let projected = columns
        .iter()
        .map(|c| format!("{}::text AS {}", quote_ident(c), quote_ident(c)))
        .collect::<Vec<_>>()
        .join(", ");
    let grouped = columns.iter().map(|c| quote_ident(c)).collect::<Vec<_>>().join(", ");
    format!(
        "SELECT {}, COUNT(*) AS duplicate_count FROM {} GROUP BY {} HAVING COUNT(*) > 1 ORDER BY duplicate_count DESC LIMIT {}",
        projected,
        qualified(schema, table),
        grouped,
        limit
    )
}
