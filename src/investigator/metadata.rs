use anyhow::Result;

use crate::error::SchemaDocError;

use super::source::MetadataSource;
use super::trace::{resolve_schemas, SchemaScope};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct TableEntry {
    pub schema: String,
    pub table: String,
}

/// Tables in the scope, sorted by schema then name. Schemas that cannot be
/// listed are logged and skipped.
pub async fn list_tables<S: MetadataSource>(source: &S, scope: &SchemaScope) -> Result<Vec<TableEntry>> {
    let mut entries = Vec::new();
    for schema in resolve_schemas(source, scope).await? {
        match source.table_names(&schema).await {
            Ok(tables) => entries.extend(tables.into_iter().map(|table| TableEntry {
                schema: schema.clone(),
                table,
            })),
            Err(e) => tracing::warn!(schema = %schema, "could not access schema: {:#}", e),
        }
    }
    entries.sort();
    Ok(entries)
}

/// One row of a table description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescription {
    pub column: String,
    pub data_type: String,
    pub nullable: bool,
    pub primary_key: bool,
    /// `referred_table.column`
    pub foreign_key: Option<String>,
}

/// Columns of a table with their key constraints
pub async fn describe_table<S: MetadataSource>(source: &S, schema: &str, table: &str) -> Result<Vec<ColumnDescription>> {
    if !source.has_table(schema, table).await? {
        return Err(SchemaDocError::TableNotFound(format!("{}.{}", schema, table)).into());
    }

    let columns = source.columns(schema, table).await?;
    let primary_key = source.primary_key(schema, table).await?;
    let foreign_keys = source.foreign_keys(schema, table).await?;

    Ok(columns
        .into_iter()
        .map(|column| {
            // The last constraint naming a column wins
            let foreign_key = foreign_keys.iter().rev().find_map(|fk| {
                fk.constrained_columns
                    .iter()
                    .zip(&fk.referred_columns)
                    .find(|(local, _)| **local == column.name)
                    .map(|(_, remote)| format!("{}.{}", fk.referred_table, remote))
            });
            ColumnDescription {
                primary_key: primary_key.contains(&column.name),
                column: column.name,
                data_type: column.data_type,
                nullable: column.nullable,
                foreign_key,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::investigator::source::fake::{FakeSource, FakeTable};
    use crate::investigator::source::ForeignKeyInfo;

    fn source() -> FakeSource {
        let mut orders = FakeTable::new(&["id", "customer_id", "note"]);
        orders.primary_key = vec!["id".into()];
        orders.columns[0].nullable = false;
        orders.columns[0].data_type = "integer".into();
        orders.foreign_keys.push(ForeignKeyInfo {
            name: "orders_customer_fk".into(),
            constrained_columns: vec!["customer_id".into()],
            referred_schema: "public".into(),
            referred_table: "customers".into(),
            referred_columns: vec!["id".into()],
        });

        FakeSource::default()
            .with("public", "orders", orders)
            .with("public", "customers", FakeTable::new(&["id"]))
            .with("audit", "log", FakeTable::new(&["id"]))
    }

    #[tokio::test]
    async fn test_list_tables_single_schema() {
        let tables = list_tables(&source(), &SchemaScope::One("public".into())).await.unwrap();
        let names: Vec<&str> = tables.iter().map(|t| t.table.as_str()).collect();
        assert_eq!(names, vec!["customers", "orders"]);
    }

    #[tokio::test]
    async fn test_list_tables_all_schemas_sorted() {
        let tables = list_tables(&source(), &SchemaScope::All).await.unwrap();
        assert_eq!(tables.len(), 3);
        assert_eq!(tables[0].schema, "audit");
    }

    #[tokio::test]
    async fn test_list_tables_empty_schema() {
        let tables = list_tables(&source(), &SchemaScope::One("missing".into())).await.unwrap();
        assert!(tables.is_empty());
    }

    #[tokio::test]
    async fn test_describe_table() {
        let rows = describe_table(&source(), "public", "orders").await.unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows[0].primary_key);
        assert!(!rows[0].nullable);
        assert_eq!(rows[0].data_type, "integer");
        assert_eq!(rows[1].foreign_key.as_deref(), Some("customers.id"));
        assert_eq!(rows[2].foreign_key, None);
    }

    #[tokio::test]
    async fn test_describe_missing_table() {
        let err = describe_table(&source(), "public", "nope").await.unwrap_err();
        assert_eq!(err.to_string(), "table not found: public.nope");
    }
}
