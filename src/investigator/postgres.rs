use anyhow::{Context, Result};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgRow};
use sqlx::{Column, Row, TypeInfo};

use super::config::ConnectionConfig;
use super::source::*;
use super::sql;

/// `MetadataSource` backed by a live PostgreSQL database
#[derive(Clone)]
pub struct PostgresSource {
    pool: PgPool,
}

impl PostgresSource {
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.database);

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to connect to {}", config.display_url()))?;

        tracing::info!(database = %config.database, host = %config.host, "connected");
        Ok(Self { pool })
    }
}

impl MetadataSource for PostgresSource {
    async fn schema_names(&self) -> Result<Vec<String>> {
        let names = sqlx::query_scalar::<_, String>(
            r#"SELECT nspname::text FROM pg_catalog.pg_namespace
               WHERE nspname NOT LIKE 'pg\_%' AND nspname <> 'information_schema'
               ORDER BY nspname"#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(names)
    }

    async fn table_names(&self, schema: &str) -> Result<Vec<String>> {
        let names = sqlx::query_scalar::<_, String>(
            r#"SELECT c.relname::text FROM pg_catalog.pg_class c
               JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
               WHERE n.nspname = $1 AND c.relkind IN ('r', 'p')
               ORDER BY c.relname"#,
        )
        .bind(schema)
        .fetch_all(&self.pool)
        .await?;
        Ok(names)
    }

    async fn has_table(&self, schema: &str, table: &str) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"SELECT EXISTS (
                 SELECT 1 FROM pg_catalog.pg_class c
                 JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
                 WHERE n.nspname = $1 AND c.relname = $2 AND c.relkind IN ('r', 'p', 'v', 'm', 'f')
               )"#,
        )
        .bind(schema)
        .bind(table)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn columns(&self, schema: &str, table: &str) -> Result<Vec<ColumnInfo>> {
        let rows = sqlx::query(
            r#"SELECT a.attname::text AS name,
                      format_type(a.atttypid, a.atttypmod) AS data_type,
                      NOT a.attnotnull AS nullable
               FROM pg_catalog.pg_attribute a
               JOIN pg_catalog.pg_class c ON c.oid = a.attrelid
               JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
               WHERE n.nspname = $1 AND c.relname = $2 AND a.attnum > 0 AND NOT a.attisdropped
               ORDER BY a.attnum"#,
        )
        .bind(schema)
        .bind(table)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(ColumnInfo {
                    name: row.try_get("name")?,
                    data_type: row.try_get("data_type")?,
                    nullable: row.try_get("nullable")?,
                })
            })
            .collect()
    }

    async fn primary_key(&self, schema: &str, table: &str) -> Result<Vec<String>> {
        let columns = sqlx::query_scalar::<_, String>(
            r#"SELECT a.attname::text
               FROM pg_catalog.pg_index i
               JOIN pg_catalog.pg_class c ON c.oid = i.indrelid
               JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
               JOIN pg_catalog.pg_attribute a ON a.attrelid = c.oid AND a.attnum = ANY(i.indkey)
               WHERE i.indisprimary AND n.nspname = $1 AND c.relname = $2
               ORDER BY array_position(i.indkey::int2[], a.attnum)"#,
        )
        .bind(schema)
        .bind(table)
        .fetch_all(&self.pool)
        .await?;
        Ok(columns)
    }

    async fn foreign_keys(&self, schema: &str, table: &str) -> Result<Vec<ForeignKeyInfo>> {
        let rows = sqlx::query(
            r#"SELECT con.conname::text AS name,
                      ARRAY(SELECT att.attname::text
                            FROM unnest(con.conkey) WITH ORDINALITY AS k(attnum, ord)
                            JOIN pg_catalog.pg_attribute att
                              ON att.attrelid = con.conrelid AND att.attnum = k.attnum
                            ORDER BY k.ord) AS constrained_columns,
                      fn.nspname::text AS referred_schema,
                      fc.relname::text AS referred_table,
                      ARRAY(SELECT att.attname::text
                            FROM unnest(con.confkey) WITH ORDINALITY AS k(attnum, ord)
                            JOIN pg_catalog.pg_attribute att
                              ON att.attrelid = con.confrelid AND att.attnum = k.attnum
                            ORDER BY k.ord) AS referred_columns
               FROM pg_catalog.pg_constraint con
               JOIN pg_catalog.pg_class c ON c.oid = con.conrelid
               JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
               JOIN pg_catalog.pg_class fc ON fc.oid = con.confrelid
               JOIN pg_catalog.pg_namespace fn ON fn.oid = fc.relnamespace
               WHERE con.contype = 'f' AND n.nspname = $1 AND c.relname = $2
               ORDER BY con.conname"#,
        )
        .bind(schema)
        .bind(table)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(ForeignKeyInfo {
                    name: row.try_get("name")?,
                    constrained_columns: row.try_get("constrained_columns")?,
                    referred_schema: row.try_get("referred_schema")?,
                    referred_table: row.try_get("referred_table")?,
                    referred_columns: row.try_get("referred_columns")?,
                })
            })
            .collect()
    }

    async fn probe(&self, probe: &Probe) -> Result<RowSet> {
        let statement = sql::probe_sql(probe);
        tracing::trace!(sql = %statement, "probe");

        let mut query = sqlx::query(&statement);
        for (_, value) in &probe.conditions {
            query = query.bind(value);
        }
        let rows = query.fetch_all(&self.pool).await?;
        Ok(row_set(&rows))
    }

    async fn duplicate_groups(&self, schema: &str, table: &str, columns: &[String], limit: usize) -> Result<RowSet> {
        let statement = sql::duplicate_sql(schema, table, columns, limit);
        tracing::trace!(sql = %statement, "duplicate groups");

        let rows = sqlx::query(&statement).fetch_all(&self.pool).await?;
        let mut set = row_set(&rows);
        if set.columns.is_empty() {
            set.columns = columns.to_vec();
            set.columns.push("duplicate_count".to_string());
        }
        Ok(set)
    }
}

fn row_set(rows: &[PgRow]) -> RowSet {
    let columns = rows
        .first()
        .map(|row| row.columns().iter().map(|c| c.name().to_string()).collect())
        .unwrap_or_default();
    RowSet {
        columns,
        rows: rows.iter().map(row_values).collect(),
    }
}

/// Render every column of a row as text
fn row_values(row: &PgRow) -> Vec<Option<String>> {
    row.columns()
        .iter()
        .map(|column| {
            let idx = column.ordinal();
            match column.type_info().name() {
                "INT2" => row.try_get::<Option<i16>, _>(idx).ok().flatten().map(|v| v.to_string()),
                "INT4" => row.try_get::<Option<i32>, _>(idx).ok().flatten().map(|v| v.to_string()),
                "INT8" => row.try_get::<Option<i64>, _>(idx).ok().flatten().map(|v| v.to_string()),
                "BOOL" => row.try_get::<Option<bool>, _>(idx).ok().flatten().map(|v| v.to_string()),
                _ => row.try_get::<Option<String>, _>(idx).ok().flatten(),
            }
        })
        .collect()
}
