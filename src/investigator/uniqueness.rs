use anyhow::Result;

use crate::error::SchemaDocError;

use super::source::{MetadataSource, RowSet};

/// Number of duplicate groups reported
pub const DUPLICATE_GROUP_LIMIT: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Uniqueness {
    Unique,
    /// Top duplicate groups with a trailing `duplicate_count` column
    NotUnique(RowSet),
}

/// Check whether a column combination is unique across a table
pub async fn check_uniqueness<S: MetadataSource>(
    source: &S,
    schema: &str,
    table: &str,
    columns: &[String],
) -> Result<Uniqueness> {
    if !source.has_table(schema, table).await? {
        return Err(SchemaDocError::TableNotFound(format!("{}.{}", schema, table)).into());
    }

    let existing: Vec<String> = source.columns(schema, table).await?.into_iter().map(|c| c.name).collect();
    let missing: Vec<String> = columns.iter().filter(|c| !existing.contains(c)).cloned().collect();
    if !missing.is_empty() {
        return Err(SchemaDocError::UnknownColumns {
            table: format!("{}.{}", schema, table),
            columns: missing,
        }
        .into());
    }

    tracing::info!(schema, table, columns = %columns.join(", "), "checking uniqueness");
    let groups = source
        .duplicate_groups(schema, table, columns, DUPLICATE_GROUP_LIMIT)
        .await?;

    Ok(if groups.is_empty() {
        Uniqueness::Unique
    } else {
        Uniqueness::NotUnique(groups)
    })
}
