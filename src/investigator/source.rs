use anyhow::Result;

/// Column metadata as reported by the database catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyInfo {
    pub name: String,
    pub constrained_columns: Vec<String>,
    pub referred_schema: String,
    pub referred_table: String,
    pub referred_columns: Vec<String>,
}

/// Query result with every value rendered as text (`None` for NULL)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl RowSet {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

/// A lookup of rows matching `column::text = value` conditions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Probe {
    pub schema: String,
    pub table: String,
    /// (column, value) pairs combined with AND
    pub conditions: Vec<(String, String)>,
    /// Columns to return; `None` only tests for existence
    pub select: Option<Vec<String>>,
    pub limit: usize,
}

/// Access to database metadata and the handful of queries the investigator runs
#[allow(async_fn_in_trait)]
pub trait MetadataSource {
    async fn schema_names(&self) -> Result<Vec<String>>;

    async fn table_names(&self, schema: &str) -> Result<Vec<String>>;

    async fn has_table(&self, schema: &str, table: &str) -> Result<bool>;

    /// Columns in ordinal order
    async fn columns(&self, schema: &str, table: &str) -> Result<Vec<ColumnInfo>>;

    async fn primary_key(&self, schema: &str, table: &str) -> Result<Vec<String>>;

    async fn foreign_keys(&self, schema: &str, table: &str) -> Result<Vec<ForeignKeyInfo>>;

    async fn probe(&self, probe: &Probe) -> Result<RowSet>;

    /// Groups of `columns` values occurring more than once, largest first
    async fn duplicate_groups(&self, schema: &str, table: &str, columns: &[String], limit: usize) -> Result<RowSet>;
}
