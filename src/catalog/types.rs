use serde::Serialize;

/// Tables extracted from a SchemaCrawler export, in document order
#[derive(Debug, Clone, Default, Serialize)]
pub struct Catalog {
    pub tables: Vec<Table>,
}

impl Catalog {
    /// Find a table by full name, falling back to its bare name
    pub fn find_table(&self, name: &str) -> Option<&Table> {
        self.tables
            .iter()
            .find(|t| t.full_name == name)
            .or_else(|| self.tables.iter().find(|t| t.name == name))
    }

    pub fn find_table_mut(&mut self, name: &str) -> Option<&mut Table> {
        let pos = self
            .tables
            .iter()
            .position(|t| t.full_name == name)
            .or_else(|| self.tables.iter().position(|t| t.name == name))?;
        Some(&mut self.tables[pos])
    }

    pub fn column_count(&self) -> usize {
        self.tables.iter().map(|t| t.columns.len()).sum()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Table {
    pub schema: Option<String>,
    pub name: String,
    pub full_name: String,
    pub remarks: String,
    pub columns: Vec<Column>,
    /// Primary key column names in key order
    pub primary_key: Vec<String>,
    pub indexes: Vec<Index>,
    pub foreign_keys: Vec<ForeignKey>,
}

impl Table {
    pub fn new(schema: Option<String>, name: impl Into<String>) -> Self {
        let name = name.into();
        let full_name = match &schema {
            Some(s) => format!("{}.{}", s, name),
            None => name.clone(),
        };
        Self {
            schema,
            name,
            full_name,
            remarks: String::new(),
            columns: Vec::new(),
            primary_key: Vec::new(),
            indexes: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn is_primary_key_column(&self, name: &str) -> bool {
        self.primary_key.iter().any(|c| c == name)
    }
}

/// How a column's data type was resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum DataTypeRef {
    Named(String),
    /// A uuid reference that does not resolve to any object
    Dangling(String),
    Missing,
}

impl DataTypeRef {
    pub fn name_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        match self {
            DataTypeRef::Named(name) => name,
            _ => fallback,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Column {
    pub name: String,
    pub full_name: String,
    pub ordinal_position: Option<i64>,
    pub data_type: DataTypeRef,
    pub width: Option<String>,
    pub size: Option<i64>,
    pub nullable: bool,
    pub default_value: Option<String>,
    pub part_of_primary_key: bool,
    pub part_of_unique_index: bool,
    pub part_of_foreign_key: bool,
    pub auto_incremented: bool,
    pub generated: bool,
    pub remarks: String,
}

impl Column {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            full_name: name.clone(),
            name,
            ordinal_position: None,
            data_type: DataTypeRef::Missing,
            width: None,
            size: None,
            nullable: true,
            default_value: None,
            part_of_primary_key: false,
            part_of_unique_index: false,
            part_of_foreign_key: false,
            auto_incremented: false,
            generated: false,
            remarks: String::new(),
        }
    }

    /// Width or size suffix, e.g. `(255)`
    pub fn size_suffix(&self) -> String {
        if let Some(width) = self.width.as_deref().map(str::trim) {
            if width.starts_with('(') {
                return width.to_string();
            }
        }
        match self.size {
            Some(size) if size > 0 => format!("({})", size),
            _ => String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Index {
    pub name: String,
    pub unique: bool,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ForeignKey {
    pub name: String,
    pub references: Vec<ColumnReference>,
    pub delete_rule: Option<String>,
    pub update_rule: Option<String>,
}

/// One column pair of a foreign key; table names are fully qualified
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ColumnReference {
    pub fk_table: String,
    pub fk_column: String,
    pub pk_table: String,
    pub pk_column: String,
}
