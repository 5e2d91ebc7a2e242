use petgraph::stable_graph::StableDiGraph;

/// Table relationship graph; edges point from the referencing table to the referenced one
pub type RelationshipGraph = StableDiGraph<TableNode, RefEdge>;

/// Kinds of nodes in the relationship graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Table,
    /// Referenced table absent from the (filtered) catalog
    Phantom,
}

impl NodeKind {
    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::Table => "table",
            NodeKind::Phantom => "phantom",
        }
    }
}

/// Column details carried on a graph node for ER rendering
#[derive(Debug, Clone)]
pub struct ColumnSummary {
    pub name: String,
    pub data_type: String,
    pub primary_key: bool,
    pub foreign_key: bool,
}

#[derive(Debug, Clone)]
pub struct TableNode {
    /// Fully qualified name (e.g. "public.orders")
    pub full_name: String,
    /// Bare table name (e.g. "orders")
    pub label: String,
    pub schema: Option<String>,
    pub remarks: Option<String>,
    pub kind: NodeKind,
    pub columns: Vec<ColumnSummary>,
}

impl TableNode {
    pub fn phantom(full_name: &str) -> Self {
        let label = full_name.rsplit('.').next().unwrap_or(full_name).to_string();
        Self {
            full_name: full_name.to_string(),
            label,
            schema: None,
            remarks: None,
            kind: NodeKind::Phantom,
            columns: Vec::new(),
        }
    }

    /// Display name with a marker for phantom nodes
    pub fn display_name(&self) -> String {
        match self.kind {
            NodeKind::Table => self.full_name.clone(),
            NodeKind::Phantom => format!("?:{}", self.full_name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeType {
    /// Declared foreign key
    ForeignKey,
    /// Weak association from an attributes file
    Weak,
}

impl EdgeType {
    pub fn label(&self) -> &'static str {
        match self {
            EdgeType::ForeignKey => "foreign key",
            EdgeType::Weak => "weak",
        }
    }
}

#[derive(Debug, Clone)]
pub struct RefEdge {
    pub edge_type: EdgeType,
    pub name: String,
    /// (referencing column, referenced column)
    pub column_pairs: Vec<(String, String)>,
    pub delete_rule: Option<String>,
}
