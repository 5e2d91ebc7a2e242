use std::collections::{HashMap, HashSet};

use petgraph::stable_graph::NodeIndex;

use crate::catalog::attributes::WeakAssociation;
use crate::catalog::types::{Catalog, ForeignKey, Table};

use super::types::*;

/// Build the relationship graph from a catalog and optional weak associations.
///
/// Foreign keys whose referencing table is not in the catalog are skipped;
/// referenced tables that are missing become phantom nodes.
pub fn build_graph(catalog: &Catalog, weak: &[WeakAssociation]) -> RelationshipGraph {
    let mut graph = RelationshipGraph::new();
    let mut node_map: HashMap<String, NodeIndex> = HashMap::new();

    for table in &catalog.tables {
        let idx = graph.add_node(table_node(table));
        node_map.insert(table.full_name.clone(), idx);
    }

    let mut seen: HashSet<(String, String, String)> = HashSet::new();

    for table in &catalog.tables {
        for fk in &table.foreign_keys {
            add_foreign_key(&mut graph, &mut node_map, &mut seen, catalog, fk);
        }
    }

    for association in weak {
        add_weak_association(&mut graph, &mut node_map, &mut seen, catalog, association);
    }

    graph
}

fn table_node(table: &Table) -> TableNode {
    let fk_columns: HashSet<&str> = table
        .foreign_keys
        .iter()
        .flat_map(|fk| fk.references.iter())
        .filter(|r| r.fk_table == table.full_name)
        .map(|r| r.fk_column.as_str())
        .collect();

    TableNode {
        full_name: table.full_name.clone(),
        label: table.name.clone(),
        schema: table.schema.clone(),
        remarks: Some(table.remarks.clone()).filter(|r| !r.trim().is_empty()),
        kind: NodeKind::Table,
        columns: table
            .columns
            .iter()
            .map(|c| ColumnSummary {
                name: c.name.clone(),
                data_type: c.data_type.name_or("unknown").to_string(),
                primary_key: c.part_of_primary_key || table.is_primary_key_column(&c.name),
                foreign_key: c.part_of_foreign_key || fk_columns.contains(c.name.as_str()),
            })
            .collect(),
    }
}

fn add_foreign_key(
    graph: &mut RelationshipGraph,
    node_map: &mut HashMap<String, NodeIndex>,
    seen: &mut HashSet<(String, String, String)>,
    catalog: &Catalog,
    fk: &ForeignKey,
) {
    // Group column references per (referencing, referenced) table pair
    let mut pairs: Vec<((String, String), Vec<(String, String)>)> = Vec::new();
    for r in &fk.references {
        let key = (r.fk_table.clone(), r.pk_table.clone());
        let pair = (r.fk_column.clone(), r.pk_column.clone());
        match pairs.iter_mut().find(|(k, _)| *k == key) {
            Some((_, cols)) => cols.push(pair),
            None => pairs.push((key, vec![pair])),
        }
    }

    for ((fk_table, pk_table), column_pairs) in pairs {
        let edge = RefEdge {
            edge_type: EdgeType::ForeignKey,
            name: fk.name.clone(),
            column_pairs,
            delete_rule: fk.delete_rule.clone(),
        };
        connect(graph, node_map, seen, catalog, &fk_table, &pk_table, edge);
    }
}

fn add_weak_association(
    graph: &mut RelationshipGraph,
    node_map: &mut HashMap<String, NodeIndex>,
    seen: &mut HashSet<(String, String, String)>,
    catalog: &Catalog,
    association: &WeakAssociation,
) {
    let referencing = canonical_name(catalog, &association.referencing_table);
    let referenced = canonical_name(catalog, &association.referenced_table);
    let edge = RefEdge {
        edge_type: EdgeType::Weak,
        name: format!("{} -> {}", referencing, referenced),
        column_pairs: association
            .column_references
            .iter()
            .map(|(from, to)| (from.clone(), to.clone()))
            .collect(),
        delete_rule: None,
    };
    connect(graph, node_map, seen, catalog, &referencing, &referenced, edge);
}

fn connect(
    graph: &mut RelationshipGraph,
    node_map: &mut HashMap<String, NodeIndex>,
    seen: &mut HashSet<(String, String, String)>,
    catalog: &Catalog,
    referencing: &str,
    referenced: &str,
    edge: RefEdge,
) {
    let Some(&from) = node_map.get(referencing) else {
        tracing::debug!(referencing, "skipping relationship from a table outside the catalog");
        return;
    };

    if !seen.insert((referencing.to_string(), referenced.to_string(), edge.name.clone())) {
        return;
    }

    let to = match node_map.get(referenced) {
        Some(&idx) => idx,
        None => {
            let name = canonical_name(catalog, referenced);
            let idx = graph.add_node(TableNode::phantom(&name));
            node_map.insert(name, idx);
            idx
        }
    };

    graph.add_edge(from, to, edge);
}

/// Map a bare table name to its full name when the catalog knows it
fn canonical_name(catalog: &Catalog, name: &str) -> String {
    catalog
        .find_table(name)
        .map(|t| t.full_name.clone())
        .unwrap_or_else(|| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::types::{Column, ColumnReference, ForeignKey};
    use indexmap::IndexMap;
    use petgraph::visit::{EdgeRef, IntoEdgeReferences};

    fn reference(fk_table: &str, fk_col: &str, pk_table: &str, pk_col: &str) -> ColumnReference {
        ColumnReference {
            fk_table: fk_table.into(),
            fk_column: fk_col.into(),
            pk_table: pk_table.into(),
            pk_column: pk_col.into(),
        }
    }

    fn shop_catalog() -> Catalog {
        let mut customers = Table::new(Some("shop".into()), "customers");
        customers.columns.push(Column::new("id"));
        customers.primary_key = vec!["id".into()];

        let mut orders = Table::new(Some("shop".into()), "orders");
        orders.columns.push(Column::new("id"));
        orders.columns.push(Column::new("customer_id"));
        let fk = ForeignKey {
            name: "orders_customer_fk".into(),
            references: vec![reference("shop.orders", "customer_id", "shop.customers", "id")],
            delete_rule: Some("cascade".into()),
            update_rule: None,
        };
        orders.foreign_keys.push(fk.clone());
        // Exported side of the same key, as SchemaCrawler lists it on both tables
        customers.foreign_keys.push(fk);

        Catalog {
            tables: vec![customers, orders],
        }
    }

    #[test]
    fn test_foreign_key_edges_are_deduplicated() {
        let graph = build_graph(&shop_catalog(), &[]);
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);

        let edge = graph.edge_references().next().unwrap();
        assert_eq!(graph[edge.source()].full_name, "shop.orders");
        assert_eq!(graph[edge.target()].full_name, "shop.customers");
        assert_eq!(edge.weight().column_pairs, vec![("customer_id".into(), "id".into())]);
        assert_eq!(edge.weight().delete_rule.as_deref(), Some("cascade"));
    }

    #[test]
    fn test_column_summary_flags() {
        let graph = build_graph(&shop_catalog(), &[]);
        let orders = graph
            .node_indices()
            .find(|&i| graph[i].label == "orders")
            .unwrap();
        let customer_id = graph[orders]
            .columns
            .iter()
            .find(|c| c.name == "customer_id")
            .unwrap();
        assert!(customer_id.foreign_key);
        assert!(!customer_id.primary_key);

        let customers = graph
            .node_indices()
            .find(|&i| graph[i].label == "customers")
            .unwrap();
        assert!(graph[customers].columns[0].primary_key);
    }

    #[test]
    fn test_missing_referenced_table_becomes_phantom() {
        let mut catalog = shop_catalog();
        catalog.tables.remove(0);
        let graph = build_graph(&catalog, &[]);
        assert_eq!(graph.node_count(), 2);
        let phantom = graph
            .node_indices()
            .find(|&i| graph[i].kind == NodeKind::Phantom)
            .expect("Should have a phantom node");
        assert_eq!(graph[phantom].full_name, "shop.customers");
    }

    #[test]
    fn test_missing_referencing_table_is_skipped() {
        let mut catalog = shop_catalog();
        catalog.tables.remove(1);
        let graph = build_graph(&catalog, &[]);
        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_weak_association_edge() {
        let weak = WeakAssociation {
            referencing_table: "orders".into(),
            referenced_table: "shop.customers".into(),
            column_references: IndexMap::from([("customer_ref".to_string(), "id".to_string())]),
        };
        let graph = build_graph(&shop_catalog(), &[weak]);
        assert_eq!(graph.edge_count(), 2);
        let weak_edge = graph
            .edge_references()
            .find(|e| e.weight().edge_type == EdgeType::Weak)
            .unwrap();
        assert_eq!(graph[weak_edge.source()].full_name, "shop.orders");
        assert_eq!(weak_edge.weight().name, "shop.orders -> shop.customers");
    }

    #[test]
    fn test_empty_catalog() {
        let graph = build_graph(&Catalog::default(), &[]);
        assert_eq!(graph.node_count(), 0);
    }
}
