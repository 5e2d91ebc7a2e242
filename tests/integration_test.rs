use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures/schemacrawler")
        .join(name)
}

/// Run the binary from an empty directory with no database settings in the environment
fn schemadoc(cwd: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_schemadoc"))
        .args(args)
        .current_dir(cwd)
        .env_remove("DB_HOST")
        .env_remove("DB_PORT")
        .env_remove("DB_NAME")
        .env_remove("DB_USER")
        .env_remove("DB_PASS")
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1")
        .output()
        .expect("failed to run schemadoc")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

mod library {
    use super::*;
    use schemadoc::catalog::crawl_info::crawl_info;
    use schemadoc::catalog::document::Document;
    use schemadoc::catalog::loader::load_catalog;
    use schemadoc::convert::{prepare_catalog, CatalogOptions};
    use schemadoc::graph::builder::build_graph;
    use schemadoc::graph::filter::focus_graph;
    use schemadoc::graph::types::EdgeType;
    use schemadoc::render::dictionary::dictionary_rows;

    #[test]
    fn test_load_catalog_export() {
        let catalog = load_catalog(&fixture("shop_catalog.json")).unwrap();
        let names: Vec<&str> = catalog.tables.iter().map(|t| t.full_name.as_str()).collect();
        assert_eq!(names, vec!["public.customers", "public.orders", "public.shipments"]);

        let orders = catalog.find_table("public.orders").unwrap();
        assert_eq!(orders.primary_key, vec!["id"]);
        assert_eq!(orders.foreign_keys.len(), 1);
        let fk = &orders.foreign_keys[0];
        assert_eq!(fk.delete_rule.as_deref(), Some("cascade"));
        assert_eq!(fk.references[0].pk_table, "public.customers");
        assert_eq!(fk.references[0].fk_column, "customer_id");

        let customers = catalog.find_table("public.customers").unwrap();
        assert_eq!(customers.remarks, "People who place orders");
        assert!(customers.indexes.iter().any(|i| i.unique && i.columns == vec!["email"]));
    }

    #[test]
    fn test_crawl_info() {
        let doc = Document::load(&fixture("shop_catalog.json")).unwrap();
        let info = crawl_info(&doc).unwrap();
        assert_eq!(info.database_product.as_deref(), Some("PostgreSQL 16.2"));
        assert_eq!(info.schemacrawler_version.as_deref(), Some("SchemaCrawler 16.21.2"));
        assert_eq!(
            info.crawled_at.map(|t| t.to_string()).as_deref(),
            Some("2024-03-05 10:15:30.123")
        );
    }

    #[test]
    fn test_flat_export_groups_columns() {
        let catalog = load_catalog(&fixture("exports/inventory.json")).unwrap();
        assert_eq!(catalog.tables.len(), 2);
        let levels = catalog.find_table("stock.levels").unwrap();
        assert_eq!(levels.primary_key, vec!["wh_id", "pro_id"]);
        assert_eq!(levels.columns[2].default_value.as_deref(), Some("0"));
    }

    #[test]
    fn test_dictionary_rows_flag_unknown_types() {
        let catalog = load_catalog(&fixture("shop_catalog.json")).unwrap();
        let rows = dictionary_rows(&catalog);
        assert_eq!(rows.len(), 9);
        let carrier = rows.iter().find(|r| r.column == "carrier").unwrap();
        assert_eq!(carrier.data_type, "Unknown Ref");
        let email = rows.iter().find(|r| r.column == "email").unwrap();
        assert_eq!(email.size, Some(255));
        assert_eq!(email.remarks, "Login address");
    }

    #[test]
    fn test_weak_associations_join_the_graph() {
        let options = CatalogOptions {
            attributes: Some(fixture("dictionary.yaml")),
            ..Default::default()
        };
        let prepared = prepare_catalog(&fixture("shop_catalog.json"), &options).unwrap();
        let orders = prepared.catalog.find_table("public.orders").unwrap();
        assert_eq!(orders.remarks, "Orders placed by customers.\nOne row per checkout.");

        let graph = build_graph(&prepared.catalog, &prepared.weak_associations);
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);
        let weak: Vec<_> = graph
            .edge_indices()
            .filter(|&e| graph[e].edge_type == EdgeType::Weak)
            .collect();
        assert_eq!(weak.len(), 1);
        assert_eq!(graph[weak[0]].column_pairs, vec![("order_ref".to_string(), "id".to_string())]);

        let focused = focus_graph(&graph, "orders", None, Some(0)).unwrap();
        let mut names: Vec<String> = focused.node_indices().map(|i| focused[i].full_name.clone()).collect();
        names.sort();
        assert_eq!(names, vec!["public.customers", "public.orders"]);
    }
}

mod cli {
    use super::*;

    #[test]
    fn test_dbml_to_stdout() {
        let dir = tempfile::tempdir().unwrap();
        let shop = fixture("shop_catalog.json");
        let output = schemadoc(dir.path(), &["dbml", shop.to_str().unwrap()]);
        assert!(output.status.success(), "{}", stderr(&output));

        let dbml = stdout(&output);
        assert!(dbml.contains("Table \"public.customers\" {"));
        assert!(dbml.contains("Table \"public.orders\" {"));
        assert!(dbml.contains("\"nextval('customers_id_seq'::regclass)\""));
        assert!(dbml.contains("// Login address"));
    }

    #[test]
    fn test_dbml_catalog_style_with_attributes() {
        let dir = tempfile::tempdir().unwrap();
        let shop = fixture("shop_catalog.json");
        let attributes = fixture("dictionary.yaml");
        let out = dir.path().join("docs/shop.dbml");
        let output = schemadoc(
            dir.path(),
            &[
                "dbml",
                shop.to_str().unwrap(),
                "--style",
                "catalog",
                "--attributes",
                attributes.to_str().unwrap(),
                "-o",
                out.to_str().unwrap(),
            ],
        );
        assert!(output.status.success(), "{}", stderr(&output));
        assert!(stderr(&output).contains("Wrote 3 tables"));

        let dbml = std::fs::read_to_string(&out).unwrap();
        assert!(dbml.contains("Table orders {"));
        assert!(dbml.contains("note: 'Gross amount including tax'"));
        assert!(dbml.contains("Ref: customers.id < orders.customer_id [delete: cascade, update: noAction]"));
    }

    #[test]
    fn test_dbml_folder_reports_failures() {
        let dir = tempfile::tempdir().unwrap();
        let exports = fixture("exports");
        let out = dir.path().join("dbml");
        let output = schemadoc(dir.path(), &["dbml", exports.to_str().unwrap(), "-o", out.to_str().unwrap()]);

        assert!(!output.status.success());
        let err = stderr(&output);
        assert!(err.contains("1 converted, 1 failed"), "{}", err);
        assert!(out.join("inventory.dbml").exists());
        assert!(!out.join("broken.dbml").exists());
    }

    #[test]
    fn test_dbml_empty_folder() {
        let dir = tempfile::tempdir().unwrap();
        let output = schemadoc(dir.path(), &["dbml", "."]);
        assert!(output.status.success());
        assert!(stderr(&output).contains("No JSON exports found"));
    }

    #[test]
    fn test_dictionary_default_csv_file() {
        let dir = tempfile::tempdir().unwrap();
        let shop = fixture("shop_catalog.json");
        let output = schemadoc(dir.path(), &["dictionary", shop.to_str().unwrap()]);
        assert!(output.status.success(), "{}", stderr(&output));

        let csv = std::fs::read_to_string(dir.path().join("data_dictionary.csv")).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("Schema,Table,Column,Position,Data Type,Size,Nullable,PK,FK,Default,Remarks")
        );
        assert_eq!(lines.count(), 9);
        assert!(csv.contains("public,shipments,carrier,3,Unknown Ref,,Yes,No,No,,"));
    }

    #[test]
    fn test_dictionary_json_to_stdout() {
        let dir = tempfile::tempdir().unwrap();
        let shop = fixture("shop_catalog.json");
        let output = schemadoc(
            dir.path(),
            &["dictionary", shop.to_str().unwrap(), "-f", "json", "--include-tables", "public\\.customers"],
        );
        assert!(output.status.success(), "{}", stderr(&output));

        let rows: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
        let rows = rows.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["Column"], "id");
        assert_eq!(rows[0]["PK"], "Yes");
        assert!(!dir.path().join("data_dictionary.csv").exists());
    }

    #[test]
    fn test_erd_mermaid_with_weak_association() {
        let dir = tempfile::tempdir().unwrap();
        let shop = fixture("shop_catalog.json");
        let attributes = fixture("dictionary.yaml");
        let output = schemadoc(
            dir.path(),
            &[
                "erd",
                shop.to_str().unwrap(),
                "-f",
                "mermaid",
                "--attributes",
                attributes.to_str().unwrap(),
            ],
        );
        assert!(output.status.success(), "{}", stderr(&output));

        let mermaid = stdout(&output);
        assert!(mermaid.starts_with("erDiagram\n"));
        assert!(mermaid.contains("    public_orders }o--|| public_customers : \"customer_id\""));
        assert!(mermaid.contains("    public_shipments }o..|| public_orders : \"order_ref\""));
    }

    #[test]
    fn test_erd_focus_unknown_table() {
        let dir = tempfile::tempdir().unwrap();
        let shop = fixture("shop_catalog.json");
        let output = schemadoc(dir.path(), &["erd", shop.to_str().unwrap(), "-t", "invoices"]);
        assert!(!output.status.success());
        assert!(stderr(&output).contains("table not found: invoices"));
    }

    #[test]
    fn test_erd_dot_file() {
        let dir = tempfile::tempdir().unwrap();
        let shop = fixture("shop_catalog.json");
        let out = dir.path().join("schema.dot");
        let output = schemadoc(
            dir.path(),
            &["erd", shop.to_str().unwrap(), "-t", "orders", "--children", "0", "-o", out.to_str().unwrap()],
        );
        assert!(output.status.success(), "{}", stderr(&output));

        let dot = std::fs::read_to_string(&out).unwrap();
        assert!(dot.starts_with("digraph schema {"));
        assert!(dot.contains("\"public.orders\" -> \"public.customers\" [label=\"customer_id\"];"));
        assert!(!dot.contains("public.shipments"));
    }

    #[test]
    fn test_annotations_skeleton() {
        let dir = tempfile::tempdir().unwrap();
        let shop = fixture("shop_catalog.json");
        let output = schemadoc(dir.path(), &["annotations", shop.to_str().unwrap()]);
        assert!(output.status.success(), "{}", stderr(&output));

        let yaml: serde_yaml::Value = serde_yaml::from_str(&stdout(&output)).unwrap();
        let tables = yaml["tables"].as_sequence().unwrap();
        assert_eq!(tables.len(), 3);
        assert_eq!(tables[0]["name"].as_str(), Some("public.customers"));
        assert_eq!(tables[0]["remarks"].as_str(), Some("People who place orders"));
    }

    #[test]
    fn test_crawl_dry_run_masks_password() {
        let dir = tempfile::tempdir().unwrap();
        let output = schemadoc(
            dir.path(),
            &[
                "crawl",
                "--runner",
                "native",
                "--host",
                "localhost",
                "--database",
                "shop",
                "--user",
                "reader",
                "--password",
                "s3cret",
                "--dry-run",
            ],
        );
        assert!(output.status.success(), "{}", stderr(&output));

        let line = stdout(&output);
        assert!(line.starts_with("schemacrawler --server=postgresql --database=shop --host=localhost"));
        assert!(line.contains("--password=********"));
        assert!(!line.contains("s3cret"));
        assert!(line.contains("--command=schema --info-level=standard --output-format=html"));
    }

    #[test]
    fn test_inspect_features_needs_no_database() {
        let dir = tempfile::tempdir().unwrap();
        let output = schemadoc(dir.path(), &["inspect", "features"]);
        assert!(output.status.success(), "{}", stderr(&output));
        assert!(stdout(&output).contains("schemadoc inspect trace"));
    }

    #[test]
    fn test_inspect_reports_missing_settings() {
        let dir = tempfile::tempdir().unwrap();
        let output = schemadoc(dir.path(), &["inspect", "tables", "--host", "localhost"]);
        assert!(!output.status.success());
        let err = stderr(&output);
        assert!(err.contains("DB_USER"), "{}", err);
        assert!(err.contains("DB_NAME"), "{}", err);
    }

    #[test]
    fn test_missing_export_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let output = schemadoc(dir.path(), &["dbml", "nope.json"]);
        assert!(!output.status.success());
        assert!(stderr(&output).contains("nope.json"));
    }
}
