use chrono::{DateTime, NaiveDateTime};
use serde_json::Value;

use super::document::{first_str, Document};

/// Provenance of an export, when SchemaCrawler recorded it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlInfo {
    pub crawled_at: Option<NaiveDateTime>,
    pub database_product: Option<String>,
    pub schemacrawler_version: Option<String>,
}

impl CrawlInfo {
    pub fn is_empty(&self) -> bool {
        self == &CrawlInfo::default()
    }
}

/// Read `crawl-info` from the catalog or the document root
pub fn crawl_info(doc: &Document) -> Option<CrawlInfo> {
    let raw = doc
        .root
        .get("catalog")
        .and_then(|c| c.get("crawl-info"))
        .or_else(|| doc.root.get("crawl-info"))?;
    let info = doc.resolve(raw)?;

    let crawl = CrawlInfo {
        crawled_at: first_str(info, &["crawl-timestamp", "crawl-date"]).and_then(parse_timestamp),
        database_product: product(info, &["database-info", "database-version-info"], "database-product"),
        schemacrawler_version: product(
            info,
            &["schemacrawler-info", "schemacrawler-version-info"],
            "schemacrawler-version",
        ),
    };

    (!crawl.is_empty()).then_some(crawl)
}

/// `"<name> <version>"` from a nested info object, or a flat string field
fn product(info: &Value, nested: &[&str], flat: &str) -> Option<String> {
    for key in nested {
        if let Some(obj) = info.get(*key) {
            let name = first_str(obj, &["product-name", "database-product-name"]);
            let version = first_str(obj, &["product-version", "database-product-version"]);
            match (name, version) {
                (Some(n), Some(v)) => return Some(format!("{} {}", n, v)),
                (Some(n), None) => return Some(n.to_string()),
                (None, Some(v)) => return Some(v.to_string()),
                (None, None) => {}
            }
        }
    }
    first_str(info, &[flat]).map(str::to_string)
}

/// Accepts RFC 3339 and the local `yyyy-MM-dd[T ]HH:mm:ss[.SSS]` forms
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
}
