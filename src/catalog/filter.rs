use anyhow::{Context, Result};
use regex::Regex;

use super::types::Catalog;

/// Include/exclude patterns matched against fully qualified table names
#[derive(Debug, Default)]
pub struct TableFilter {
    include: Option<Regex>,
    exclude: Option<Regex>,
}

impl TableFilter {
    pub fn new(include: Option<&str>, exclude: Option<&str>) -> Result<Self> {
        Ok(Self {
            include: include.map(compile).transpose()?,
            exclude: exclude.map(compile).transpose()?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.include.is_none() && self.exclude.is_none()
    }

    pub fn matches(&self, full_name: &str) -> bool {
        let included = self.include.as_ref().map_or(true, |re| re.is_match(full_name));
        let excluded = self.exclude.as_ref().is_some_and(|re| re.is_match(full_name));
        included && !excluded
    }

    /// Drop tables that do not match; foreign keys to dropped tables are kept
    pub fn apply(&self, catalog: &mut Catalog) {
        if self.is_empty() {
            return;
        }
        let before = catalog.tables.len();
        catalog.tables.retain(|t| self.matches(&t.full_name));
        tracing::debug!(
            kept = catalog.tables.len(),
            dropped = before - catalog.tables.len(),
            "applied table filter"
        );
    }
}

/// Patterns must match the whole name
fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(&format!("^(?:{})$", pattern))
        .with_context(|| format!("Invalid table pattern: {}", pattern))
}
