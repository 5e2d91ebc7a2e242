use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use walkdir::WalkDir;

use crate::catalog::attributes::{apply_attributes, load_attributes, WeakAssociation};
use crate::catalog::filter::TableFilter;
use crate::catalog::loader::load_catalog;
use crate::catalog::types::Catalog;
use crate::render::dbml::{render_dbml_to_writer, DbmlStyle};
use crate::render::output_writer;

/// Optional steps applied to a catalog after loading
#[derive(Debug, Clone, Default)]
pub struct CatalogOptions {
    pub attributes: Option<PathBuf>,
    pub include_tables: Option<String>,
    pub exclude_tables: Option<String>,
}

#[derive(Debug)]
pub struct PreparedCatalog {
    pub catalog: Catalog,
    pub weak_associations: Vec<WeakAssociation>,
}

/// Load an export, merge the attributes file, then apply the table filter
pub fn prepare_catalog(path: &Path, options: &CatalogOptions) -> Result<PreparedCatalog> {
    let mut catalog = load_catalog(path)?;
    let mut weak_associations = Vec::new();

    if let Some(attributes_path) = &options.attributes {
        let attributes = load_attributes(attributes_path)?;
        let applied = apply_attributes(&mut catalog, &attributes);
        tracing::debug!(applied, path = %attributes_path.display(), "applied attributes");
        weak_associations = attributes.weak_associations;
    }

    let filter = TableFilter::new(options.include_tables.as_deref(), options.exclude_tables.as_deref())?;
    if !filter.is_empty() {
        let before = catalog.tables.len();
        filter.apply(&mut catalog);
        tracing::debug!(before, after = catalog.tables.len(), "filtered tables");
    }

    Ok(PreparedCatalog {
        catalog,
        weak_associations,
    })
}

/// Convert one export to a DBML file; returns the number of tables written
pub fn convert_to_dbml(input: &Path, output: &Path, style: DbmlStyle, options: &CatalogOptions) -> Result<usize> {
    let prepared = prepare_catalog(input, options)?;
    let mut writer = output_writer(Some(output))?;
    render_dbml_to_writer(&prepared.catalog, style, &mut writer)
        .and_then(|_| writer.flush())
        .with_context(|| format!("Failed to write {}", output.display()))?;
    Ok(prepared.catalog.tables.len())
}

/// `*.json` files directly inside `dir`, sorted by name
pub fn discover_exports(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        anyhow::bail!("Not a directory: {}", dir.display());
    }

    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("json"))
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Result of a folder conversion
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// (input, output, tables)
    pub converted: Vec<(PathBuf, PathBuf, usize)>,
    pub failed: Vec<(PathBuf, anyhow::Error)>,
}

impl BatchOutcome {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Convert every export in `input_dir` to `<output_dir>/<stem>.dbml`.
/// A failing file is recorded and the batch carries on.
pub fn convert_folder(
    input_dir: &Path,
    output_dir: &Path,
    style: DbmlStyle,
    options: &CatalogOptions,
) -> Result<BatchOutcome> {
    let files = discover_exports(input_dir)?;
    let mut outcome = BatchOutcome::default();
    if files.is_empty() {
        return Ok(outcome);
    }

    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create directory {}", output_dir.display()))?;

    for input in files {
        let stem = input.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
        let output = output_dir.join(format!("{}.dbml", stem));
        match convert_to_dbml(&input, &output, style, options) {
            Ok(tables) => {
                tracing::info!(input = %input.display(), output = %output.display(), tables, "converted");
                outcome.converted.push((input, output, tables));
            }
            Err(e) => {
                tracing::warn!(input = %input.display(), "conversion failed: {:#}", e);
                outcome.failed.push((input, e));
            }
        }
    }

    Ok(outcome)
}
