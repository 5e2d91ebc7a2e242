use std::io::Write;

use anyhow::Result;

use crate::catalog::attributes::skeleton;
use crate::catalog::types::Catalog;

/// Write an attributes file skeleton with the current remarks of every table and column
pub fn render_annotations_to_writer<W: Write>(catalog: &Catalog, w: &mut W) -> Result<()> {
    serde_yaml::to_writer(&mut *w, &skeleton(catalog))?;
    Ok(())
}
