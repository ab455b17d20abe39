//! Build-directory and font file helpers.

use std::{
    fs::{create_dir_all, remove_dir_all},
    path::Path,
};

use anyhow::{Context, Result, bail};
use font_source::FontSource;
use log::{error, info};

/// Load a source font, naming the file on failure.
pub fn load_font(path: &Path) -> Result<FontSource> {
    FontSource::load(path).with_context(|| format!("Failed to load font: {}", path.display()))
}

/// Serialize and write a font, creating the parent directory if needed.
pub fn save_font(source: &FontSource, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    source.save(path).with_context(|| format!("Failed to write font: {}", path.display()))
}

/// Remove and recreate the build directory.
pub fn reset_build_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        remove_dir_all(dir).with_context(|| format!("Failed to remove {}", dir.display()))?;
        info!("Removed {}", dir.display());
    }
    create_dir_all(dir).with_context(|| format!("Failed to create directory: {}", dir.display()))
}

/// Check batch operation results and report failures.
pub fn check_results<T>(results: &[Result<T>], operation: &str) -> Result<()> {
    let failed: Vec<_> = results.iter().filter_map(|r| r.as_ref().err()).collect();
    for err in &failed {
        error!("{operation}: {err:#}");
    }
    if !failed.is_empty() {
        bail!("{operation} failed for {} variants", failed.len());
    }
    Ok(())
}
