//! JSON snapshot file of a parsed catalog.

use netscope_core::{ApiCatalog, CatalogError};
use std::path::Path;

fn io_error(path: &Path, e: std::io::Error) -> CatalogError {
    CatalogError::Io {
        path: path.display().to_string(),
        reason: e.to_string(),
    }
}

/// Load a snapshot. A missing file is `Ok(None)`, not an error.
pub fn load_snapshot(path: &Path) -> Result<Option<ApiCatalog>, CatalogError> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(path).map_err(|e| io_error(path, e))?;
    let catalog = serde_json::from_str::<ApiCatalog>(&contents).map_err(|e| CatalogError::Snapshot {
        reason: format!("{}: {}", path.display(), e),
    })?;
    tracing::debug!(path = %path.display(), definitions = catalog.len(), "Loaded catalog snapshot");
    Ok(Some(catalog))
}

/// Write a snapshot as pretty-printed JSON, creating parent directories.
pub fn save_snapshot(path: &Path, catalog: &ApiCatalog) -> Result<(), CatalogError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
    }
    let contents = serde_json::to_string_pretty(catalog).map_err(|e| CatalogError::Snapshot {
        reason: e.to_string(),
    })?;
    std::fs::write(path, contents).map_err(|e| io_error(path, e))?;
    tracing::debug!(path = %path.display(), definitions = catalog.len(), "Saved catalog snapshot");
    Ok(())
}
