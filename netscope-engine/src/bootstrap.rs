//! Startup catalog loading.

use crate::config::CatalogConfig;
use netscope_catalog::{load_snapshot, save_snapshot, CatalogParser};
use netscope_core::{ApiCatalog, NetscopeResult};
use netscope_storage::RecordStore;

/// Load the snapshot at the configured path, or parse the source document
/// when no snapshot exists yet.
pub fn load_catalog(config: &CatalogConfig, store: &RecordStore) -> NetscopeResult<ApiCatalog> {
    if let Some(catalog) = load_snapshot(&config.snapshot_path)? {
        tracing::info!(
            path = %config.snapshot_path.display(),
            definitions = catalog.len(),
            "API catalog loaded"
        );
        return Ok(catalog);
    }

    tracing::info!(
        source = %config.source_path.display(),
        "API catalog snapshot not found, parsing source document"
    );
    parse_and_publish(config, store)
}

/// Parse the source document, then write the snapshot file and mirror it
/// into the store's catalog namespace.
pub fn parse_and_publish(config: &CatalogConfig, store: &RecordStore) -> NetscopeResult<ApiCatalog> {
    let catalog = CatalogParser::new(config.rules()).parse_file(&config.source_path)?;
    save_snapshot(&config.snapshot_path, &catalog)?;
    store.save_catalog(&catalog)?;
    tracing::info!(
        path = %config.snapshot_path.display(),
        definitions = catalog.len(),
        "API catalog saved"
    );
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use netscope_core::{CatalogError, NetscopeError};
    use netscope_test_utils::fixtures::{sample_catalog, SAMPLE_DOCUMENT};
    use std::path::Path;
    use tempfile::TempDir;

    fn catalog_config(root: &Path) -> CatalogConfig {
        CatalogConfig {
            snapshot_path: root.join("snapshots").join("api_catalog.json"),
            source_path: root.join("Enumerated_API.md"),
            ..CatalogConfig::default()
        }
    }

    #[test]
    fn test_missing_snapshot_parses_source() {
        let dir = TempDir::new().expect("TempDir creation should succeed");
        let store = RecordStore::open(dir.path().join("store"), 10).expect("store open should succeed");
        let config = catalog_config(dir.path());
        std::fs::write(&config.source_path, SAMPLE_DOCUMENT).expect("write should succeed");

        let catalog = load_catalog(&config, &store).expect("bootstrap should succeed");
        assert_eq!(catalog.len(), 6);
        assert!(config.snapshot_path.exists());

        let mirrored = store.catalog().expect("catalog mirrored into store");
        assert!(mirrored.same_definitions(&catalog));
    }

    #[test]
    fn test_existing_snapshot_wins_over_source() {
        let dir = TempDir::new().expect("TempDir creation should succeed");
        let store = RecordStore::open(dir.path().join("store"), 10).expect("store open should succeed");
        let config = catalog_config(dir.path());
        let snapshot = sample_catalog();
        save_snapshot(&config.snapshot_path, &snapshot).expect("save should succeed");
        std::fs::write(&config.source_path, SAMPLE_DOCUMENT).expect("write should succeed");

        let catalog = load_catalog(&config, &store).expect("bootstrap should succeed");
        assert_eq!(catalog, snapshot);
    }

    #[test]
    fn test_missing_source_is_surfaced() {
        let dir = TempDir::new().expect("TempDir creation should succeed");
        let store = RecordStore::open(dir.path().join("store"), 10).expect("store open should succeed");
        let config = catalog_config(dir.path());

        let err = load_catalog(&config, &store).expect_err("no snapshot and no source");
        assert!(matches!(err, NetscopeError::Catalog(CatalogError::Io { .. })));
        assert!(!config.snapshot_path.exists());
    }
}
