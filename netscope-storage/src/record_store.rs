//! LMDB-backed record store.
//!
//! Uses the heed crate (Rust bindings for LMDB). Each namespace is a named
//! database holding JSON-encoded values under UTF-8 keys.
//!
//! # Transactions
//!
//! - Reads run inside a read transaction and never block the writer
//! - Every write is its own write transaction; a failure before commit drops
//!   the transaction and leaves the previous value in place
//! - LMDB serializes writers, so no extra locking happens here

use std::path::{Path, PathBuf};

use heed::types::{Bytes, Str};
use heed::{Database, Env, EnvOpenOptions, RoTxn};
use netscope_core::{
    ApiCatalog, DeviceInventoryRecord, Endpoint, QueryLogRecord, StorageError,
};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::{Namespace, StorageResult};

/// Fixed key of the catalog snapshot inside [`Namespace::Catalog`].
pub const CATALOG_KEY: &str = "catalog";

fn transaction(e: heed::Error) -> StorageError {
    StorageError::Transaction {
        reason: e.to_string(),
    }
}

fn serialization(e: serde_json::Error) -> StorageError {
    StorageError::Serialization {
        reason: e.to_string(),
    }
}

/// Record counts per namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub endpoints: u64,
    pub query_log: u64,
    pub catalog: u64,
    pub inventory: u64,
}

/// Durable store for endpoints, inventory, catalog snapshot and query log.
///
/// Constructed once at process start with [`RecordStore::open`] and released
/// with [`RecordStore::close`].
pub struct RecordStore {
    env: Env,
    path: PathBuf,
}

impl RecordStore {
    /// Open (or create) the store at `path` and initialize every namespace.
    ///
    /// # Arguments
    ///
    /// * `path` - Directory holding the LMDB data and lock files
    /// * `max_size_mb` - Maximum size of the memory map in megabytes
    pub fn open<P: AsRef<Path>>(path: P, max_size_mb: usize) -> StorageResult<Self> {
        let path = path.as_ref();
        let created = !path.join("data.mdb").exists();

        std::fs::create_dir_all(path).map_err(|e| StorageError::Io {
            reason: format!("failed to create store directory {}: {}", path.display(), e),
        })?;

        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(max_size_mb.max(1) * 1024 * 1024)
                .max_dbs(Namespace::ALL.len() as u32)
                .open(path)
        }
        .map_err(transaction)?;

        let store = Self {
            env,
            path: path.to_path_buf(),
        };
        store.init_namespaces()?;

        if created {
            tracing::info!(path = %path.display(), "Created new record store");
        } else {
            tracing::debug!(path = %path.display(), "Opened record store");
        }
        Ok(store)
    }

    fn init_namespaces(&self) -> StorageResult<()> {
        let mut wtxn = self.env.write_txn().map_err(transaction)?;
        for namespace in Namespace::ALL {
            self.env
                .create_database::<Str, Bytes>(&mut wtxn, Some(namespace.name()))
                .map_err(transaction)?;
        }
        wtxn.commit().map_err(transaction)
    }

    /// Resolve the database for `namespace`, failing if it was never created.
    fn database(&self, txn: &RoTxn<'_>, namespace: Namespace) -> StorageResult<Database<Str, Bytes>> {
        self.env
            .open_database::<Str, Bytes>(txn, Some(namespace.name()))
            .map_err(transaction)?
            .ok_or_else(|| StorageError::NamespaceMissing {
                namespace: namespace.name().to_string(),
            })
    }

    /// Directory the store lives in.
    pub fn path(&self) -> &Path {
        &self.path
    }

    // ========================================================================
    // GENERIC OPERATIONS
    // ========================================================================

    /// Insert or replace one record.
    pub fn put<T: Serialize>(&self, namespace: Namespace, key: &str, value: &T) -> StorageResult<()> {
        let bytes = serde_json::to_vec(value).map_err(serialization)?;

        let mut wtxn = self.env.write_txn().map_err(transaction)?;
        let db = self.database(&wtxn, namespace)?;
        db.put(&mut wtxn, key, bytes.as_slice()).map_err(transaction)?;
        wtxn.commit().map_err(transaction)
    }

    /// Fetch one record, reporting absence as [`StorageError::RecordNotFound`].
    pub fn get<T: DeserializeOwned>(&self, namespace: Namespace, key: &str) -> StorageResult<T> {
        let rtxn = self.env.read_txn().map_err(transaction)?;
        let db = self.database(&rtxn, namespace)?;

        match db.get(&rtxn, key).map_err(transaction)? {
            Some(bytes) => serde_json::from_slice(bytes).map_err(serialization),
            None => Err(StorageError::RecordNotFound {
                namespace: namespace.name().to_string(),
                key: key.to_string(),
            }),
        }
    }

    /// Remove one record. Returns whether it existed.
    pub fn delete(&self, namespace: Namespace, key: &str) -> StorageResult<bool> {
        let mut wtxn = self.env.write_txn().map_err(transaction)?;
        let db = self.database(&wtxn, namespace)?;
        let deleted = db.delete(&mut wtxn, key).map_err(transaction)?;
        wtxn.commit().map_err(transaction)?;
        Ok(deleted)
    }

    /// Every record of a namespace, in key order.
    pub fn list<T: DeserializeOwned>(&self, namespace: Namespace) -> StorageResult<Vec<T>> {
        let rtxn = self.env.read_txn().map_err(transaction)?;
        let db = self.database(&rtxn, namespace)?;

        let mut records = Vec::new();
        for entry in db.iter(&rtxn).map_err(transaction)? {
            let (_, bytes) = entry.map_err(transaction)?;
            records.push(serde_json::from_slice(bytes).map_err(serialization)?);
        }
        Ok(records)
    }

    /// Record counts for every namespace.
    pub fn stats(&self) -> StorageResult<StoreStats> {
        let rtxn = self.env.read_txn().map_err(transaction)?;
        let count = |namespace| -> StorageResult<u64> {
            self.database(&rtxn, namespace)?
                .len(&rtxn)
                .map_err(transaction)
        };
        Ok(StoreStats {
            endpoints: count(Namespace::Endpoints)?,
            query_log: count(Namespace::QueryLog)?,
            catalog: count(Namespace::Catalog)?,
            inventory: count(Namespace::Inventory)?,
        })
    }

    // ========================================================================
    // ENDPOINTS
    // ========================================================================

    pub fn save_endpoint(&self, endpoint: &Endpoint) -> StorageResult<()> {
        self.put(Namespace::Endpoints, &endpoint.id, endpoint)
    }

    pub fn endpoint(&self, id: &str) -> StorageResult<Endpoint> {
        self.get(Namespace::Endpoints, id)
    }

    pub fn endpoints(&self) -> StorageResult<Vec<Endpoint>> {
        self.list(Namespace::Endpoints)
    }

    pub fn delete_endpoint(&self, id: &str) -> StorageResult<bool> {
        self.delete(Namespace::Endpoints, id)
    }

    // ========================================================================
    // QUERY LOG
    // ========================================================================

    /// Append a query record under its chronological key.
    ///
    /// Existing keys are never overwritten; the log is append-only.
    pub fn append_query_record(&self, record: &QueryLogRecord) -> StorageResult<String> {
        let key = record.log_key();
        let bytes = serde_json::to_vec(record).map_err(serialization)?;

        let mut wtxn = self.env.write_txn().map_err(transaction)?;
        let db = self.database(&wtxn, Namespace::QueryLog)?;
        if db.get(&wtxn, &key).map_err(transaction)?.is_some() {
            return Err(StorageError::Transaction {
                reason: format!("query log key already present: {}", key),
            });
        }
        db.put(&mut wtxn, &key, bytes.as_slice()).map_err(transaction)?;
        wtxn.commit().map_err(transaction)?;
        Ok(key)
    }

    /// The whole query log, oldest first.
    pub fn query_log(&self) -> StorageResult<Vec<QueryLogRecord>> {
        self.list(Namespace::QueryLog)
    }

    /// Query log records for one endpoint, oldest first.
    pub fn query_log_for_endpoint(&self, endpoint_id: &str) -> StorageResult<Vec<QueryLogRecord>> {
        Ok(self
            .query_log()?
            .into_iter()
            .filter(|record| record.endpoint_id == endpoint_id)
            .collect())
    }

    // ========================================================================
    // CATALOG SNAPSHOT
    // ========================================================================

    pub fn save_catalog(&self, catalog: &ApiCatalog) -> StorageResult<()> {
        self.put(Namespace::Catalog, CATALOG_KEY, catalog)
    }

    pub fn catalog(&self) -> StorageResult<ApiCatalog> {
        self.get(Namespace::Catalog, CATALOG_KEY)
    }

    // ========================================================================
    // DEVICE INVENTORY
    // ========================================================================

    pub fn save_inventory_record(&self, record: &DeviceInventoryRecord) -> StorageResult<()> {
        self.put(Namespace::Inventory, &record.id, record)
    }

    pub fn inventory_record(&self, id: &str) -> StorageResult<DeviceInventoryRecord> {
        self.get(Namespace::Inventory, id)
    }

    pub fn inventory(&self) -> StorageResult<Vec<DeviceInventoryRecord>> {
        self.list(Namespace::Inventory)
    }

    pub fn delete_inventory_record(&self, id: &str) -> StorageResult<bool> {
        self.delete(Namespace::Inventory, id)
    }

    /// Flush and release the environment. The store cannot be used afterwards.
    pub fn close(self) {
        let path = self.path;
        self.env.prepare_for_closing().wait();
        tracing::debug!(path = %path.display(), "Closed record store");
    }
}

impl std::fmt::Debug for RecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStore")
            .field("path", &self.path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netscope_core::{EndpointKind, NewEndpoint};
    use tempfile::TempDir;

    fn create_test_store() -> (RecordStore, TempDir) {
        let temp_dir = TempDir::new().expect("TempDir creation should succeed");
        let store = RecordStore::open(temp_dir.path(), 10).expect("store open should succeed");
        (store, temp_dir)
    }

    fn endpoint(name: &str) -> Endpoint {
        Endpoint::register(
            NewEndpoint::new(name, EndpointKind::CommandApi, "http://h").with_basic_auth("u", "p"),
        )
    }

    #[test]
    fn test_open_initializes_every_namespace() {
        let (store, _temp_dir) = create_test_store();
        let stats = store.stats().expect("stats should succeed");
        assert_eq!(stats, StoreStats::default());
    }

    #[test]
    fn test_get_missing_is_record_not_found() {
        let (store, _temp_dir) = create_test_store();
        let err = store.endpoint("ep_missing").expect_err("missing endpoint should fail");
        assert_eq!(
            err,
            StorageError::RecordNotFound {
                namespace: "endpoints".to_string(),
                key: "ep_missing".to_string(),
            }
        );
    }

    #[test]
    fn test_uninitialized_namespace_is_reported() {
        let temp_dir = TempDir::new().expect("TempDir creation should succeed");
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(10 * 1024 * 1024)
                .max_dbs(4)
                .open(temp_dir.path())
        }
        .expect("env open should succeed");
        let mut wtxn = env.write_txn().expect("write txn should succeed");
        env.create_database::<Str, Bytes>(&mut wtxn, Some("endpoints"))
            .expect("create should succeed");
        wtxn.commit().expect("commit should succeed");

        let store = RecordStore {
            env,
            path: temp_dir.path().to_path_buf(),
        };
        assert!(store.endpoints().expect("endpoints namespace exists").is_empty());
        let err = store.query_log().expect_err("query log namespace is missing");
        assert_eq!(
            err,
            StorageError::NamespaceMissing {
                namespace: "query_log".to_string()
            }
        );
    }

    #[test]
    fn test_put_overwrites_in_place() {
        let (store, _temp_dir) = create_test_store();
        let mut ep = endpoint("leaf1");
        store.save_endpoint(&ep).expect("save should succeed");
        ep.name = "leaf1-renamed".to_string();
        store.save_endpoint(&ep).expect("save should succeed");

        let all = store.endpoints().expect("list should succeed");
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "leaf1-renamed");
    }

    #[test]
    fn test_delete_reports_existence() {
        let (store, _temp_dir) = create_test_store();
        let ep = endpoint("leaf1");
        store.save_endpoint(&ep).expect("save should succeed");
        assert!(store.delete_endpoint(&ep.id).expect("delete should succeed"));
        assert!(!store.delete_endpoint(&ep.id).expect("second delete should succeed"));
        assert!(!store.delete_endpoint("ep_never").expect("delete of unknown should succeed"));
    }

    #[test]
    fn test_namespaces_are_independent() {
        let (store, _temp_dir) = create_test_store();
        let ep = endpoint("leaf1");
        store.save_endpoint(&ep).expect("save should succeed");

        let err = store.inventory_record(&ep.id).expect_err("inventory is separate");
        assert!(matches!(err, StorageError::RecordNotFound { .. }));
    }

    #[test]
    fn test_catalog_snapshot_round_trip() {
        let (store, _temp_dir) = create_test_store();
        assert!(matches!(
            store.catalog(),
            Err(StorageError::RecordNotFound { .. })
        ));
        let catalog = ApiCatalog::new();
        store.save_catalog(&catalog).expect("save should succeed");
        assert_eq!(store.catalog().expect("load should succeed"), catalog);
    }

    #[test]
    fn test_reopen_after_close_keeps_records() {
        let temp_dir = TempDir::new().expect("TempDir creation should succeed");
        let ep = endpoint("leaf1");
        {
            let store = RecordStore::open(temp_dir.path(), 10).expect("open should succeed");
            store.save_endpoint(&ep).expect("save should succeed");
            store.close();
        }
        let store = RecordStore::open(temp_dir.path(), 10).expect("reopen should succeed");
        assert_eq!(store.endpoint(&ep.id).expect("get should succeed"), ep);
        store.close();
    }
}
