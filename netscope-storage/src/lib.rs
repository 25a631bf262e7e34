//! NETSCOPE Storage - Record Store
//!
//! Durable key-value storage for the four NETSCOPE namespaces, backed by
//! LMDB through the heed crate. Every namespace is a named LMDB database
//! inside one environment, so writes to different namespaces share one
//! single-writer transaction log.

pub mod namespace;
pub mod record_store;

pub use namespace::Namespace;
pub use record_store::{RecordStore, StoreStats, CATALOG_KEY};

/// Result type for record store operations.
pub type StorageResult<T> = Result<T, netscope_core::StorageError>;
