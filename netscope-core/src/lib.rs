//! NETSCOPE Core - Entity Types
//!
//! Pure data structures shared by every other crate in the workspace.
//! No I/O lives here: storage, transport and parsing are in their own crates.

pub mod catalog;
pub mod endpoint;
pub mod error;
pub mod inventory;
pub mod query;

pub use catalog::{composite_key, ApiCatalog, ApiDefinition, Service};
pub use endpoint::{Endpoint, EndpointKind, EndpointStatus, NewEndpoint};
pub use error::{
    AdapterError, CatalogError, DispatchError, ErrorKind, NetscopeError, NetscopeResult,
    StorageError, ValidationError,
};
pub use inventory::{DeviceInventoryRecord, InventoryStatus};
pub use query::{
    ApiRequest, ApiResponse, ConnectionTestResult, HeaderMap, QueryLogRecord, ResponseBody,
};

use chrono::{DateTime, Utc};
use uuid::Uuid;

// ============================================================================
// IDENTITY TYPES
// ============================================================================

/// Opaque endpoint identifier, generated once at registration.
pub type EndpointId = String;

/// Identifier of one executed request in the query log.
pub type QueryId = String;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Generate a new endpoint identifier.
///
/// UUIDv7 keeps identifiers unique across restarts, so an identifier is never
/// handed out twice even after the original endpoint is deleted.
pub fn new_endpoint_id() -> EndpointId {
    format!("ep_{}", Uuid::now_v7().simple())
}

/// Generate a new query log record identifier.
pub fn new_query_id() -> QueryId {
    format!("req_{}", Uuid::now_v7().simple())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_ids_are_prefixed_and_unique() {
        let a = new_endpoint_id();
        let b = new_endpoint_id();
        assert!(a.starts_with("ep_"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_query_ids_are_prefixed() {
        assert!(new_query_id().starts_with("req_"));
    }
}
