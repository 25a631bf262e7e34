//! Error types for NETSCOPE operations

use crate::EndpointKind;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Record store errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Namespace not initialized: {namespace}")]
    NamespaceMissing { namespace: String },

    #[error("Record not found in {namespace}: {key}")]
    RecordNotFound { namespace: String, key: String },

    #[error("Transaction failed: {reason}")]
    Transaction { reason: String },

    #[error("Serialization failed: {reason}")]
    Serialization { reason: String },

    #[error("I/O error: {reason}")]
    Io { reason: String },
}

/// Coarse classification of a request failure, recorded on responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Transport,
    Timeout,
    RemoteError,
    DecodeError,
    ConfigurationError,
    InvalidRequest,
}

/// Protocol adapter errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AdapterError {
    #[error("Transport failure: {reason}")]
    Transport { reason: String },

    #[error("Request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Remote error: {message}")]
    RemoteError { message: String },

    #[error("Could not decode response: {reason}")]
    Decode { reason: String },

    #[error("Missing {field} required for {kind} endpoints")]
    Configuration { kind: EndpointKind, field: String },

    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },
}

impl AdapterError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AdapterError::Transport { .. } => ErrorKind::Transport,
            AdapterError::Timeout { .. } => ErrorKind::Timeout,
            AdapterError::RemoteError { .. } => ErrorKind::RemoteError,
            AdapterError::Decode { .. } => ErrorKind::DecodeError,
            AdapterError::Configuration { .. } => ErrorKind::ConfigurationError,
            AdapterError::InvalidRequest { .. } => ErrorKind::InvalidRequest,
        }
    }
}

/// Request dispatch errors raised before any adapter call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Endpoint not found: {id}")]
    EndpointNotFound { id: String },

    #[error("Unsupported endpoint kind: {kind}")]
    UnsupportedEndpointKind { kind: EndpointKind },
}

/// Catalog parsing and snapshot errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Failed to read {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("Catalog snapshot error: {reason}")]
    Snapshot { reason: String },
}

/// Input validation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Endpoint kind cannot change after registration: {id}")]
    KindImmutable { id: String },

    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Master error type for all NETSCOPE errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NetscopeError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Adapter error: {0}")]
    Adapter(#[from] AdapterError),

    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl NetscopeError {
    /// True for the not-found conditions of any layer.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            NetscopeError::Storage(StorageError::RecordNotFound { .. })
                | NetscopeError::Dispatch(DispatchError::EndpointNotFound { .. })
        )
    }
}

/// Result type alias for NETSCOPE operations.
pub type NetscopeResult<T> = Result<T, NetscopeError>;

// =============================================================================
// TESTS
// =============================================================================
