//! Error types for the engine.

use crate::config::ConfigError;
use netscope_core::{NetscopeError, StorageError};
use netscope_lookup::LookupError;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Netscope(#[from] NetscopeError),
    #[error(transparent)]
    Lookup(#[from] LookupError),
    #[error("Telemetry error: {reason}")]
    Telemetry { reason: String },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<StorageError> for EngineError {
    fn from(e: StorageError) -> Self {
        EngineError::Netscope(e.into())
    }
}
