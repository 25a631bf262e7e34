//! Lookup errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("Lookup database unavailable at {path}: {reason}")]
    Unavailable { path: String, reason: String },

    #[error("Lookup database has no tables")]
    NoTables,

    #[error("Lookup query failed: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Lookup connection lock poisoned")]
    Poisoned,
}
