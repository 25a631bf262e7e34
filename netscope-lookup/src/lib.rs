//! NETSCOPE Lookup - Secondary API Definition Source
//!
//! Read-only access to an independently maintained SQLite database of API
//! definitions. The schema is not under our control: the definition table is
//! picked by name and columns are mapped to fields through a declarative
//! table, ignoring anything unmapped.

pub mod error;
pub mod source;

pub use error::LookupError;
pub use source::{LookupDefinition, LookupSource, PREFERRED_TABLES, ROW_LIMIT};
