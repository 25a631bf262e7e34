//! NETSCOPE Catalog - API Documentation Indexer
//!
//! Turns a loosely structured, line-oriented documentation dump into a
//! searchable [`ApiCatalog`](netscope_core::ApiCatalog):
//! - [`classify`] decides per line: skip, category header, or endpoint candidate
//! - [`parser`] extracts definitions and routes them to a service
//! - [`search`] offers free-text search and browse by service or category
//! - [`snapshot`] persists the catalog as a JSON document

pub mod classify;
pub mod parser;
pub mod search;
pub mod snapshot;

pub use classify::{classify_line, CatalogRules, LineClass};
pub use parser::{service_for_path, CatalogParser};
pub use search::{definitions_by_category, definitions_by_service, search};
pub use snapshot::{load_snapshot, save_snapshot};
