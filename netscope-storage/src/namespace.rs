//! Record store namespaces.

use std::fmt;

/// One independent keyspace of the record store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// Keyed by endpoint id.
    Endpoints,
    /// Keyed by `<nanos>_<record id>`, iterated chronologically.
    QueryLog,
    /// Single fixed key holding the latest catalog snapshot.
    Catalog,
    /// Keyed by endpoint id, mirroring [`Namespace::Endpoints`].
    Inventory,
}

impl Namespace {
    pub const ALL: [Namespace; 4] = [
        Namespace::Endpoints,
        Namespace::QueryLog,
        Namespace::Catalog,
        Namespace::Inventory,
    ];

    /// LMDB database name.
    pub fn name(&self) -> &'static str {
        match self {
            Namespace::Endpoints => "endpoints",
            Namespace::QueryLog => "query_log",
            Namespace::Catalog => "api_catalog",
            Namespace::Inventory => "device_inventory",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
