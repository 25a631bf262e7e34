//! Search and browse over a catalog snapshot.
//!
//! Every operation is a linear scan; the catalog is small enough that no
//! secondary index is kept.

use netscope_core::{ApiCatalog, ApiDefinition, EndpointKind};
use std::collections::BTreeMap;

/// Case-insensitive substring search over description, path, category,
/// method and tags. An empty query matches everything.
pub fn search(catalog: &ApiCatalog, query: &str) -> Vec<ApiDefinition> {
    let query = query.to_lowercase();
    catalog
        .definitions()
        .filter(|definition| haystack(definition).contains(&query))
        .cloned()
        .collect()
}

fn haystack(definition: &ApiDefinition) -> String {
    format!(
        "{} {} {} {} {}",
        definition.description,
        definition.path,
        definition.category,
        definition.method,
        definition.tags.join(" ")
    )
    .to_lowercase()
}

/// Definitions of one service, by its wire tag. Unknown services yield an
/// empty map.
pub fn definitions_by_service(catalog: &ApiCatalog, service: &str) -> BTreeMap<String, ApiDefinition> {
    match service.parse::<EndpointKind>() {
        Ok(kind) => catalog.service(kind).clone(),
        Err(_) => BTreeMap::new(),
    }
}

/// Definitions whose category equals `category` exactly, across all services.
pub fn definitions_by_category(catalog: &ApiCatalog, category: &str) -> Vec<ApiDefinition> {
    catalog
        .definitions()
        .filter(|definition| definition.category == category)
        .cloned()
        .collect()
}
