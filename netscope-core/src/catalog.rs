//! API definitions and the partitioned catalog snapshot.

use crate::{EndpointKind, Timestamp};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Service owning an API definition. Services share the endpoint kind tags.
pub type Service = EndpointKind;

/// One documented API operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiDefinition {
    pub id: String,
    pub service: Service,
    /// Upper-cased HTTP method.
    pub method: String,
    pub path: String,
    pub description: String,
    /// Placeholder names extracted from `{...}` path segments.
    #[serde(default)]
    pub params: Vec<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl ApiDefinition {
    /// Composite key under which this definition is indexed.
    pub fn composite_key(&self) -> String {
        composite_key(self.service, &self.category, &self.method)
    }
}

/// Build the `service_category_method` key used to index the catalog.
pub fn composite_key(service: Service, category: &str, method: &str) -> String {
    format!("{}_{}_{}", service.as_str(), category, method)
}

/// Snapshot of every parsed definition, partitioned by service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCatalog {
    #[serde(rename = "eapi", default)]
    pub command_api: BTreeMap<String, ApiDefinition>,
    #[serde(rename = "cloudvision", default)]
    pub fleet_rest: BTreeMap<String, ApiDefinition>,
    #[serde(rename = "eos_rest", default)]
    pub generic_rest: BTreeMap<String, ApiDefinition>,
    #[serde(default)]
    pub telemetry: BTreeMap<String, ApiDefinition>,
    pub last_updated: Timestamp,
}

impl Default for ApiCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl ApiCatalog {
    /// Create an empty catalog stamped with the current time.
    pub fn new() -> Self {
        Self {
            command_api: BTreeMap::new(),
            fleet_rest: BTreeMap::new(),
            generic_rest: BTreeMap::new(),
            telemetry: BTreeMap::new(),
            last_updated: Utc::now(),
        }
    }

    /// Mapping holding definitions for `service`.
    pub fn service(&self, service: Service) -> &BTreeMap<String, ApiDefinition> {
        match service {
            EndpointKind::CommandApi => &self.command_api,
            EndpointKind::FleetRest => &self.fleet_rest,
            EndpointKind::GenericRest => &self.generic_rest,
            EndpointKind::Telemetry => &self.telemetry,
        }
    }

    fn service_mut(&mut self, service: Service) -> &mut BTreeMap<String, ApiDefinition> {
        match service {
            EndpointKind::CommandApi => &mut self.command_api,
            EndpointKind::FleetRest => &mut self.fleet_rest,
            EndpointKind::GenericRest => &mut self.generic_rest,
            EndpointKind::Telemetry => &mut self.telemetry,
        }
    }

    /// Index a definition under its composite key.
    ///
    /// Returns the definition it replaced, if any. Last insert wins.
    pub fn insert(&mut self, definition: ApiDefinition) -> Option<ApiDefinition> {
        let key = definition.composite_key();
        self.service_mut(definition.service).insert(key, definition)
    }

    /// Iterate every definition, service by service in declaration order.
    pub fn definitions(&self) -> impl Iterator<Item = &ApiDefinition> {
        EndpointKind::ALL
            .into_iter()
            .flat_map(move |service| self.service(service).values())
    }

    pub fn len(&self) -> usize {
        EndpointKind::ALL
            .into_iter()
            .map(|service| self.service(service).len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Equality of content, ignoring `last_updated`.
    pub fn same_definitions(&self, other: &ApiCatalog) -> bool {
        self.command_api == other.command_api
            && self.fleet_rest == other.fleet_rest
            && self.generic_rest == other.generic_rest
            && self.telemetry == other.telemetry
    }
}
