//! Device inventory: a best-effort mirror of registered endpoints.

use crate::{Endpoint, EndpointId, EndpointKind, Timestamp};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Connection state tracked by the inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InventoryStatus {
    Connected,
    Disconnected,
    Testing,
    Failed,
}

/// Denormalized copy of an endpoint plus connection statistics.
///
/// Not kept in sync with the source endpoint: edits and deletes of the
/// endpoint do not cascade here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInventoryRecord {
    pub id: EndpointId,
    pub name: String,
    pub device_type: String,
    pub url: String,
    #[serde(default)]
    pub username: String,
    #[serde(rename = "type")]
    pub kind: EndpointKind,
    pub status: InventoryStatus,
    pub added_at: Timestamp,
    #[serde(default)]
    pub last_tested: Option<Timestamp>,
    pub test_count: u32,
    pub success_count: u32,
    #[serde(default)]
    pub notes: String,
}

impl DeviceInventoryRecord {
    /// Mirror a freshly registered endpoint.
    pub fn mirror(endpoint: &Endpoint) -> Self {
        Self {
            id: endpoint.id.clone(),
            name: endpoint.name.clone(),
            device_type: endpoint.kind.as_str().to_string(),
            url: endpoint.url.clone(),
            username: endpoint.username.clone().unwrap_or_default(),
            kind: endpoint.kind,
            status: InventoryStatus::Disconnected,
            added_at: Utc::now(),
            last_tested: None,
            test_count: 0,
            success_count: 0,
            notes: format!("Added via endpoint registration - {}", endpoint.kind),
        }
    }

    /// Fold one connection test outcome into the statistics.
    pub fn record_test(&mut self, success: bool, at: Timestamp) {
        self.test_count = self.test_count.saturating_add(1);
        if success {
            self.success_count = self.success_count.saturating_add(1);
            self.status = InventoryStatus::Connected;
        } else {
            self.status = InventoryStatus::Failed;
        }
        self.last_tested = Some(at);
    }
}
