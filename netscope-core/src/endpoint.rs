//! Registered endpoints and their kinds.

use crate::{new_endpoint_id, EndpointId, Timestamp};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of a registered endpoint.
///
/// The serialized names are the wire tags used by persisted records and the
/// GUI shell, so they must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EndpointKind {
    /// A device's local JSON-RPC command API.
    #[serde(rename = "eapi")]
    CommandApi,
    /// Fleet-management REST controller.
    #[serde(rename = "cloudvision")]
    FleetRest,
    /// Plain resource REST API on a device.
    #[serde(rename = "eos_rest")]
    GenericRest,
    /// Streaming telemetry endpoint.
    #[serde(rename = "telemetry")]
    Telemetry,
}

impl EndpointKind {
    /// All kinds, in declaration order.
    pub const ALL: [EndpointKind; 4] = [
        EndpointKind::CommandApi,
        EndpointKind::FleetRest,
        EndpointKind::GenericRest,
        EndpointKind::Telemetry,
    ];

    /// Wire tag for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            EndpointKind::CommandApi => "eapi",
            EndpointKind::FleetRest => "cloudvision",
            EndpointKind::GenericRest => "eos_rest",
            EndpointKind::Telemetry => "telemetry",
        }
    }
}

impl fmt::Display for EndpointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EndpointKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EndpointKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown endpoint kind: {}", s))
    }
}

/// Last-known connection status of an endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointStatus {
    /// Never tested.
    #[default]
    Unset,
    Connected,
    Failed,
}

/// A registered remote target.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    pub id: EndpointId,
    pub name: String,
    /// Immutable after registration.
    #[serde(rename = "type")]
    pub kind: EndpointKind,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    pub created: Timestamp,
    #[serde(default)]
    pub tags: Vec<String>,
    pub tls_verify: bool,
    #[serde(default)]
    pub status: EndpointStatus,
}

impl Endpoint {
    /// Build a freshly registered endpoint with a new identifier.
    pub fn register(new: NewEndpoint) -> Self {
        Self {
            id: new_endpoint_id(),
            name: new.name,
            kind: new.kind,
            url: new.url,
            username: new.username,
            password: new.password,
            token: new.token,
            created: Utc::now(),
            tags: new.tags,
            tls_verify: new.tls_verify,
            status: EndpointStatus::Unset,
        }
    }

    /// Base URL without a trailing slash, ready for path concatenation.
    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }

    /// Username, treating an empty string as absent.
    pub fn username(&self) -> Option<&str> {
        non_empty(self.username.as_deref())
    }

    /// Password, treating an empty string as absent.
    pub fn password(&self) -> Option<&str> {
        non_empty(self.password.as_deref())
    }

    /// Bearer token, treating an empty string as absent.
    pub fn token(&self) -> Option<&str> {
        non_empty(self.token.as_deref())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("created", &self.created)
            .field("tags", &self.tags)
            .field("tls_verify", &self.tls_verify)
            .field("status", &self.status)
            .finish()
    }
}

/// Registration payload for a new endpoint.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEndpoint {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EndpointKind,
    pub url: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_tls_verify")]
    pub tls_verify: bool,
}

fn default_tls_verify() -> bool {
    true
}

impl NewEndpoint {
    /// Minimal registration payload; credentials are added with the builder methods.
    pub fn new(name: impl Into<String>, kind: EndpointKind, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            url: url.into(),
            username: None,
            password: None,
            token: None,
            tags: Vec::new(),
            tls_verify: true,
        }
    }

    pub fn with_basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_tls_verify(mut self, tls_verify: bool) -> Self {
        self.tls_verify = tls_verify;
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }
}

impl fmt::Debug for NewEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewEndpoint")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("tls_verify", &self.tls_verify)
            .finish()
    }
}
