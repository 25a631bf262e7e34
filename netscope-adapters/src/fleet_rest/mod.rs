//! Fleet-management REST adapter.
//!
//! Issues the caller's method and path as one HTTP call against the
//! endpoint's base URL with bearer-token authentication.

use crate::transport::{HttpTransport, WireResponse};
use crate::ProtocolAdapter;
use async_trait::async_trait;
use netscope_core::{AdapterError, ApiRequest, ConnectionTestResult, Endpoint, EndpointKind, ResponseBody};
use reqwest::Method;
use std::time::{Duration, Instant};

/// Low-cost listing call used by connection tests.
pub const DIAGNOSTIC_PATH: &str = "/api/resources/inventory/v1/Devices?limit=1";

/// Full device inventory listing.
pub const DEVICES_PATH: &str = "/api/resources/inventory/v1/Devices";

/// Event listing.
pub const EVENTS_PATH: &str = "/api/resources/event/v1/Events";

/// Resource models tried during discovery, each under `/api/resources/<model>`.
pub const KNOWN_MODELS: [&str; 21] = [
    "action.v1",
    "alert.v1",
    "bugexposure.v1",
    "changecontrol.v1",
    "configlet.v1",
    "configstatus.v1",
    "connectivitymonitor.v1",
    "dashboard.v1",
    "endpointlocation.v1",
    "event.v1",
    "identityprovider.v1",
    "imagestatus.v1",
    "inventory.v1",
    "lifecycle.v1",
    "redirector.v1",
    "serviceaccount.v1",
    "softwaremanagement.v1",
    "studio.v1",
    "studio_topology.v1",
    "tag.v2",
    "workspace.v1",
];

/// Adapter for the fleet-management REST controller.
#[derive(Debug)]
pub struct FleetRestAdapter {
    transport: HttpTransport,
}

impl FleetRestAdapter {
    pub fn new(request_timeout: Duration) -> Result<Self, AdapterError> {
        Ok(Self {
            transport: HttpTransport::new(request_timeout)?,
        })
    }

    /// Resource models from [`KNOWN_MODELS`] the controller knows about.
    ///
    /// A model answering 200 or 404 exists (404 means it holds no data).
    /// A missing token fails the whole call; other failures skip the model.
    pub async fn discover_models(&self, endpoint: &Endpoint) -> Result<Vec<String>, AdapterError> {
        token(endpoint)?;
        let mut available = Vec::new();
        for model in KNOWN_MODELS {
            let path = format!("/api/resources/{}", model);
            match self.send(endpoint, Method::GET, &path, None).await {
                Ok(wire) if wire.status == 200 || wire.status == 404 => available.push(model.to_string()),
                Ok(wire) => {
                    tracing::debug!(endpoint_id = %endpoint.id, model, status = wire.status, "Model unavailable");
                }
                Err(e) => {
                    tracing::debug!(endpoint_id = %endpoint.id, model, error = %e, "Model check failed");
                }
            }
        }
        Ok(available)
    }

    async fn send(
        &self,
        endpoint: &Endpoint,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<WireResponse, AdapterError> {
        let token = token(endpoint)?;
        let url = join_url(endpoint.base_url(), path);
        tracing::debug!(endpoint_id = %endpoint.id, method = %method, url = %url, "Sending REST request");

        let mut request = self
            .transport
            .client(endpoint.tls_verify)
            .request(method, &url)
            .bearer_auth(token);
        if let Some(body) = body {
            request = request.json(body);
        }

        let raw = self.transport.execute(request).await?;
        Ok(WireResponse {
            status: raw.status,
            headers: raw.headers,
            body: ResponseBody::from_bytes(&raw.bytes),
            elapsed_ms: raw.elapsed_ms,
            error: None,
        })
    }
}

fn token(endpoint: &Endpoint) -> Result<&str, AdapterError> {
    endpoint.token().ok_or_else(|| AdapterError::Configuration {
        kind: EndpointKind::FleetRest,
        field: "token".to_string(),
    })
}

/// Parse a caller-supplied method; empty means GET.
fn parse_method(method: &str) -> Result<Method, AdapterError> {
    let method = method.trim();
    if method.is_empty() {
        return Ok(Method::GET);
    }
    Method::from_bytes(method.to_ascii_uppercase().as_bytes()).map_err(|_| AdapterError::InvalidRequest {
        reason: format!("invalid HTTP method: {}", method),
    })
}

fn join_url(base: &str, path: &str) -> String {
    if path.is_empty() || path.starts_with('/') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    }
}

#[async_trait]
impl ProtocolAdapter for FleetRestAdapter {
    fn kind(&self) -> EndpointKind {
        EndpointKind::FleetRest
    }

    async fn call(&self, endpoint: &Endpoint, request: &ApiRequest) -> Result<WireResponse, AdapterError> {
        let method = parse_method(&request.method)?;
        self.send(endpoint, method, &request.path, request.body.as_ref())
            .await
    }

    async fn test_connection(&self, endpoint: &Endpoint) -> ConnectionTestResult {
        let start = Instant::now();
        match self.send(endpoint, Method::GET, DIAGNOSTIC_PATH, None).await {
            Ok(wire) if wire.status == 200 => ConnectionTestResult {
                success: true,
                message: "Connection successful".to_string(),
                status_code: Some(wire.status),
                elapsed_ms: wire.elapsed_ms,
                details: wire.body.as_json().cloned(),
            },
            Ok(wire) => ConnectionTestResult {
                success: false,
                message: format!("Connection failed: HTTP {}", wire.status),
                status_code: Some(wire.status),
                elapsed_ms: wire.elapsed_ms,
                details: None,
            },
            Err(error) => ConnectionTestResult {
                elapsed_ms: start.elapsed().as_millis() as u64,
                ..ConnectionTestResult::failed(error.to_string())
            },
        }
    }

    async fn discover(&self, endpoint: &Endpoint) -> Result<Vec<String>, AdapterError> {
        self.discover_models(endpoint).await
    }
}
