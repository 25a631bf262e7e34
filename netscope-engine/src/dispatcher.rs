//! Request dispatcher.
//!
//! One dispatch is `Resolving -> Dispatching -> Completed | Failed`:
//! - Resolving loads the endpoint; a missing one ends the dispatch with
//!   [`DispatchError::EndpointNotFound`] and nothing is logged
//! - Dispatching picks the adapter for the endpoint's kind
//!   ([`DispatchError::UnsupportedEndpointKind`] otherwise) and runs the call
//!   under a deadline
//! - Completed and Failed both yield an [`ApiResponse`] and append one query
//!   log record; a failed log write is reported and swallowed

use crate::config::DispatchConfig;
use chrono::Utc;
use netscope_adapters::{AdapterRegistry, WireResponse};
use netscope_core::{
    new_query_id, AdapterError, ApiRequest, ApiResponse, ConnectionTestResult, DispatchError,
    Endpoint, EndpointKind, EndpointStatus, HeaderMap, NetscopeResult, NewEndpoint,
    QueryLogRecord, ResponseBody, StorageError, Timestamp,
};
use netscope_storage::RecordStore;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub struct Dispatcher {
    store: Arc<RecordStore>,
    registry: AdapterRegistry,
    config: DispatchConfig,
}

impl Dispatcher {
    pub fn new(store: Arc<RecordStore>, registry: AdapterRegistry, config: DispatchConfig) -> Self {
        Self {
            store,
            registry,
            config,
        }
    }

    pub fn registry(&self) -> &AdapterRegistry {
        &self.registry
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Load an endpoint, mapping an absent record to `EndpointNotFound`.
    pub fn resolve(&self, endpoint_id: &str) -> NetscopeResult<Endpoint> {
        match self.store.endpoint(endpoint_id) {
            Ok(endpoint) => Ok(endpoint),
            Err(StorageError::RecordNotFound { .. }) => Err(DispatchError::EndpointNotFound {
                id: endpoint_id.to_string(),
            }
            .into()),
            Err(e) => Err(e.into()),
        }
    }

    /// Execute one request and log its outcome.
    ///
    /// # Returns
    /// * `Ok(ApiResponse)` - The adapter was invoked; transport, timeout and
    ///   remote failures are carried in the response
    /// * `Err(NetscopeError)` - Resolution failed; no adapter call, no log record
    pub async fn execute(&self, request: ApiRequest) -> NetscopeResult<ApiResponse> {
        let endpoint = self.resolve(&request.endpoint_id)?;
        let adapter = self
            .registry
            .get(endpoint.kind)
            .ok_or(DispatchError::UnsupportedEndpointKind { kind: endpoint.kind })?;

        let deadline = self.config.request_timeout(request.timeout_ms);
        tracing::info!(
            endpoint_id = %endpoint.id,
            kind = %endpoint.kind,
            method = %request.method,
            path = %request.path,
            timeout_ms = deadline.as_millis() as u64,
            "Dispatching request"
        );

        let executed_at = Utc::now();
        let started = Instant::now();
        let outcome = match tokio::time::timeout(deadline, adapter.call(&endpoint, &request)).await {
            Ok(result) => result,
            Err(_) => Err(AdapterError::Timeout {
                timeout_ms: deadline.as_millis() as u64,
            }),
        };
        let response = normalize(&endpoint, outcome, elapsed_ms(started));

        tracing::info!(
            endpoint_id = %endpoint.id,
            log_id = %response.log_id,
            status = response.status,
            elapsed_ms = response.elapsed_ms,
            error = response.error.as_deref().unwrap_or(""),
            "Request finished"
        );

        self.log_query(&request, &response, executed_at);
        Ok(response)
    }

    /// Run the kind's diagnostic call and record the outcome on the endpoint
    /// and its inventory record.
    ///
    /// Only a missing endpoint is an error; every other outcome, including an
    /// unsupported kind, is a structured result.
    pub async fn test_connection(&self, endpoint_id: &str) -> NetscopeResult<ConnectionTestResult> {
        let mut endpoint = self.resolve(endpoint_id)?;
        let Some(adapter) = self.registry.get(endpoint.kind) else {
            return Ok(unsupported(endpoint.kind));
        };

        let deadline = self.config.connection_test_timeout();
        let started = Instant::now();
        let result = match tokio::time::timeout(deadline, adapter.test_connection(&endpoint)).await {
            Ok(result) => result,
            Err(_) => timed_out(deadline, started),
        };

        tracing::info!(
            endpoint_id = %endpoint.id,
            success = result.success,
            elapsed_ms = result.elapsed_ms,
            message = %result.message,
            "Connection test finished"
        );

        endpoint.status = if result.success {
            EndpointStatus::Connected
        } else {
            EndpointStatus::Failed
        };
        if let Err(e) = self.store.save_endpoint(&endpoint) {
            tracing::warn!(endpoint_id = %endpoint.id, error = %e, "Failed to save endpoint status");
        }
        self.record_inventory_test(&endpoint.id, result.success, Utc::now());

        Ok(result)
    }

    /// Test an unsaved target. Never fails and writes nothing.
    ///
    /// Required credentials are checked per kind before any network call:
    /// username and password for the command API and generic REST, a token
    /// for fleet REST.
    pub async fn probe_connection(&self, target: NewEndpoint) -> ConnectionTestResult {
        let endpoint = Endpoint::register(target);
        if let Some(rejection) = probe_precheck(&endpoint) {
            return rejection;
        }
        let Some(adapter) = self.registry.get(endpoint.kind) else {
            return unsupported(endpoint.kind);
        };

        let deadline = self.config.connection_test_timeout();
        let started = Instant::now();
        let result = match tokio::time::timeout(deadline, adapter.test_connection(&endpoint)).await {
            Ok(result) => result,
            Err(_) => timed_out(deadline, started),
        };
        tracing::info!(
            kind = %endpoint.kind,
            url = %endpoint.url,
            success = result.success,
            elapsed_ms = result.elapsed_ms,
            "Connection probe finished"
        );
        result
    }

    /// Ask the endpoint's adapter which commands or resource models it
    /// answers for.
    ///
    /// Nothing is logged or persisted. The whole run is bounded by the
    /// discovery deadline.
    pub async fn discover(&self, endpoint_id: &str) -> NetscopeResult<Vec<String>> {
        let endpoint = self.resolve(endpoint_id)?;
        let adapter = self
            .registry
            .get(endpoint.kind)
            .ok_or(DispatchError::UnsupportedEndpointKind { kind: endpoint.kind })?;

        let deadline = self.config.discovery_timeout();
        let found = match tokio::time::timeout(deadline, adapter.discover(&endpoint)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(AdapterError::Timeout {
                    timeout_ms: deadline.as_millis() as u64,
                }
                .into())
            }
        };
        tracing::info!(
            endpoint_id = %endpoint.id,
            kind = %endpoint.kind,
            found = found.len(),
            "Discovery finished"
        );
        Ok(found)
    }

    fn record_inventory_test(&self, endpoint_id: &str, success: bool, at: Timestamp) {
        let mut record = match self.store.inventory_record(endpoint_id) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(endpoint_id, error = %e, "No inventory record to update");
                return;
            }
        };
        record.record_test(success, at);
        if let Err(e) = self.store.save_inventory_record(&record) {
            tracing::warn!(endpoint_id, error = %e, "Failed to save inventory record");
        }
    }

    fn log_query(&self, request: &ApiRequest, response: &ApiResponse, executed_at: Timestamp) {
        let record = QueryLogRecord {
            id: response.log_id.clone(),
            endpoint_id: request.endpoint_id.clone(),
            method: request.method.clone(),
            path: request.path.clone(),
            body: request.body.clone(),
            status: response.status,
            response: response.body.clone(),
            timestamp: executed_at,
            elapsed_ms: response.elapsed_ms,
            error: response.error.clone(),
        };
        if let Err(e) = self.store.append_query_record(&record) {
            tracing::warn!(log_id = %record.id, error = %e, "Failed to save query record");
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("store", &self.store)
            .field("kinds", &self.registry.kinds())
            .field("config", &self.config)
            .finish()
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

fn unsupported(kind: EndpointKind) -> ConnectionTestResult {
    ConnectionTestResult::failed(format!(
        "Connection testing is not supported for {} endpoints",
        kind
    ))
}

fn timed_out(deadline: Duration, started: Instant) -> ConnectionTestResult {
    let message = AdapterError::Timeout {
        timeout_ms: deadline.as_millis() as u64,
    }
    .to_string();
    ConnectionTestResult {
        elapsed_ms: elapsed_ms(started),
        ..ConnectionTestResult::failed(message)
    }
}

fn authentication_required(details: &str) -> ConnectionTestResult {
    ConnectionTestResult::failed("Authentication required").with_details(Value::from(details))
}

/// Credential and URL checks a probe must pass before touching the network.
fn probe_precheck(endpoint: &Endpoint) -> Option<ConnectionTestResult> {
    let has_basic_auth = endpoint.username().is_some() && endpoint.password().is_some();
    match endpoint.kind {
        EndpointKind::CommandApi if !has_basic_auth => Some(authentication_required(
            "Username and password are required for the command API",
        )),
        EndpointKind::FleetRest if endpoint.token().is_none() => Some(authentication_required(
            "API token is required for the fleet REST API",
        )),
        EndpointKind::GenericRest => {
            if !has_basic_auth {
                Some(authentication_required(
                    "Username and password are required for the generic REST API",
                ))
            } else if !is_http_url(&endpoint.url) {
                Some(
                    ConnectionTestResult::failed("Invalid URL format")
                        .with_details(Value::from("URL must start with http:// or https://")),
                )
            } else {
                Some(unsupported(EndpointKind::GenericRest))
            }
        }
        _ => None,
    }
}

pub(crate) fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Fold an adapter outcome into the caller-facing response.
fn normalize(
    endpoint: &Endpoint,
    outcome: Result<WireResponse, AdapterError>,
    fallback_elapsed_ms: u64,
) -> ApiResponse {
    let (status, headers, body, elapsed_ms, error) = match outcome {
        Ok(wire) => (wire.status, wire.headers, wire.body, wire.elapsed_ms, wire.error),
        Err(e) => (0, HeaderMap::new(), ResponseBody::Empty, fallback_elapsed_ms, Some(e)),
    };
    ApiResponse {
        status,
        headers,
        body,
        elapsed_ms,
        endpoint_id: endpoint.id.clone(),
        log_id: new_query_id(),
        error_kind: error.as_ref().map(AdapterError::kind),
        error: error.map(|e| e.to_string()),
    }
}
