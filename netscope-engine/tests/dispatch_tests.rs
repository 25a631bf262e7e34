//! Dispatch, connection tests and logging through the workbench.

use async_trait::async_trait;
use netscope_adapters::fleet_rest::{DEVICES_PATH, KNOWN_MODELS};
use netscope_adapters::{AdapterRegistry, ProtocolAdapter, WireResponse};
use netscope_core::{
    AdapterError, ApiRequest, ConnectionTestResult, DispatchError, Endpoint, EndpointKind,
    EndpointStatus, ErrorKind, HeaderMap, InventoryStatus, NetscopeError, NewEndpoint,
    ResponseBody,
};
use netscope_engine::{NetscopeConfig, Workbench};
use netscope_storage::RecordStore;
use netscope_test_utils::{refused_url, ScriptedResponse, ScriptedServer};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Adapter that counts invocations and answers after a fixed delay.
struct CountingAdapter {
    kind: EndpointKind,
    delay: Duration,
    calls: AtomicUsize,
}

impl CountingAdapter {
    fn new(kind: EndpointKind, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            kind,
            delay,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProtocolAdapter for CountingAdapter {
    fn kind(&self) -> EndpointKind {
        self.kind
    }

    async fn call(&self, _endpoint: &Endpoint, request: &ApiRequest) -> Result<WireResponse, AdapterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Ok(WireResponse {
            status: 200,
            headers: HeaderMap::new(),
            body: ResponseBody::Json(json!({ "path": request.path })),
            elapsed_ms: self.delay.as_millis() as u64,
            error: None,
        })
    }

    async fn test_connection(&self, _endpoint: &Endpoint) -> ConnectionTestResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        ConnectionTestResult {
            success: true,
            message: "Connection successful".to_string(),
            status_code: Some(200),
            elapsed_ms: self.delay.as_millis() as u64,
            details: None,
        }
    }

    async fn discover(&self, _endpoint: &Endpoint) -> Result<Vec<String>, AdapterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Ok(vec!["inventory.v1".to_string()])
    }
}

fn test_config() -> NetscopeConfig {
    let mut config = NetscopeConfig::default();
    config.lookup.path = None;
    config.dispatch.transport_timeout_ms = 5_000;
    config
}

fn workbench_with(registry: AdapterRegistry, config: &NetscopeConfig) -> (Workbench, TempDir) {
    let temp_dir = TempDir::new().expect("TempDir creation should succeed");
    let store = RecordStore::open(temp_dir.path().join("store"), 10).expect("store open should succeed");
    (Workbench::new(Arc::new(store), registry, config), temp_dir)
}

fn default_workbench() -> (Workbench, TempDir) {
    let config = test_config();
    let registry =
        AdapterRegistry::with_defaults(config.dispatch.transport_timeout()).expect("registry should build");
    workbench_with(registry, &config)
}

// ============================================================================
// END TO END
// ============================================================================

#[tokio::test]
async fn registered_command_api_endpoint_tests_successfully() {
    let server = ScriptedServer::always(ScriptedResponse::json(
        200,
        json!({"jsonrpc": "2.0", "id": "1", "result": [{"version": "4.30.1F"}]}),
    ));
    let (workbench, _dir) = default_workbench();
    let endpoint = workbench
        .register_endpoint(
            NewEndpoint::new("leaf1", EndpointKind::CommandApi, server.url()).with_basic_auth("u", "p"),
        )
        .expect("register should succeed");

    let result = workbench
        .test_connection(&endpoint.id)
        .await
        .expect("structured result");
    assert!(result.success, "unexpected failure: {}", result.message);

    let record = workbench.inventory_record(&endpoint.id).expect("inventory record");
    assert_eq!(record.test_count, 1);
    assert_eq!(record.success_count, 1);
    assert_eq!(record.status, InventoryStatus::Connected);
    assert!(record.last_tested.is_some());
    assert_eq!(
        workbench.endpoint(&endpoint.id).expect("endpoint").status,
        EndpointStatus::Connected
    );
}

#[tokio::test]
async fn unreachable_endpoint_test_is_structured_failure() {
    let (workbench, _dir) = default_workbench();
    let endpoint = workbench
        .register_endpoint(
            NewEndpoint::new("leaf1", EndpointKind::CommandApi, refused_url()).with_basic_auth("u", "p"),
        )
        .expect("register should succeed");

    let result = workbench
        .test_connection(&endpoint.id)
        .await
        .expect("structured result");
    assert!(!result.success);
    assert!(!result.message.is_empty());

    let record = workbench.inventory_record(&endpoint.id).expect("inventory record");
    assert_eq!(record.test_count, 1);
    assert_eq!(record.success_count, 0);
    assert_eq!(record.status, InventoryStatus::Failed);
    assert_eq!(
        workbench.endpoint(&endpoint.id).expect("endpoint").status,
        EndpointStatus::Failed
    );
}

#[tokio::test]
async fn test_connection_for_missing_endpoint_is_error() {
    let (workbench, _dir) = default_workbench();
    let err = workbench
        .test_connection("ep_missing")
        .await
        .expect_err("missing endpoint");
    assert!(err.is_not_found());
}

// ============================================================================
// DISPATCH
// ============================================================================

#[tokio::test]
async fn unsupported_kind_never_reaches_an_adapter() {
    let adapter = CountingAdapter::new(EndpointKind::CommandApi, Duration::ZERO);
    let mut registry = AdapterRegistry::new();
    registry.register(adapter.clone());
    let (workbench, _dir) = workbench_with(registry, &test_config());

    let endpoint = workbench
        .register_endpoint(NewEndpoint::new("gnmi", EndpointKind::Telemetry, "http://h"))
        .expect("register should succeed");
    let err = workbench
        .execute(ApiRequest::new(&endpoint.id, "GET", "/counters"))
        .await
        .expect_err("no adapter for telemetry");

    assert_eq!(
        err,
        NetscopeError::Dispatch(DispatchError::UnsupportedEndpointKind {
            kind: EndpointKind::Telemetry
        })
    );
    assert_eq!(adapter.calls(), 0);
    assert!(workbench.query_log().expect("query log").is_empty());
}

#[tokio::test]
async fn missing_endpoint_is_not_logged() {
    let (workbench, _dir) = default_workbench();
    let err = workbench
        .execute(ApiRequest::new("ep_missing", "GET", "/"))
        .await
        .expect_err("missing endpoint");
    assert!(matches!(
        err,
        NetscopeError::Dispatch(DispatchError::EndpointNotFound { .. })
    ));
    assert!(workbench.query_log().expect("query log").is_empty());
}

#[tokio::test]
async fn expired_deadline_is_a_logged_timeout() {
    let adapter = CountingAdapter::new(EndpointKind::FleetRest, Duration::from_millis(500));
    let mut registry = AdapterRegistry::new();
    registry.register(adapter.clone());
    let (workbench, _dir) = workbench_with(registry, &test_config());

    let endpoint = workbench
        .register_endpoint(NewEndpoint::new("cv", EndpointKind::FleetRest, "https://cv").with_token("t"))
        .expect("register should succeed");
    let response = workbench
        .execute(ApiRequest::new(&endpoint.id, "GET", "/api/slow").with_timeout_ms(50))
        .await
        .expect("timeout is a response, not an error");

    assert_eq!(response.status, 0);
    assert_eq!(response.error_kind, Some(ErrorKind::Timeout));
    assert!(!response.success());
    assert_eq!(adapter.calls(), 1);

    let log = workbench.query_log().expect("query log");
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].id, response.log_id);
    assert!(log[0].error.as_deref().is_some_and(|e| e.contains("50ms")));
}

#[tokio::test]
async fn non_positive_timeout_uses_configured_default() {
    let adapter = CountingAdapter::new(EndpointKind::FleetRest, Duration::from_millis(500));
    let mut registry = AdapterRegistry::new();
    registry.register(adapter.clone());
    let mut config = test_config();
    config.dispatch.default_timeout_ms = 40;
    let (workbench, _dir) = workbench_with(registry, &config);

    let endpoint = workbench
        .register_endpoint(NewEndpoint::new("cv", EndpointKind::FleetRest, "https://cv").with_token("t"))
        .expect("register should succeed");
    for timeout_ms in [0, -1] {
        let response = workbench
            .execute(ApiRequest::new(&endpoint.id, "GET", "/api/slow").with_timeout_ms(timeout_ms))
            .await
            .expect("dispatch should complete");
        assert_eq!(
            response.error.as_deref(),
            Some(AdapterError::Timeout { timeout_ms: 40 }.to_string().as_str())
        );
    }
}

#[tokio::test]
async fn non_success_status_is_logged_without_error() {
    let server = ScriptedServer::always(ScriptedResponse::json(404, json!({"message": "no such device"})));
    let (workbench, _dir) = default_workbench();
    let endpoint = workbench
        .register_endpoint(NewEndpoint::new("cv", EndpointKind::FleetRest, server.url()).with_token("t"))
        .expect("register should succeed");

    let response = workbench
        .execute(ApiRequest::new(&endpoint.id, "GET", "/api/resources/inventory/v1/Device/xyz"))
        .await
        .expect("dispatch should complete");
    assert_eq!(response.status, 404);
    assert!(response.error.is_none());
    assert!(!response.success());

    let log = workbench
        .query_log_for_endpoint(&endpoint.id)
        .expect("query log");
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].status, 404);
    assert_eq!(log[0].response, response.body);
}

#[tokio::test]
async fn missing_credentials_are_logged_as_configuration_error() {
    let (workbench, _dir) = default_workbench();
    let endpoint = workbench
        .register_endpoint(NewEndpoint::new("leaf", EndpointKind::CommandApi, "http://h"))
        .expect("register should succeed");

    let response = workbench
        .execute(ApiRequest::new(&endpoint.id, "POST", "/command-api").with_body(json!({"cmds": ["show version"]})))
        .await
        .expect("dispatch should complete");
    assert_eq!(response.error_kind, Some(ErrorKind::ConfigurationError));
    assert_eq!(workbench.query_log().expect("query log").len(), 1);
}

#[tokio::test]
async fn query_log_is_chronological_across_endpoints() {
    let adapter = CountingAdapter::new(EndpointKind::FleetRest, Duration::from_millis(2));
    let mut registry = AdapterRegistry::new();
    registry.register(adapter.clone());
    let (workbench, _dir) = workbench_with(registry, &test_config());

    let first = workbench
        .register_endpoint(NewEndpoint::new("cv-a", EndpointKind::FleetRest, "https://a").with_token("t"))
        .expect("register should succeed");
    let second = workbench
        .register_endpoint(NewEndpoint::new("cv-b", EndpointKind::FleetRest, "https://b").with_token("t"))
        .expect("register should succeed");

    for round in 0..3 {
        for endpoint in [&first, &second] {
            workbench
                .execute(ApiRequest::new(&endpoint.id, "GET", format!("/api/round/{}", round)))
                .await
                .expect("dispatch should complete");
        }
    }

    let log = workbench.query_log().expect("query log");
    assert_eq!(log.len(), 6);
    assert!(log.windows(2).all(|pair| pair[0].timestamp <= pair[1].timestamp));
    assert_eq!(
        workbench
            .query_log_for_endpoint(&second.id)
            .expect("query log")
            .len(),
        3
    );
    assert_eq!(adapter.calls(), 6);
}

#[tokio::test]
async fn slow_connection_test_times_out() {
    let adapter = CountingAdapter::new(EndpointKind::FleetRest, Duration::from_millis(500));
    let mut registry = AdapterRegistry::new();
    registry.register(adapter.clone());
    let mut config = test_config();
    config.dispatch.connection_test_timeout_ms = 50;
    let (workbench, _dir) = workbench_with(registry, &config);

    let endpoint = workbench
        .register_endpoint(NewEndpoint::new("cv", EndpointKind::FleetRest, "https://cv").with_token("t"))
        .expect("register should succeed");
    let result = workbench
        .test_connection(&endpoint.id)
        .await
        .expect("structured result");

    assert!(!result.success);
    assert!(result.message.contains("timed out"));
    let record = workbench.inventory_record(&endpoint.id).expect("inventory record");
    assert_eq!((record.test_count, record.success_count), (1, 0));
}

// ============================================================================
// PROBE
// ============================================================================

#[tokio::test]
async fn probe_tests_without_persisting() {
    let server = ScriptedServer::always(ScriptedResponse::json(200, json!({"data": []})));
    let (workbench, _dir) = default_workbench();

    let result = workbench
        .probe_connection(NewEndpoint::new("probe", EndpointKind::FleetRest, server.url()).with_token("t"))
        .await;
    assert!(result.success, "unexpected failure: {}", result.message);
    assert_eq!(server.requests().len(), 1);

    assert!(workbench.list_endpoints().expect("endpoints").is_empty());
    assert!(workbench.inventory().expect("inventory").is_empty());
    assert!(workbench.query_log().expect("query log").is_empty());
}

#[tokio::test]
async fn probe_without_token_never_calls_out() {
    let server = ScriptedServer::always(ScriptedResponse::json(200, json!({})));
    let (workbench, _dir) = default_workbench();

    let result = workbench
        .probe_connection(NewEndpoint::new("probe", EndpointKind::FleetRest, server.url()))
        .await;
    assert!(!result.success);
    assert_eq!(result.message, "Authentication required");
    assert!(server.requests().is_empty());
}

// ============================================================================
// DISCOVERY AND LISTINGS
// ============================================================================

#[tokio::test]
async fn discovery_reports_models_without_logging() {
    let server = ScriptedServer::always(ScriptedResponse::json(404, json!({"error": "no data"})));
    let (workbench, _dir) = default_workbench();
    let endpoint = workbench
        .register_endpoint(NewEndpoint::new("cv", EndpointKind::FleetRest, server.url()).with_token("t"))
        .expect("register should succeed");

    let models = workbench.discover(&endpoint.id).await.expect("discovery should succeed");

    assert_eq!(models.len(), KNOWN_MODELS.len());
    assert_eq!(server.requests().len(), KNOWN_MODELS.len());
    assert!(workbench.query_log().expect("query log").is_empty());
}

#[tokio::test]
async fn discovery_of_missing_endpoint_is_not_found() {
    let (workbench, _dir) = default_workbench();
    let err = workbench.discover("ep_missing").await.expect_err("endpoint is missing");
    assert!(err.is_not_found());
}

#[tokio::test]
async fn slow_discovery_times_out() {
    let adapter = CountingAdapter::new(EndpointKind::FleetRest, Duration::from_millis(500));
    let mut registry = AdapterRegistry::new();
    registry.register(adapter.clone());
    let mut config = test_config();
    config.dispatch.discovery_timeout_ms = 50;
    let (workbench, _dir) = workbench_with(registry, &config);
    let endpoint = workbench
        .register_endpoint(NewEndpoint::new("cv", EndpointKind::FleetRest, "https://cv").with_token("t"))
        .expect("register should succeed");

    let err = workbench.discover(&endpoint.id).await.expect_err("deadline exceeded");
    assert_eq!(
        err,
        NetscopeError::Adapter(AdapterError::Timeout { timeout_ms: 50 })
    );
    assert_eq!(adapter.calls(), 1);
}

#[tokio::test]
async fn device_listing_is_dispatched_and_logged() {
    let server = ScriptedServer::always(ScriptedResponse::json(200, json!({"result": [{"serialNumber": "SN1"}]})));
    let (workbench, _dir) = default_workbench();
    let endpoint = workbench
        .register_endpoint(NewEndpoint::new("cv", EndpointKind::FleetRest, server.url()).with_token("t"))
        .expect("register should succeed");

    let response = workbench.list_devices(&endpoint.id).await.expect("dispatch should complete");
    assert_eq!(response.status, 200);
    assert!(response.error.is_none());

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url, DEVICES_PATH);
    let log = workbench.query_log().expect("query log");
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].path, DEVICES_PATH);
    assert_eq!(log[0].method, "GET");
}

#[tokio::test]
async fn event_listing_requires_fleet_endpoint() {
    let server = ScriptedServer::always(ScriptedResponse::json(200, json!({"result": []})));
    let (workbench, _dir) = default_workbench();
    let endpoint = workbench
        .register_endpoint(
            NewEndpoint::new("leaf", EndpointKind::CommandApi, server.url()).with_basic_auth("admin", "admin"),
        )
        .expect("register should succeed");

    let err = workbench.list_events(&endpoint.id).await.expect_err("wrong kind");
    assert!(matches!(
        err,
        NetscopeError::Validation(netscope_core::ValidationError::InvalidValue { .. })
    ));
    assert!(server.requests().is_empty());
    assert!(workbench.query_log().expect("query log").is_empty());
}
