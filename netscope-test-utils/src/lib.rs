//! NETSCOPE Test Utilities
//!
//! Centralized test infrastructure for the NETSCOPE workspace:
//! - Proptest generators for entity types
//! - A scripted HTTP server standing in for remote endpoints
//! - Test fixtures for common scenarios

pub use netscope_core::{
    ApiCatalog, ApiDefinition, Endpoint, EndpointKind, NewEndpoint, QueryLogRecord,
    ResponseBody, Service, Timestamp,
};

use chrono::Utc;
use std::io::Read;
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use tiny_http::{Header, Response, Server};

// ============================================================================
// SCRIPTED HTTP SERVER
// ============================================================================

/// Canned reply served by [`ScriptedServer`].
#[derive(Debug, Clone)]
pub struct ScriptedResponse {
    pub status: u16,
    pub body: String,
    pub content_type: String,
    /// Sleep before replying, for deadline tests.
    pub delay: Option<Duration>,
}

impl ScriptedResponse {
    pub fn json(status: u16, body: serde_json::Value) -> Self {
        Self {
            status,
            body: body.to_string(),
            content_type: "application/json".to_string(),
            delay: None,
        }
    }

    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            content_type: "text/plain".to_string(),
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// A request as received by [`ScriptedServer`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    /// Path plus query string.
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RecordedRequest {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(field, _)| field.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn json(&self) -> Option<serde_json::Value> {
        serde_json::from_str(&self.body).ok()
    }
}

/// Local HTTP server on `127.0.0.1:0` that replies with canned responses.
///
/// Responses are served in order; once exhausted the last one repeats.
/// Every request is recorded and can be inspected with [`ScriptedServer::requests`].
pub struct ScriptedServer {
    url: String,
    server: Arc<Server>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl ScriptedServer {
    pub fn start(responses: Vec<ScriptedResponse>) -> Self {
        let server = Arc::new(Server::http("127.0.0.1:0").expect("bind scripted server"));
        let addr = server
            .server_addr()
            .to_ip()
            .expect("scripted server listens on an IP address");
        let requests = Arc::new(Mutex::new(Vec::new()));

        let handle = {
            let server = Arc::clone(&server);
            let requests = Arc::clone(&requests);
            thread::spawn(move || {
                let mut served = 0usize;
                for mut request in server.incoming_requests() {
                    let mut body = String::new();
                    let _ = request.as_reader().read_to_string(&mut body);
                    let recorded = RecordedRequest {
                        method: request.method().as_str().to_string(),
                        url: request.url().to_string(),
                        headers: request
                            .headers()
                            .iter()
                            .map(|h| (h.field.to_string(), h.value.to_string()))
                            .collect(),
                        body,
                    };
                    if let Ok(mut log) = requests.lock() {
                        log.push(recorded);
                    }

                    let scripted = responses
                        .get(served)
                        .or_else(|| responses.last())
                        .cloned()
                        .unwrap_or_else(|| ScriptedResponse::text(500, "no scripted response"));
                    served += 1;

                    if let Some(delay) = scripted.delay {
                        thread::sleep(delay);
                    }
                    let mut response =
                        Response::from_string(scripted.body).with_status_code(scripted.status);
                    if let Ok(header) =
                        Header::from_bytes(&b"Content-Type"[..], scripted.content_type.as_bytes())
                    {
                        response = response.with_header(header);
                    }
                    let _ = request.respond(response);
                }
            })
        };

        Self {
            url: format!("http://{}", addr),
            server,
            requests,
            handle: Some(handle),
        }
    }

    /// Serve one response forever.
    pub fn always(response: ScriptedResponse) -> Self {
        Self::start(vec![response])
    }

    /// Base URL, without trailing slash.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Snapshot of the requests received so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }
}

impl Drop for ScriptedServer {
    fn drop(&mut self) {
        self.server.unblock();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// URL of a local port with nothing listening on it.
pub fn refused_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for generating NETSCOPE entity types.

    use super::*;
    use proptest::prelude::*;

    /// Generate an EndpointKind variant.
    pub fn arb_endpoint_kind() -> impl Strategy<Value = EndpointKind> {
        prop_oneof![
            Just(EndpointKind::CommandApi),
            Just(EndpointKind::FleetRest),
            Just(EndpointKind::GenericRest),
            Just(EndpointKind::Telemetry),
        ]
    }

    /// Generate a Timestamp within 2020-2030, with nanosecond precision.
    pub fn arb_timestamp() -> impl Strategy<Value = Timestamp> {
        (1577836800i64..1893456000i64, 0u32..1_000_000_000u32).prop_map(|(secs, nanos)| {
            chrono::DateTime::from_timestamp(secs, nanos).unwrap_or_else(Utc::now)
        })
    }

    /// Generate a registered Endpoint with arbitrary credentials.
    pub fn arb_endpoint() -> impl Strategy<Value = Endpoint> {
        (
            "[a-z][a-z0-9-]{0,15}",
            arb_endpoint_kind(),
            "[a-z]{1,10}(\\.[a-z]{1,5})?",
            proptest::option::of("[a-z]{1,8}"),
            proptest::option::of("[A-Za-z0-9]{1,12}"),
            proptest::option::of("[A-Za-z0-9]{8,32}"),
            any::<bool>(),
            prop::collection::vec("[a-z]{1,6}", 0..3),
        )
            .prop_map(|(name, kind, host, username, password, token, tls_verify, tags)| {
                let mut endpoint = Endpoint::register(
                    NewEndpoint::new(name, kind, format!("https://{}", host))
                        .with_tls_verify(tls_verify)
                        .with_tags(tags),
                );
                endpoint.username = username;
                endpoint.password = password;
                endpoint.token = token;
                endpoint
            })
    }

    /// Generate a QueryLogRecord for `endpoint_id`.
    pub fn arb_query_record(endpoint_id: String) -> impl Strategy<Value = QueryLogRecord> {
        (
            arb_timestamp(),
            prop_oneof![Just("GET"), Just("POST"), Just("PUT"), Just("DELETE")],
            "/[a-z]{1,8}(/[a-z]{1,8}){0,3}",
            prop_oneof![Just(200u16), Just(404u16), Just(500u16), Just(0u16)],
            0u64..60_000,
        )
            .prop_map(move |(timestamp, method, path, status, elapsed_ms)| QueryLogRecord {
                id: netscope_core::new_query_id(),
                endpoint_id: endpoint_id.clone(),
                method: method.to_string(),
                path,
                body: None,
                status,
                response: ResponseBody::Empty,
                timestamp,
                elapsed_ms,
                error: (status == 0).then(|| "connection refused".to_string()),
            })
    }

    /// Generate one documentation line of the form `<METHOD> <path>`.
    pub fn arb_endpoint_line() -> impl Strategy<Value = String> {
        (
            prop_oneof![Just("GET"), Just("post"), Just("Put"), Just("DELETE")],
            prop_oneof![Just("/api/"), Just("/telemetry/"), Just("/command-api/"), Just("/rest/")],
            "[a-z]{1,8}(/\\{[a-z]{1,6}\\})?",
        )
            .prop_map(|(method, prefix, rest)| format!("{} {}{}", method, prefix, rest))
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built test fixtures for common testing scenarios.

    use super::*;

    /// Command-API endpoint with basic auth against `url`.
    pub fn command_api_endpoint(url: &str) -> Endpoint {
        Endpoint::register(
            NewEndpoint::new("leaf1", EndpointKind::CommandApi, url).with_basic_auth("admin", "admin"),
        )
    }

    /// Fleet-REST endpoint with a bearer token against `url`.
    pub fn fleet_endpoint(url: &str) -> Endpoint {
        Endpoint::register(
            NewEndpoint::new("cvp", EndpointKind::FleetRest, url).with_token("test-token"),
        )
    }

    /// Endpoint of a kind that has no adapter.
    pub fn telemetry_endpoint(url: &str) -> Endpoint {
        Endpoint::register(NewEndpoint::new("gnmi", EndpointKind::Telemetry, url))
    }

    pub fn definition(service: Service, category: &str, method: &str, path: &str) -> ApiDefinition {
        ApiDefinition {
            id: format!("{}_{}_{}", category, method, path.replace('/', "_")),
            service,
            method: method.to_string(),
            path: path.to_string(),
            description: format!("{} {} for {}", method, path.trim_matches('/'), category),
            params: Vec::new(),
            category: category.to_string(),
            tags: vec![method.to_string(), category.to_lowercase()],
        }
    }

    /// Small catalog covering every service.
    pub fn sample_catalog() -> ApiCatalog {
        let mut catalog = ApiCatalog::new();
        catalog.insert(definition(EndpointKind::FleetRest, "Configuration", "GET", "/api/config/running"));
        catalog.insert(definition(EndpointKind::FleetRest, "Inventory", "GET", "/api/resources/inventory/v1/Devices"));
        catalog.insert(definition(EndpointKind::CommandApi, "Commands", "POST", "/command-api"));
        catalog.insert(definition(EndpointKind::GenericRest, "Interfaces", "GET", "/rest/interfaces"));
        catalog.insert(definition(EndpointKind::Telemetry, "Streaming", "GET", "/telemetry/counters"));
        catalog
    }

    /// Documentation text in the layout the catalog parser reads.
    pub const SAMPLE_DOCUMENT: &str = "\
Arista Networks EOS API Reference
# Generated from the vendor portal

Configuration
GET /api/config/running
PUT /api/config/sessions/{session}

Interface Stats
GET /rest/interfaces/{name}/stats
delete /rest/interfaces/{name}/counters/clear

Commands
POST /command-api

Streaming
GET /telemetry/interfaces/{name}/status
This line describes the streaming service in prose and is dropped entirely
";
}
