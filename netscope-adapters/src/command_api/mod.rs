//! Device command API adapter.
//!
//! Every request becomes one JSON-RPC `runCmds` call posted to
//! `<base>/command-api` with basic authentication. Per-command failures stay
//! inside the structured result; an `error` member in the envelope is
//! surfaced as a request-level error even when the HTTP status is 200.

pub mod types;

pub use types::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, RunCmdsParams};

use crate::transport::{HttpTransport, RawReply, WireResponse};
use crate::ProtocolAdapter;
use async_trait::async_trait;
use netscope_core::{AdapterError, ApiRequest, ConnectionTestResult, Endpoint, EndpointKind, ResponseBody};
use serde_json::json;
use std::time::{Duration, Instant};

/// Diagnostic command issued by connection tests.
pub const DIAGNOSTIC_COMMAND: &str = "show version";

/// Commands tried one by one during discovery.
pub const DISCOVERY_COMMANDS: [&str; 5] = [
    "show ?",
    "show running-config ?",
    "show interfaces ?",
    "show version",
    "show system",
];

/// Adapter for the device-local JSON-RPC command API.
#[derive(Debug)]
pub struct CommandApiAdapter {
    transport: HttpTransport,
}

impl CommandApiAdapter {
    pub fn new(request_timeout: Duration) -> Result<Self, AdapterError> {
        Ok(Self {
            transport: HttpTransport::new(request_timeout)?,
        })
    }

    /// Execute a batch of commands in one call.
    pub async fn run_cmds(&self, endpoint: &Endpoint, params: RunCmdsParams) -> Result<WireResponse, AdapterError> {
        let (username, password) = credentials(endpoint)?;
        self.send(endpoint, username, password, params).await
    }

    /// Run each of [`DISCOVERY_COMMANDS`] on its own and return the ones the
    /// device accepts.
    ///
    /// Missing credentials fail the whole call; a command that fails for any
    /// other reason is skipped.
    pub async fn enumerate_commands(&self, endpoint: &Endpoint) -> Result<Vec<String>, AdapterError> {
        let (username, password) = credentials(endpoint)?;
        let mut accepted = Vec::new();
        for command in DISCOVERY_COMMANDS {
            let params = RunCmdsParams {
                format: "text".to_string(),
                expand_aliases: false,
                ..RunCmdsParams::new(vec![command.to_string()])
            };
            match self.send(endpoint, username, password, params).await {
                Ok(wire) if wire.is_success() => accepted.push(command.to_string()),
                Ok(wire) => {
                    tracing::debug!(endpoint_id = %endpoint.id, command, status = wire.status, "Command rejected");
                }
                Err(e) => {
                    tracing::debug!(endpoint_id = %endpoint.id, command, error = %e, "Command failed");
                }
            }
        }
        Ok(accepted)
    }

    async fn send(
        &self,
        endpoint: &Endpoint,
        username: &str,
        password: &str,
        params: RunCmdsParams,
    ) -> Result<WireResponse, AdapterError> {
        let url = format!("{}/command-api", endpoint.base_url());
        tracing::debug!(
            endpoint_id = %endpoint.id,
            url = %url,
            commands = params.cmds.len(),
            "Sending runCmds"
        );

        let request = self
            .transport
            .client(endpoint.tls_verify)
            .post(&url)
            .basic_auth(username, Some(password))
            .json(&JsonRpcRequest::run_cmds(params));

        let raw = self.transport.execute(request).await?;
        Ok(decode_reply(raw))
    }
}

/// Username and password, both required for this kind.
fn credentials(endpoint: &Endpoint) -> Result<(&str, &str), AdapterError> {
    let username = endpoint.username().ok_or_else(|| AdapterError::Configuration {
        kind: EndpointKind::CommandApi,
        field: "username".to_string(),
    })?;
    let password = endpoint.password().ok_or_else(|| AdapterError::Configuration {
        kind: EndpointKind::CommandApi,
        field: "password".to_string(),
    })?;
    Ok((username, password))
}

/// Normalize the envelope into `{"result": [...]}` or `{"error": {...}}`.
///
/// A 2xx reply that is not an envelope is a decode error; the raw body is
/// kept. Non-2xx replies already fail on their status.
fn decode_reply(raw: RawReply) -> WireResponse {
    let success_status = (200..300).contains(&raw.status);
    let not_an_envelope = |reason: String| success_status.then_some(AdapterError::Decode { reason });

    let (body, error) = match ResponseBody::from_bytes(&raw.bytes) {
        ResponseBody::Json(value) => match serde_json::from_value::<JsonRpcResponse>(value.clone()) {
            Ok(JsonRpcResponse {
                error: Some(rpc_error),
                ..
            }) => {
                let message = rpc_error.describe();
                (
                    ResponseBody::Json(json!({ "error": rpc_error })),
                    Some(AdapterError::RemoteError { message }),
                )
            }
            Ok(JsonRpcResponse {
                result: Some(result),
                error: None,
            }) => (ResponseBody::Json(json!({ "result": result })), None),
            Ok(JsonRpcResponse {
                result: None,
                error: None,
            }) => (
                ResponseBody::Json(value),
                not_an_envelope("reply has neither result nor error".to_string()),
            ),
            Err(e) => (ResponseBody::Json(value), not_an_envelope(e.to_string())),
        },
        other => {
            let error = not_an_envelope("response is not a JSON-RPC envelope".to_string());
            (other, error)
        }
    };

    WireResponse {
        status: raw.status,
        headers: raw.headers,
        body,
        elapsed_ms: raw.elapsed_ms,
        error,
    }
}

#[async_trait]
impl ProtocolAdapter for CommandApiAdapter {
    fn kind(&self) -> EndpointKind {
        EndpointKind::CommandApi
    }

    async fn call(&self, endpoint: &Endpoint, request: &ApiRequest) -> Result<WireResponse, AdapterError> {
        let (username, password) = credentials(endpoint)?;
        let params = RunCmdsParams::from_body(request.body.as_ref())?;
        self.send(endpoint, username, password, params).await
    }

    async fn test_connection(&self, endpoint: &Endpoint) -> ConnectionTestResult {
        let params = RunCmdsParams {
            expand_aliases: false,
            ..RunCmdsParams::new(vec![DIAGNOSTIC_COMMAND.to_string()])
        };

        let start = Instant::now();
        match self.run_cmds(endpoint, params).await {
            Ok(wire) if wire.status == 200 && wire.error.is_none() => ConnectionTestResult {
                success: true,
                message: "Connection successful".to_string(),
                status_code: Some(wire.status),
                elapsed_ms: wire.elapsed_ms,
                details: wire.body.as_json().cloned(),
            },
            Ok(wire) => ConnectionTestResult {
                success: false,
                message: match &wire.error {
                    Some(error) => error.to_string(),
                    None => format!("Connection failed: HTTP {}", wire.status),
                },
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
        self.enumerate_commands(endpoint).await
    }
}
