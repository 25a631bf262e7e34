//! Generic request/response contract and the query log record.

use crate::{EndpointId, ErrorKind, QueryId, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Response headers, multi-valued, keyed by lower-cased name.
pub type HeaderMap = BTreeMap<String, Vec<String>>;

/// A generic request issued against one endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiRequest {
    pub endpoint_id: EndpointId,
    /// HTTP method for REST endpoints; informational for the command API.
    pub method: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    /// Unset or non-positive falls back to the dispatcher default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<i64>,
}

impl ApiRequest {
    pub fn new(endpoint_id: impl Into<EndpointId>, method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            endpoint_id: endpoint_id.into(),
            method: method.into(),
            path: path.into(),
            body: None,
            timeout_ms: None,
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: i64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }
}

/// Decoded response body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum ResponseBody {
    /// Body parsed as structured JSON.
    Json(Value),
    /// Body that could not be parsed, kept verbatim.
    Text(String),
    /// No response body (e.g. transport failure).
    #[default]
    Empty,
}

impl ResponseBody {
    /// Parse raw bytes, degrading to literal text when they are not JSON.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        if bytes.is_empty() {
            return ResponseBody::Empty;
        }
        match serde_json::from_slice::<Value>(bytes) {
            Ok(value) => ResponseBody::Json(value),
            Err(_) => ResponseBody::Text(String::from_utf8_lossy(bytes).into_owned()),
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ResponseBody::Json(value) => Some(value),
            _ => None,
        }
    }
}

/// Normalized result of one dispatched request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    /// HTTP status; 0 when no response was received.
    pub status: u16,
    #[serde(default)]
    pub headers: HeaderMap,
    #[serde(default)]
    pub body: ResponseBody,
    pub elapsed_ms: u64,
    pub endpoint_id: EndpointId,
    /// Identifier of the query log record written for this request.
    pub log_id: QueryId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl ApiResponse {
    /// 2xx status and no request-level error.
    pub fn success(&self) -> bool {
        self.error.is_none() && (200..300).contains(&self.status)
    }
}

/// Append-only record of one executed request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryLogRecord {
    pub id: QueryId,
    pub endpoint_id: EndpointId,
    pub method: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    pub status: u16,
    pub response: ResponseBody,
    pub timestamp: Timestamp,
    pub elapsed_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl QueryLogRecord {
    /// Storage key `<nanosecond-timestamp>_<record-id>`.
    ///
    /// The timestamp is zero-padded to 20 digits so byte order equals
    /// chronological order.
    pub fn log_key(&self) -> String {
        let nanos = self.timestamp.timestamp_nanos_opt().unwrap_or(0).max(0);
        format!("{:020}_{}", nanos, self.id)
    }
}

/// Structured outcome of a connection test. Never an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionTestResult {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    pub elapsed_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ConnectionTestResult {
    /// Failed test that never reached the network.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            status_code: None,
            elapsed_ms: 0,
            details: None,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}
