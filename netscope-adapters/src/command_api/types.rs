//! JSON-RPC envelope of the device command API.

use netscope_core::AdapterError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

fn default_version() -> u32 {
    1
}

fn default_format() -> String {
    "json".to_string()
}

fn default_true() -> bool {
    true
}

/// Parameters of a `runCmds` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunCmdsParams {
    #[serde(default = "default_version")]
    pub version: u32,
    /// Commands executed in order within one call.
    pub cmds: Vec<String>,
    #[serde(default = "default_format")]
    pub format: String,
    #[serde(default = "default_true")]
    pub auto_complete: bool,
    #[serde(default = "default_true")]
    pub expand_aliases: bool,
}

impl RunCmdsParams {
    /// Parameters for `cmds` with every option at its default.
    pub fn new(cmds: Vec<String>) -> Self {
        Self {
            version: default_version(),
            cmds,
            format: default_format(),
            auto_complete: true,
            expand_aliases: true,
        }
    }

    /// Read parameters from a generic request body.
    ///
    /// `cmds` is required; `version`, `format`, `autoComplete` and
    /// `expandAliases` override the defaults when present.
    pub fn from_body(body: Option<&Value>) -> Result<Self, AdapterError> {
        let body = body.ok_or_else(|| AdapterError::InvalidRequest {
            reason: "cmds field is required and must be an array of strings".to_string(),
        })?;
        let params: Self = serde_json::from_value(body.clone()).map_err(|e| AdapterError::InvalidRequest {
            reason: format!("cmds field is required and must be an array of strings ({})", e),
        })?;
        if params.cmds.is_empty() {
            return Err(AdapterError::InvalidRequest {
                reason: "cmds must contain at least one command".to_string(),
            });
        }
        Ok(params)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: &'static str,
    pub method: &'static str,
    pub params: RunCmdsParams,
    pub id: String,
}

impl JsonRpcRequest {
    pub fn run_cmds(params: RunCmdsParams) -> Self {
        Self {
            jsonrpc: "2.0",
            method: "runCmds",
            params,
            id: "1".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(default)]
    pub result: Option<Vec<Value>>,
    #[serde(default)]
    pub error: Option<JsonRpcError>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    /// Message surfaced as the request-level error.
    pub fn describe(&self) -> String {
        if self.message.is_empty() {
            format!("command API error {}", self.code)
        } else {
            self.message.clone()
        }
    }
}
