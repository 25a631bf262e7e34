//! Shared HTTP transport for adapters.

use netscope_core::{AdapterError, HeaderMap, ResponseBody};
use reqwest::{Client, RequestBuilder};
use std::time::{Duration, Instant};

/// Reply of one wire call, before dispatch normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct WireResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: ResponseBody,
    pub elapsed_ms: u64,
    /// Request-level error reported by the remote side or by decoding.
    pub error: Option<AdapterError>,
}

impl WireResponse {
    pub fn is_success(&self) -> bool {
        self.error.is_none() && (200..300).contains(&self.status)
    }
}

/// Raw HTTP exchange result.
#[derive(Debug)]
pub struct RawReply {
    pub status: u16,
    pub headers: HeaderMap,
    pub bytes: Vec<u8>,
    pub elapsed_ms: u64,
}

/// Pair of reusable clients, one verifying TLS certificates and one not.
///
/// Each adapter owns its own transport; the clients pool connections and
/// are safe to share across concurrent requests.
pub struct HttpTransport {
    verified: Client,
    unverified: Client,
    request_timeout: Duration,
}

impl HttpTransport {
    /// Build both clients with `request_timeout` as the per-exchange bound.
    pub fn new(request_timeout: Duration) -> Result<Self, AdapterError> {
        let verified = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| AdapterError::Transport {
                reason: format!("Failed to build HTTP client: {}", e),
            })?;
        let unverified = Client::builder()
            .timeout(request_timeout)
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(|e| AdapterError::Transport {
                reason: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            verified,
            unverified,
            request_timeout,
        })
    }

    /// Client honoring the endpoint's TLS verification flag.
    pub fn client(&self, tls_verify: bool) -> &Client {
        if tls_verify {
            &self.verified
        } else {
            &self.unverified
        }
    }

    /// Send a prepared request and read the whole body.
    pub async fn execute(&self, request: RequestBuilder) -> Result<RawReply, AdapterError> {
        let start = Instant::now();
        let response = request.send().await.map_err(|e| self.map_error(e))?;

        let status = response.status().as_u16();
        let headers = collect_headers(response.headers());
        let bytes = response.bytes().await.map_err(|e| self.map_error(e))?;

        Ok(RawReply {
            status,
            headers,
            bytes: bytes.to_vec(),
            elapsed_ms: start.elapsed().as_millis() as u64,
        })
    }

    fn map_error(&self, e: reqwest::Error) -> AdapterError {
        if e.is_timeout() {
            AdapterError::Timeout {
                timeout_ms: self.request_timeout.as_millis() as u64,
            }
        } else {
            AdapterError::Transport {
                reason: error_chain(&e),
            }
        }
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// reqwest's top-level message hides the cause ("error sending request"),
/// so the source chain is appended.
fn error_chain(e: &reqwest::Error) -> String {
    let mut message = e.to_string();
    let mut source = std::error::Error::source(e);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

fn collect_headers(headers: &reqwest::header::HeaderMap) -> HeaderMap {
    let mut collected = HeaderMap::new();
    for (name, value) in headers {
        collected
            .entry(name.as_str().to_string())
            .or_insert_with(Vec::new)
            .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
    }
    collected
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderValue, SET_COOKIE};

    #[test]
    fn test_collect_headers_keeps_repeated_values() {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.append(SET_COOKIE, HeaderValue::from_static("a=1"));
        headers.append(SET_COOKIE, HeaderValue::from_static("b=2"));
        let collected = collect_headers(&headers);
        assert_eq!(
            collected.get("set-cookie"),
            Some(&vec!["a=1".to_string(), "b=2".to_string()])
        );
    }

    #[test]
    fn test_wire_response_success() {
        let mut wire = WireResponse {
            status: 204,
            headers: HeaderMap::new(),
            body: ResponseBody::Empty,
            elapsed_ms: 0,
            error: None,
        };
        assert!(wire.is_success());
        wire.error = Some(AdapterError::RemoteError {
            message: "invalid command".to_string(),
        });
        assert!(!wire.is_success());
    }
}
