//! NETSCOPE Adapters - Protocol Dispatch Layer
//!
//! Kind-polymorphic adapters that turn a generic [`ApiRequest`] into one
//! wire call and the wire reply back into a [`WireResponse`].
//! One adapter exists per endpoint kind that can actually be reached:
//! - [`CommandApiAdapter`] batches commands into a JSON-RPC `runCmds` call
//! - [`FleetRestAdapter`] issues the caller's method and path as plain REST
//!
//! Adapters are selected through an [`AdapterRegistry`] keyed on the kind tag.

pub mod command_api;
pub mod fleet_rest;
pub mod transport;

pub use command_api::CommandApiAdapter;
pub use fleet_rest::FleetRestAdapter;
pub use transport::{HttpTransport, WireResponse};

use async_trait::async_trait;
use netscope_core::{AdapterError, ApiRequest, ConnectionTestResult, Endpoint, EndpointKind};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// PROTOCOL ADAPTER TRAIT
// ============================================================================

/// Capability implemented once per reachable endpoint kind.
///
/// Implementations must be thread-safe (Send + Sync); one instance serves
/// every concurrent request for its kind.
#[async_trait]
pub trait ProtocolAdapter: Send + Sync {
    /// Endpoint kind this adapter speaks.
    fn kind(&self) -> EndpointKind;

    /// Perform exactly one network round trip for `request`.
    ///
    /// # Returns
    /// * `Ok(WireResponse)` - A response arrived; remote and decode problems
    ///   are carried in [`WireResponse::error`]
    /// * `Err(AdapterError)` - No response: missing credentials, an invalid
    ///   request, or a transport failure
    async fn call(&self, endpoint: &Endpoint, request: &ApiRequest) -> Result<WireResponse, AdapterError>;

    /// Issue the kind's fixed diagnostic call. Never fails.
    async fn test_connection(&self, endpoint: &Endpoint) -> ConnectionTestResult;

    /// Names of the capabilities the endpoint answers for: runnable commands
    /// for the command API, resource models for fleet REST.
    ///
    /// Candidates that fail are left out. Kinds without a discovery
    /// mechanism report nothing.
    async fn discover(&self, _endpoint: &Endpoint) -> Result<Vec<String>, AdapterError> {
        Ok(Vec::new())
    }
}

// ============================================================================
// ADAPTER REGISTRY
// ============================================================================

/// Registry of protocol adapters keyed by endpoint kind.
/// Adapters must be explicitly registered; [`AdapterRegistry::with_defaults`]
/// registers the two built-in ones.
pub struct AdapterRegistry {
    adapters: HashMap<EndpointKind, Arc<dyn ProtocolAdapter>>,
}

impl AdapterRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            adapters: HashMap::new(),
        }
    }

    /// Registry with the command-API and fleet-REST adapters.
    ///
    /// # Arguments
    /// * `transport_timeout` - Upper bound for a single HTTP exchange
    pub fn with_defaults(transport_timeout: Duration) -> Result<Self, AdapterError> {
        let mut registry = Self::new();
        registry.register(Arc::new(CommandApiAdapter::new(transport_timeout)?));
        registry.register(Arc::new(FleetRestAdapter::new(transport_timeout)?));
        Ok(registry)
    }

    /// Register an adapter under its own kind.
    /// Replaces any adapter previously registered for that kind.
    pub fn register(&mut self, adapter: Arc<dyn ProtocolAdapter>) {
        self.adapters.insert(adapter.kind(), adapter);
    }

    /// Adapter for `kind`, if one is registered.
    pub fn get(&self, kind: EndpointKind) -> Option<Arc<dyn ProtocolAdapter>> {
        self.adapters.get(&kind).cloned()
    }

    pub fn supports(&self, kind: EndpointKind) -> bool {
        self.adapters.contains_key(&kind)
    }

    /// Registered kinds in declaration order.
    pub fn kinds(&self) -> Vec<EndpointKind> {
        EndpointKind::ALL
            .into_iter()
            .filter(|kind| self.supports(*kind))
            .collect()
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}

// ============================================================================
// UNIT TESTS
// ============================================================================
