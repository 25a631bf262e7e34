//! Operation surface over the store, the dispatcher, the catalog and the
//! lookup source.
//!
//! Front ends (the CLI, a GUI shell) talk only to [`Workbench`]. It owns the
//! store handle for the process lifetime and releases it in
//! [`Workbench::close`].

use crate::bootstrap;
use crate::config::{CatalogConfig, NetscopeConfig};
use crate::dispatcher::{is_http_url, Dispatcher};
use crate::error::EngineError;
use netscope_adapters::fleet_rest::{DEVICES_PATH, EVENTS_PATH};
use netscope_adapters::AdapterRegistry;
use netscope_catalog::{definitions_by_category, definitions_by_service, search};
use netscope_core::{
    ApiCatalog, ApiDefinition, ApiRequest, ApiResponse, ConnectionTestResult,
    DeviceInventoryRecord, Endpoint, EndpointKind, NetscopeError, NetscopeResult, NewEndpoint,
    QueryLogRecord, ValidationError,
};
use netscope_lookup::{LookupDefinition, LookupError, LookupSource};
use netscope_storage::RecordStore;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

pub struct Workbench {
    store: Arc<RecordStore>,
    dispatcher: Dispatcher,
    catalog: RwLock<Arc<ApiCatalog>>,
    catalog_config: CatalogConfig,
    lookup: Option<LookupSource>,
    lookup_path: Option<PathBuf>,
}

impl Workbench {
    /// Assemble a workbench from already opened parts, with an empty catalog
    /// and no lookup source.
    pub fn new(store: Arc<RecordStore>, registry: AdapterRegistry, config: &NetscopeConfig) -> Self {
        Self {
            dispatcher: Dispatcher::new(Arc::clone(&store), registry, config.dispatch.clone()),
            store,
            catalog: RwLock::new(Arc::new(ApiCatalog::new())),
            catalog_config: config.catalog.clone(),
            lookup: None,
            lookup_path: config.lookup.path.clone(),
        }
    }

    /// Open everything the configuration names.
    ///
    /// A catalog that cannot be loaded or parsed leaves the catalog empty,
    /// and a lookup database that cannot be opened disables lookups; both
    /// are logged and neither stops startup.
    pub fn open(config: &NetscopeConfig) -> Result<Self, EngineError> {
        let store = Arc::new(RecordStore::open(&config.store.path, config.store.max_size_mb)?);
        let registry = AdapterRegistry::with_defaults(config.dispatch.transport_timeout())
            .map_err(NetscopeError::from)?;
        let mut workbench = Self::new(Arc::clone(&store), registry, config);

        match bootstrap::load_catalog(&config.catalog, &store) {
            Ok(catalog) => workbench = workbench.with_catalog(catalog),
            Err(e) => tracing::error!(error = %e, "Failed to load API catalog"),
        }

        if let Some(path) = &config.lookup.path {
            match LookupSource::open(path) {
                Ok(source) => {
                    tracing::info!(path = %path.display(), "Lookup database opened");
                    workbench = workbench.with_lookup(source);
                }
                Err(e) => tracing::warn!(error = %e, "Lookup database unavailable"),
            }
        }

        Ok(workbench)
    }

    pub fn with_catalog(self, catalog: ApiCatalog) -> Self {
        self.replace_catalog(catalog);
        self
    }

    pub fn with_lookup(mut self, source: LookupSource) -> Self {
        self.lookup_path = Some(source.path().to_path_buf());
        self.lookup = Some(source);
        self
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    // ------------------------------------------------------------------------
    // Endpoints
    // ------------------------------------------------------------------------

    /// Register a new endpoint and mirror it into the device inventory.
    ///
    /// The inventory write is best effort: a failure is logged and the
    /// registration still succeeds.
    pub fn register_endpoint(&self, new: NewEndpoint) -> NetscopeResult<Endpoint> {
        validate_target(&new.name, &new.url)?;
        let endpoint = Endpoint::register(new);
        self.store.save_endpoint(&endpoint)?;

        let record = DeviceInventoryRecord::mirror(&endpoint);
        if let Err(e) = self.store.save_inventory_record(&record) {
            tracing::warn!(endpoint_id = %endpoint.id, error = %e, "Failed to add device to inventory");
        }

        tracing::info!(
            endpoint_id = %endpoint.id,
            name = %endpoint.name,
            kind = %endpoint.kind,
            "Endpoint registered"
        );
        Ok(endpoint)
    }

    /// Replace the editable fields of an existing endpoint.
    ///
    /// The identifier, kind and creation time are fixed at registration; a
    /// different kind is rejected. The inventory mirror is left untouched.
    pub fn update_endpoint(&self, endpoint: Endpoint) -> NetscopeResult<Endpoint> {
        let existing = self.dispatcher.resolve(&endpoint.id)?;
        if existing.kind != endpoint.kind {
            return Err(ValidationError::KindImmutable { id: endpoint.id }.into());
        }
        validate_target(&endpoint.name, &endpoint.url)?;

        let updated = Endpoint {
            created: existing.created,
            ..endpoint
        };
        self.store.save_endpoint(&updated)?;
        tracing::info!(endpoint_id = %updated.id, name = %updated.name, "Endpoint updated");
        Ok(updated)
    }

    /// Delete an endpoint. Deleting an absent endpoint succeeds.
    pub fn delete_endpoint(&self, endpoint_id: &str) -> NetscopeResult<()> {
        if self.store.delete_endpoint(endpoint_id)? {
            tracing::info!(endpoint_id, "Endpoint deleted");
        } else {
            tracing::debug!(endpoint_id, "Endpoint already absent");
        }
        Ok(())
    }

    pub fn list_endpoints(&self) -> NetscopeResult<Vec<Endpoint>> {
        Ok(self.store.endpoints()?)
    }

    pub fn endpoint(&self, endpoint_id: &str) -> NetscopeResult<Endpoint> {
        self.dispatcher.resolve(endpoint_id)
    }

    // ------------------------------------------------------------------------
    // Requests and connection tests
    // ------------------------------------------------------------------------

    pub async fn execute(&self, request: ApiRequest) -> NetscopeResult<ApiResponse> {
        self.dispatcher.execute(request).await
    }

    pub async fn test_connection(&self, endpoint_id: &str) -> NetscopeResult<ConnectionTestResult> {
        self.dispatcher.test_connection(endpoint_id).await
    }

    pub async fn probe_connection(&self, target: NewEndpoint) -> ConnectionTestResult {
        self.dispatcher.probe_connection(target).await
    }

    /// Commands (command API) or resource models (fleet REST) the endpoint
    /// answers for.
    pub async fn discover(&self, endpoint_id: &str) -> NetscopeResult<Vec<String>> {
        self.dispatcher.discover(endpoint_id).await
    }

    /// Fetch the controller's device inventory. Logged like any request.
    pub async fn list_devices(&self, endpoint_id: &str) -> NetscopeResult<ApiResponse> {
        self.fleet_listing(endpoint_id, DEVICES_PATH).await
    }

    /// Fetch the controller's events. Logged like any request.
    pub async fn list_events(&self, endpoint_id: &str) -> NetscopeResult<ApiResponse> {
        self.fleet_listing(endpoint_id, EVENTS_PATH).await
    }

    async fn fleet_listing(&self, endpoint_id: &str, path: &str) -> NetscopeResult<ApiResponse> {
        let endpoint = self.dispatcher.resolve(endpoint_id)?;
        if endpoint.kind != EndpointKind::FleetRest {
            return Err(ValidationError::InvalidValue {
                field: "kind".to_string(),
                reason: format!("listing {} needs a {} endpoint", path, EndpointKind::FleetRest),
            }
            .into());
        }
        self.dispatcher
            .execute(ApiRequest::new(endpoint.id, "GET", path))
            .await
    }

    // ------------------------------------------------------------------------
    // Query log and inventory
    // ------------------------------------------------------------------------

    /// Every logged request, oldest first.
    pub fn query_log(&self) -> NetscopeResult<Vec<QueryLogRecord>> {
        Ok(self.store.query_log()?)
    }

    pub fn query_log_for_endpoint(&self, endpoint_id: &str) -> NetscopeResult<Vec<QueryLogRecord>> {
        Ok(self.store.query_log_for_endpoint(endpoint_id)?)
    }

    pub fn inventory(&self) -> NetscopeResult<Vec<DeviceInventoryRecord>> {
        Ok(self.store.inventory()?)
    }

    pub fn inventory_record(&self, id: &str) -> NetscopeResult<DeviceInventoryRecord> {
        Ok(self.store.inventory_record(id)?)
    }

    /// Overwrite an existing inventory record.
    pub fn update_inventory_record(&self, record: &DeviceInventoryRecord) -> NetscopeResult<()> {
        self.store.inventory_record(&record.id)?;
        self.store.save_inventory_record(record)?;
        tracing::info!(device_id = %record.id, "Inventory record updated");
        Ok(())
    }

    /// Remove an inventory record. Removing an absent record succeeds.
    pub fn delete_inventory_record(&self, id: &str) -> NetscopeResult<()> {
        if self.store.delete_inventory_record(id)? {
            tracing::info!(device_id = id, "Inventory record deleted");
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Catalog
    // ------------------------------------------------------------------------

    /// Current catalog snapshot.
    pub fn catalog(&self) -> Arc<ApiCatalog> {
        match self.catalog.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    pub fn search_catalog(&self, query: &str) -> Vec<ApiDefinition> {
        search(&self.catalog(), query)
    }

    /// Definitions of one service by wire tag; unknown tags yield nothing.
    pub fn catalog_by_service(&self, service: &str) -> BTreeMap<String, ApiDefinition> {
        definitions_by_service(&self.catalog(), service)
    }

    pub fn catalog_by_category(&self, category: &str) -> Vec<ApiDefinition> {
        definitions_by_category(&self.catalog(), category)
    }

    /// Re-parse the source document and supersede the current catalog.
    ///
    /// On failure the previous catalog stays in place.
    pub fn reparse_catalog(&self) -> NetscopeResult<Arc<ApiCatalog>> {
        let catalog = bootstrap::parse_and_publish(&self.catalog_config, &self.store)?;
        Ok(self.replace_catalog(catalog))
    }

    fn replace_catalog(&self, catalog: ApiCatalog) -> Arc<ApiCatalog> {
        let catalog = Arc::new(catalog);
        match self.catalog.write() {
            Ok(mut guard) => *guard = Arc::clone(&catalog),
            Err(poisoned) => *poisoned.into_inner() = Arc::clone(&catalog),
        }
        catalog
    }

    // ------------------------------------------------------------------------
    // Lookup
    // ------------------------------------------------------------------------

    fn lookup(&self) -> Result<&LookupSource, LookupError> {
        self.lookup.as_ref().ok_or_else(|| LookupError::Unavailable {
            path: self
                .lookup_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "<not configured>".to_string()),
            reason: "lookup database is not open".to_string(),
        })
    }

    pub fn lookup_available(&self) -> bool {
        self.lookup.is_some()
    }

    pub fn lookup_tables(&self) -> Result<Vec<String>, LookupError> {
        self.lookup()?.tables()
    }

    pub fn lookup_table_columns(&self, table: &str) -> Result<Vec<String>, LookupError> {
        self.lookup()?.table_columns(table)
    }

    pub fn lookup_definitions(&self) -> Result<Vec<LookupDefinition>, LookupError> {
        self.lookup()?.definitions()
    }

    pub fn lookup_definitions_by_service(&self, service: &str) -> Result<Vec<LookupDefinition>, LookupError> {
        self.lookup()?.definitions_by_service(service)
    }

    pub fn lookup_search(&self, keyword: &str) -> Result<Vec<LookupDefinition>, LookupError> {
        self.lookup()?.search(keyword)
    }

    /// Release the store. Outstanding handles keep it open until dropped.
    pub fn close(self) {
        let Workbench {
            store, dispatcher, ..
        } = self;
        drop(dispatcher);
        match Arc::try_unwrap(store) {
            Ok(store) => store.close(),
            Err(_) => tracing::warn!("Record store still shared, closing on last drop"),
        }
    }
}

impl std::fmt::Debug for Workbench {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workbench")
            .field("dispatcher", &self.dispatcher)
            .field("catalog_config", &self.catalog_config)
            .field("lookup", &self.lookup)
            .finish()
    }
}

fn validate_target(name: &str, url: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::RequiredFieldMissing {
            field: "name".to_string(),
        });
    }
    if url.trim().is_empty() {
        return Err(ValidationError::RequiredFieldMissing {
            field: "url".to_string(),
        });
    }
    if !is_http_url(url) {
        return Err(ValidationError::InvalidValue {
            field: "url".to_string(),
            reason: "must start with http:// or https://".to_string(),
        });
    }
    Ok(())
}
