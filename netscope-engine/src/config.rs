//! Configuration loading for NETSCOPE.
//!
//! Every section is optional; a missing file path yields the defaults.

use netscope_catalog::CatalogRules;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_ENV: &str = "NETSCOPE_CONFIG";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NetscopeConfig {
    pub store: StoreConfig,
    pub catalog: CatalogConfig,
    pub dispatch: DispatchConfig,
    pub lookup: LookupConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// LMDB environment directory.
    pub path: PathBuf,
    pub max_size_mb: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/netscope.lmdb"),
            max_size_mb: 256,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogConfig {
    pub snapshot_path: PathBuf,
    /// Documentation dump parsed when no snapshot exists.
    pub source_path: PathBuf,
    pub title_prefix: String,
    pub max_header_len: usize,
    pub max_spaced_header_len: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        let rules = CatalogRules::default();
        Self {
            snapshot_path: PathBuf::from("api_catalog.json"),
            source_path: PathBuf::from("Enumerated_API.md"),
            title_prefix: rules.title_prefix,
            max_header_len: rules.max_header_len,
            max_spaced_header_len: rules.max_spaced_header_len,
        }
    }
}

impl CatalogConfig {
    pub fn rules(&self) -> CatalogRules {
        CatalogRules {
            title_prefix: self.title_prefix.clone(),
            max_header_len: self.max_header_len,
            max_spaced_header_len: self.max_spaced_header_len,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DispatchConfig {
    /// Deadline applied when a request carries none.
    pub default_timeout_ms: u64,
    pub connection_test_timeout_ms: u64,
    /// Deadline for a whole discovery run, which issues one call per candidate.
    pub discovery_timeout_ms: u64,
    /// Per-exchange bound of the HTTP clients.
    pub transport_timeout_ms: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: 30_000,
            connection_test_timeout_ms: 10_000,
            discovery_timeout_ms: 120_000,
            transport_timeout_ms: 60_000,
        }
    }
}

impl DispatchConfig {
    /// Deadline for one request; unset or non-positive falls back to the default.
    pub fn request_timeout(&self, requested_ms: Option<i64>) -> Duration {
        match requested_ms {
            Some(ms) if ms > 0 => Duration::from_millis(ms as u64),
            _ => Duration::from_millis(self.default_timeout_ms),
        }
    }

    pub fn connection_test_timeout(&self) -> Duration {
        Duration::from_millis(self.connection_test_timeout_ms)
    }

    pub fn discovery_timeout(&self) -> Duration {
        Duration::from_millis(self.discovery_timeout_ms)
    }

    pub fn transport_timeout(&self) -> Duration {
        Duration::from_millis(self.transport_timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LookupConfig {
    /// SQLite lookup database; `None` disables lookups.
    pub path: Option<PathBuf>,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            path: Some(PathBuf::from("netvisor_api_v711.db")),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is unset.
    pub filter: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "netscope=info".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl NetscopeConfig {
    /// Load from `explicit`, else `NETSCOPE_CONFIG`, else defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = explicit.map(Path::to_path_buf).or_else(config_path_from_env);
        let config = match path {
            Some(path) => Self::from_path(&path)?,
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: NetscopeConfig = toml::from_str(contents)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "store.path",
                reason: "must not be empty".to_string(),
            });
        }
        if self.store.max_size_mb == 0 {
            return Err(ConfigError::InvalidValue {
                field: "store.max_size_mb",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.catalog.snapshot_path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "catalog.snapshot_path",
                reason: "must not be empty".to_string(),
            });
        }
        if self.catalog.source_path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "catalog.source_path",
                reason: "must not be empty".to_string(),
            });
        }
        if self.catalog.max_spaced_header_len > self.catalog.max_header_len {
            return Err(ConfigError::InvalidValue {
                field: "catalog.max_spaced_header_len",
                reason: "must not exceed catalog.max_header_len".to_string(),
            });
        }
        for (field, value) in [
            ("dispatch.default_timeout_ms", self.dispatch.default_timeout_ms),
            (
                "dispatch.connection_test_timeout_ms",
                self.dispatch.connection_test_timeout_ms,
            ),
            ("dispatch.discovery_timeout_ms", self.dispatch.discovery_timeout_ms),
            ("dispatch.transport_timeout_ms", self.dispatch.transport_timeout_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: "must be greater than zero".to_string(),
                });
            }
        }
        if matches!(&self.lookup.path, Some(path) if path.as_os_str().is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: "lookup.path",
                reason: "must not be empty when set".to_string(),
            });
        }
        Ok(())
    }
}

fn config_path_from_env() -> Option<PathBuf> {
    std::env::var(CONFIG_ENV).ok().map(PathBuf::from)
}
