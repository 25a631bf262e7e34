//! NETSCOPE Engine - Dispatch and Operation Surface
//!
//! Ties the store, the protocol adapters, the catalog and the lookup source
//! together:
//! - [`dispatcher`] resolves an endpoint, runs its adapter under a deadline
//!   and logs every outcome
//! - [`workbench`] is the operation surface front ends call
//! - [`bootstrap`] loads or builds the catalog snapshot at startup
//! - [`config`] and [`telemetry`] cover TOML configuration and tracing setup

pub mod bootstrap;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod telemetry;
pub mod workbench;

pub use config::{ConfigError, NetscopeConfig};
pub use dispatcher::Dispatcher;
pub use error::EngineError;
pub use telemetry::init_tracing;
pub use workbench::Workbench;
