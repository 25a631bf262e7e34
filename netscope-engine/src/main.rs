//! `netscope` command line front end.
//!
//! Every command prints its result as pretty JSON on stdout; logs go to
//! stderr.

use clap::{Args, Parser, Subcommand};
use netscope_core::{ApiRequest, EndpointKind, NewEndpoint};
use netscope_engine::{init_tracing, EngineError, NetscopeConfig, Workbench};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "netscope", version, about = "Network API workbench")]
struct Cli {
    /// TOML configuration file (overrides `NETSCOPE_CONFIG`).
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List registered endpoints.
    Endpoints,
    /// Register a new endpoint.
    Register {
        name: String,
        /// eapi, cloudvision, eos_rest or telemetry.
        kind: EndpointKind,
        url: String,
        #[command(flatten)]
        credentials: Credentials,
        #[arg(long = "tag", value_name = "TAG")]
        tags: Vec<String>,
    },
    /// Delete an endpoint.
    Delete { endpoint_id: String },
    /// Test the connection of a registered endpoint.
    Test { endpoint_id: String },
    /// Test an unsaved target without registering it.
    Probe {
        kind: EndpointKind,
        url: String,
        #[command(flatten)]
        credentials: Credentials,
    },
    /// Execute a request against an endpoint.
    Run {
        endpoint_id: String,
        method: String,
        path: String,
        /// JSON request body.
        #[arg(long)]
        body: Option<String>,
        #[arg(long, value_name = "MS")]
        timeout_ms: Option<i64>,
    },
    /// Discover commands or resource models an endpoint answers for.
    Discover { endpoint_id: String },
    /// List the devices known to a fleet controller.
    Devices { endpoint_id: String },
    /// List the events of a fleet controller.
    Events { endpoint_id: String },
    /// Show the query log, optionally for one endpoint.
    QueryLog { endpoint_id: Option<String> },
    /// Show the device inventory.
    Inventory,
    /// Browse the API catalog.
    Catalog {
        #[command(subcommand)]
        command: CatalogCommand,
    },
    /// Query the secondary lookup database.
    Lookup {
        #[command(subcommand)]
        command: LookupCommand,
    },
}

#[derive(Args, Debug)]
struct Credentials {
    #[arg(long)]
    username: Option<String>,
    #[arg(long)]
    password: Option<String>,
    #[arg(long)]
    token: Option<String>,
    /// Skip TLS certificate verification.
    #[arg(long)]
    insecure: bool,
}

impl Credentials {
    fn apply(self, mut new: NewEndpoint) -> NewEndpoint {
        new.username = self.username;
        new.password = self.password;
        new.token = self.token;
        new.with_tls_verify(!self.insecure)
    }
}

#[derive(Subcommand, Debug)]
enum CatalogCommand {
    /// Free-text search.
    Search { query: String },
    /// Definitions of one service.
    Service { service: String },
    /// Definitions of one category.
    Category { category: String },
    /// Re-parse the source document and replace the snapshot.
    Reparse,
}

#[derive(Subcommand, Debug)]
enum LookupCommand {
    Tables,
    Columns { table: String },
    Definitions {
        #[arg(long, default_value = "")]
        service: String,
    },
    Search { keyword: String },
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), EngineError> {
    let cli = Cli::parse();
    let config = NetscopeConfig::load(cli.config.as_deref())?;
    init_tracing(&config.logging)?;

    let workbench = Workbench::open(&config)?;
    let result = execute(&workbench, cli.command).await;
    workbench.close();
    result
}

async fn execute(workbench: &Workbench, command: Commands) -> Result<(), EngineError> {
    match command {
        Commands::Endpoints => emit(&workbench.list_endpoints()?),
        Commands::Register {
            name,
            kind,
            url,
            credentials,
            tags,
        } => {
            let new = credentials.apply(NewEndpoint::new(name, kind, url).with_tags(tags));
            emit(&workbench.register_endpoint(new)?)
        }
        Commands::Delete { endpoint_id } => {
            workbench.delete_endpoint(&endpoint_id)?;
            emit(&serde_json::json!({ "deleted": endpoint_id }))
        }
        Commands::Test { endpoint_id } => emit(&workbench.test_connection(&endpoint_id).await?),
        Commands::Probe {
            kind,
            url,
            credentials,
        } => {
            let target = credentials.apply(NewEndpoint::new("probe", kind, url));
            emit(&workbench.probe_connection(target).await)
        }
        Commands::Run {
            endpoint_id,
            method,
            path,
            body,
            timeout_ms,
        } => {
            let mut request = ApiRequest::new(endpoint_id, method, path);
            if let Some(body) = body {
                request = request.with_body(serde_json::from_str(&body)?);
            }
            if let Some(timeout_ms) = timeout_ms {
                request = request.with_timeout_ms(timeout_ms);
            }
            emit(&workbench.execute(request).await?)
        }
        Commands::Discover { endpoint_id } => emit(&workbench.discover(&endpoint_id).await?),
        Commands::Devices { endpoint_id } => emit(&workbench.list_devices(&endpoint_id).await?),
        Commands::Events { endpoint_id } => emit(&workbench.list_events(&endpoint_id).await?),
        Commands::QueryLog { endpoint_id } => match endpoint_id {
            Some(id) => emit(&workbench.query_log_for_endpoint(&id)?),
            None => emit(&workbench.query_log()?),
        },
        Commands::Inventory => emit(&workbench.inventory()?),
        Commands::Catalog { command } => match command {
            CatalogCommand::Search { query } => emit(&workbench.search_catalog(&query)),
            CatalogCommand::Service { service } => emit(&workbench.catalog_by_service(&service)),
            CatalogCommand::Category { category } => emit(&workbench.catalog_by_category(&category)),
            CatalogCommand::Reparse => {
                let catalog = workbench.reparse_catalog()?;
                emit(&serde_json::json!({
                    "definitions": catalog.len(),
                    "lastUpdated": catalog.last_updated,
                }))
            }
        },
        Commands::Lookup { command } => match command {
            LookupCommand::Tables => emit(&workbench.lookup_tables()?),
            LookupCommand::Columns { table } => emit(&workbench.lookup_table_columns(&table)?),
            LookupCommand::Definitions { service } => {
                emit(&workbench.lookup_definitions_by_service(&service)?)
            }
            LookupCommand::Search { keyword } => emit(&workbench.lookup_search(&keyword)?),
        },
    }
}

fn emit<T: Serialize + ?Sized>(value: &T) -> Result<(), EngineError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
