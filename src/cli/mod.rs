//! # Command Line Interface
//!
//! Provides the `sslinker` commands: one-click provisioning, certificate and
//! route management against an SSLinker backend, and local configuration.

pub mod cert;
pub mod config;
pub mod config_cmd;
pub mod output;
pub mod provision;
pub mod route;

use clap::{Parser, Subcommand};
use std::sync::Arc;

use crate::client::{ClientConfig, SslinkerApi, SslinkerClient};
use crate::notify::Notifier;
use crate::observability::{init_logging, LoggingConfig};
use crate::registry::{CertificateRegistry, RouteRegistry};

#[derive(Parser)]
#[command(name = "sslinker")]
#[command(about = "Local CA, certificates and HTTPS reverse proxy routes for SSLinker")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Base URL of the SSLinker backend
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Directory for downloaded certificates
    #[arg(long, global = true)]
    pub download_dir: Option<std::path::PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Issue CA and certificate if needed, then create the HTTPS route
    Provision(provision::ProvisionArgs),

    /// Certificate management commands
    Cert {
        #[command(subcommand)]
        command: cert::CertCommands,
    },

    /// Reverse proxy route commands
    Route {
        #[command(subcommand)]
        command: route::RouteCommands,
    },

    /// Configuration management commands
    Config {
        #[command(subcommand)]
        command: config_cmd::ConfigCommands,
    },
}

/// Run CLI commands
pub async fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let file_config = config::CliConfig::load().unwrap_or_default();
    let log_format = config::resolve_log_format(&file_config);
    init_logging(&LoggingConfig::for_cli(cli.verbose, log_format));

    let download_dir = config::resolve_download_dir(cli.download_dir, &file_config);

    match cli.command {
        Commands::Config { command } => config_cmd::handle_config_command(command).await?,
        Commands::Provision(args) => {
            let api = create_http_client(cli.base_url, cli.timeout, cli.verbose, &file_config)?;
            provision::handle_provision(args, api, notifier(), download_dir).await?
        }
        Commands::Cert { command } => {
            let api = create_http_client(cli.base_url, cli.timeout, cli.verbose, &file_config)?;
            let registry = CertificateRegistry::new(api, notifier());
            cert::handle_cert_command(command, &registry, download_dir).await?
        }
        Commands::Route { command } => {
            let api = create_http_client(cli.base_url, cli.timeout, cli.verbose, &file_config)?;
            let routes = RouteRegistry::new(api.clone(), notifier());
            let certificates = CertificateRegistry::new(api, notifier());
            route::handle_route_command(command, &routes, &certificates).await?
        }
    }

    Ok(())
}

/// Create the HTTP client from flags, config file and environment
fn create_http_client(
    base_url: Option<String>,
    timeout: Option<u64>,
    verbose: bool,
    file_config: &config::CliConfig,
) -> anyhow::Result<Arc<dyn SslinkerApi>> {
    let base_url = config::resolve_base_url(base_url, file_config);
    let timeout = config::resolve_timeout(timeout, file_config);

    let client = SslinkerClient::new(ClientConfig { base_url, timeout, verbose })?;
    Ok(Arc::new(client))
}

fn notifier() -> Arc<dyn Notifier> {
    Arc::new(output::ConsoleNotifier)
}
