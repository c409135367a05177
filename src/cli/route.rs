//! Proxy route CLI commands
//!
//! Provides command-line interface for managing nginx reverse proxy routes,
//! the proxy service and hosts file entries.

use anyhow::Result;
use clap::Subcommand;

use super::output::{self, confirm};
use crate::registry::{CertificateRegistry, RouteDraft, RouteRegistry, WINDOWS_HOSTS_COMMAND};

#[derive(Subcommand)]
pub enum RouteCommands {
    /// List all routes
    List {
        /// Output format (json, yaml, or table)
        #[arg(short, long, default_value = "table")]
        output: String,
    },

    /// Create a route secured by an existing certificate
    Create {
        /// Certificate identifier
        #[arg(long)]
        cert: String,

        /// Public host; required for wildcard and imported certificates
        #[arg(long)]
        domain: Option<String>,

        /// Upstream origin, e.g. 127.0.0.1:3000 or https://10.0.0.2
        #[arg(long)]
        target: String,
    },

    /// Replace a route (the original is removed, then recreated)
    Edit {
        /// Domain of the route to edit
        original: String,

        /// New certificate identifier
        #[arg(long)]
        cert: Option<String>,

        /// New public host
        #[arg(long)]
        domain: Option<String>,

        /// New upstream origin
        #[arg(long)]
        target: Option<String>,
    },

    /// Delete one or more routes
    Delete {
        /// Route domains
        #[arg(required = true)]
        domains: Vec<String>,

        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Reload the proxy service
    Reload,

    /// Start the proxy service
    Start,

    /// Stop the proxy service
    Stop,

    /// Show the proxy service status
    Status,

    /// Print hosts file entries pointing routes at this machine
    Hosts {
        /// Route domains; all routes when omitted
        domains: Vec<String>,

        /// Address to use instead of the stored local address
        #[arg(long)]
        local_addr: Option<String>,
    },

    /// Show or set the local address used for hosts entries
    LocalAddr {
        /// New address; prints the current one when omitted
        value: Option<String>,
    },
}

/// Handle route commands
pub async fn handle_route_command(
    command: RouteCommands,
    routes: &RouteRegistry,
    certificates: &CertificateRegistry,
) -> Result<()> {
    match command {
        RouteCommands::List { output } => {
            let listed = routes.refresh().await?;
            if output == "table" {
                output::print_routes_table(&listed);
            } else {
                output::print_output(&listed, &output)?;
            }
        }
        RouteCommands::Create { cert, domain, target } => {
            let certs = certificates.refresh().await?;
            routes.create(&RouteDraft::new(cert, domain, target), &certs).await?;
        }
        RouteCommands::Edit { original, cert, domain, target } => {
            routes.refresh().await?;
            let record = routes
                .get(&original)
                .ok_or_else(|| anyhow::anyhow!("Route '{}' not found", original))?;
            let mut draft = RouteDraft::from_record(&record);
            if let Some(cert) = cert {
                draft.certificate_ref = cert;
            }
            if domain.is_some() {
                draft.domain = domain;
            }
            if let Some(target) = target {
                draft.proxy_target = target;
            }
            let certs = certificates.refresh().await?;
            routes.edit(&original, &draft, &certs).await?;
        }
        RouteCommands::Delete { domains, yes } => {
            if confirm(&format!("Delete {} route(s)?", domains.len()), yes)? {
                let outcome = routes.delete_many(&domains).await?;
                if !outcome.is_complete() {
                    anyhow::bail!(outcome.message());
                }
            }
        }
        RouteCommands::Reload => {
            routes.reload().await?;
        }
        RouteCommands::Start => {
            routes.start().await?;
        }
        RouteCommands::Stop => {
            routes.stop().await?;
        }
        RouteCommands::Status => {
            println!("{}", routes.probe_status().await);
        }
        RouteCommands::Hosts { domains, local_addr } => {
            let listed = routes.refresh().await?;
            let selected = if domains.is_empty() {
                listed.into_iter().map(|r| r.domain).collect()
            } else {
                domains
            };
            let lines = routes.hosts_export(&selected, local_addr.as_deref())?;
            for line in lines {
                println!("{}", line);
            }
            eprintln!("\nAdd these lines to your hosts file. On Windows, open it with:");
            eprintln!("  {}", WINDOWS_HOSTS_COMMAND);
        }
        RouteCommands::LocalAddr { value } => match value {
            Some(addr) => {
                routes.set_local_addr(&addr).await?;
            }
            None => match routes.fetch_local_addr().await? {
                Some(addr) => println!("{}", addr),
                None => println!("<not set>"),
            },
        },
    }

    Ok(())
}
