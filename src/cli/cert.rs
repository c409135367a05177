//! Certificate CLI commands
//!
//! Thin layer over [`CertificateRegistry`]: every command refreshes the
//! listing first so guards (root CA protection, unknown identifiers) see the
//! backend's current state.

use anyhow::Result;
use clap::{Subcommand, ValueEnum};
use std::path::PathBuf;

use super::output::{self, confirm};
use crate::artifact::DirectorySink;
use crate::domain::{CertFile, ROOT_CA_IDENTIFIER};
use crate::registry::CertificateRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FileArg {
    Cert,
    Key,
    Both,
}

#[derive(Subcommand)]
pub enum CertCommands {
    /// List certificates (root CA first, imported last)
    List {
        /// Output format (json, yaml, or table)
        #[arg(short, long, default_value = "table")]
        output: String,
    },

    /// Generate the root CA (no-op when it already exists)
    Ca,

    /// Issue a certificate signed by the root CA
    Issue {
        /// Domain, wildcard pattern (*.home.lan) or IP address
        domain: String,

        /// Extra IP addresses for the SAN, comma separated
        #[arg(long, default_value = "")]
        ip: String,
    },

    /// Upload an existing certificate and private key
    Upload {
        /// Certificate file (.crt, .pem or .cer)
        cert: PathBuf,

        /// Private key file (.key)
        key: PathBuf,

        /// Display name; defaults to the certificate file name
        #[arg(long)]
        name: Option<String>,
    },

    /// Delete one or more certificates
    Delete {
        /// Certificate identifiers
        #[arg(required = true)]
        identifiers: Vec<String>,

        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Delete every certificate, root CA included
    Clear {
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Download a certificate and/or its key
    Download {
        /// Certificate identifier
        identifier: String,

        /// Which file to fetch
        #[arg(long, value_enum, default_value = "cert")]
        file: FileArg,

        /// Target directory (defaults to the configured download directory)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

/// Handle certificate commands
pub async fn handle_cert_command(
    command: CertCommands,
    registry: &CertificateRegistry,
    download_dir: PathBuf,
) -> Result<()> {
    registry.refresh().await?;

    match command {
        CertCommands::List { output } => {
            let records = registry.records();
            if output == "table" {
                output::print_certificates_table(&records);
            } else {
                output::print_output(&records, &output)?;
            }
        }
        CertCommands::Ca => {
            registry.issue_root_ca().await?;
        }
        CertCommands::Issue { domain, ip } => {
            registry.issue_domain(&domain, &ip).await?;
        }
        CertCommands::Upload { cert, key, name } => {
            registry.upload(&cert, &key, name.as_deref()).await?;
        }
        CertCommands::Delete { identifiers, yes } => {
            delete_certificates(registry, &identifiers, yes).await?
        }
        CertCommands::Clear { yes } => {
            let count = registry.records().len();
            if confirm(&format!("Delete all {count} certificate(s), root CA included?"), yes)? {
                registry.clear_all().await?;
            }
        }
        CertCommands::Download { identifier, file, dir } => {
            let sink = DirectorySink::new(dir.unwrap_or(download_dir));
            let stored = match file {
                FileArg::Cert => vec![registry.download(&identifier, CertFile::Cert, &sink).await?],
                FileArg::Key => vec![registry.download(&identifier, CertFile::Key, &sink).await?],
                FileArg::Both => registry.download_bundle(&identifier, &sink).await?,
            };
            for location in stored {
                println!("Saved {}", location);
            }
        }
    }

    Ok(())
}

async fn delete_certificates(
    registry: &CertificateRegistry,
    identifiers: &[String],
    yes: bool,
) -> Result<()> {
    // The root CA only goes through the selection, where it means a full wipe.
    if let [identifier] = identifiers {
        if identifier.as_str() == ROOT_CA_IDENTIFIER {
            return delete_selection(registry, identifiers, yes).await;
        }
        if confirm(&format!("Delete certificate '{identifier}'?"), yes)? {
            registry.delete(identifier).await?;
        }
        return Ok(());
    }
    delete_selection(registry, identifiers, yes).await
}

async fn delete_selection(
    registry: &CertificateRegistry,
    identifiers: &[String],
    yes: bool,
) -> Result<()> {
    registry.clear_selection();
    for identifier in identifiers {
        registry.select(identifier)?;
    }
    if !registry.can_delete_selection() {
        anyhow::bail!("The root CA can only be deleted together with every other certificate");
    }
    if confirm(&format!("Delete {} certificate(s)?", identifiers.len()), yes)? {
        registry.delete_selected().await?;
    }
    Ok(())
}
