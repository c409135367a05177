//! `sslinker config` subcommands
//!
//! Edits ~/.sslinker/config.toml and reports the settings that commands will
//! actually run with once flags, the file and the environment are merged.

use anyhow::Result;
use clap::Subcommand;
use serde::Serialize;
use std::path::PathBuf;

use super::config::{self, CliConfig, CONFIG_KEYS};
use super::output;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Write an empty configuration file
    Init {
        /// Replace an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Show effective settings and where the file lives
    Show {
        /// Output format (json, yaml, or table)
        #[arg(short, long, default_value = "table")]
        output: String,
    },

    /// Store a value (base_url, timeout, download_dir, log_format)
    Set { key: String, value: String },

    /// Remove a stored value so the environment or default applies
    Unset { key: String },

    /// Print the configuration file path
    Path,
}

/// Settings after merging the file with environment and defaults
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EffectiveSettings {
    pub base_url: String,
    pub timeout_secs: u64,
    pub download_dir: PathBuf,
    pub log_format: &'static str,
    /// Keys present in the config file
    pub from_file: Vec<&'static str>,
}

impl EffectiveSettings {
    pub fn resolve(file: &CliConfig) -> Self {
        let mut from_file = Vec::new();
        if file.base_url.is_some() {
            from_file.push("base_url");
        }
        if file.timeout.is_some() {
            from_file.push("timeout");
        }
        if file.download_dir.is_some() {
            from_file.push("download_dir");
        }
        if file.log_format.is_some() {
            from_file.push("log_format");
        }

        Self {
            base_url: config::resolve_base_url(None, file),
            timeout_secs: config::resolve_timeout(None, file),
            download_dir: config::resolve_download_dir(None, file),
            log_format: config::resolve_log_format(file).as_str(),
            from_file,
        }
    }
}

pub async fn handle_config_command(command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Init { force } => init_config(force)?,
        ConfigCommands::Show { output } => show_config(&output)?,
        ConfigCommands::Set { key, value } => {
            let mut file = CliConfig::load()?;
            file.set(&key, &value)?;
            file.save()?;
            println!("✅ {key} = {}", value.trim());
        }
        ConfigCommands::Unset { key } => {
            let mut file = CliConfig::load()?;
            file.unset(&key)?;
            file.save()?;
            println!("✅ {key} removed from {}", CliConfig::config_path()?.display());
        }
        ConfigCommands::Path => println!("{}", CliConfig::config_path()?.display()),
    }

    Ok(())
}

fn init_config(force: bool) -> Result<()> {
    let path = CliConfig::config_path()?;
    if path.exists() && !force {
        anyhow::bail!("{} already exists (use --force to replace it)", path.display());
    }

    CliConfig::default().save()?;
    println!("✅ Created {}", path.display());
    println!("Keys: {}", CONFIG_KEYS.join(", "));
    Ok(())
}

fn show_config(output_format: &str) -> Result<()> {
    let path = CliConfig::config_path()?;
    let settings = EffectiveSettings::resolve(&CliConfig::load()?);

    if output_format != "table" {
        return output::print_output(&settings, output_format);
    }

    output::print_table_header(&[("Key", 15), ("Value", 45), ("Source", 8)]);
    let source = |key: &str| {
        if settings.from_file.iter().any(|k| *k == key) {
            "file"
        } else {
            "env/default"
        }
    };
    println!("{:<15} {:<45} {}", "base_url", settings.base_url, source("base_url"));
    println!("{:<15} {:<45} {}", "timeout", format!("{}s", settings.timeout_secs), source("timeout"));
    println!(
        "{:<15} {:<45} {}",
        "download_dir",
        settings.download_dir.display(),
        source("download_dir")
    );
    println!("{:<15} {:<45} {}", "log_format", settings.log_format, source("log_format"));
    println!();
    println!("Config file: {}{}", path.display(), if path.exists() { "" } else { " (not created)" });
    Ok(())
}
