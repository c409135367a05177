//! Configuration file handling for the SSLinker CLI
//!
//! Manages loading and saving CLI configuration from ~/.sslinker/config.toml
//! and resolving connection settings from flags, the file and the environment.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::client::http::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
use crate::observability::LogFormat;

pub const BASE_URL_ENV: &str = "SSLINKER_BASE_URL";
pub const TIMEOUT_ENV: &str = "SSLINKER_TIMEOUT";
pub const DOWNLOAD_DIR_ENV: &str = "SSLINKER_DOWNLOAD_DIR";

/// Keys accepted by `sslinker config set`
pub const CONFIG_KEYS: &[&str] = &["base_url", "timeout", "download_dir", "log_format"];

/// CLI configuration stored in ~/.sslinker/config.toml
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliConfig {
    /// Base URL of the SSLinker backend
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Request timeout in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    /// Where downloaded certificates are written
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_dir: Option<PathBuf>,

    /// `pretty` or `json`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_format: Option<String>,
}

impl CliConfig {
    /// Get the default configuration file path (~/.sslinker/config.toml)
    pub fn config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .context("Unable to determine home directory")?;

        let mut path = PathBuf::from(home);
        path.push(".sslinker");
        path.push("config.toml");

        Ok(path)
    }

    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_path()?)
    }

    /// Load configuration from a specific path; a missing file yields defaults
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Save configuration to the default path
    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::config_path()?)
    }

    /// Save configuration to a specific path
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Update one key from its string form
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "base_url" => {
                let url = value.trim();
                url::Url::parse(url).with_context(|| format!("Invalid base URL: '{url}'"))?;
                self.base_url = Some(url.trim_end_matches('/').to_string());
            }
            "timeout" => {
                let timeout: u64 = value
                    .trim()
                    .parse()
                    .context("Invalid timeout value. Must be a number in seconds")?;
                self.timeout = Some(timeout);
            }
            "download_dir" => self.download_dir = Some(PathBuf::from(value.trim())),
            "log_format" => match value.trim() {
                "pretty" | "json" => self.log_format = Some(value.trim().to_string()),
                other => anyhow::bail!("Invalid log format '{other}'. Use 'pretty' or 'json'"),
            },
            _ => anyhow::bail!(
                "Unknown configuration key: '{}'. Valid keys: {}",
                key,
                CONFIG_KEYS.join(", ")
            ),
        }
        Ok(())
    }

    /// Remove one key so the environment or the default applies again
    pub fn unset(&mut self, key: &str) -> Result<()> {
        match key {
            "base_url" => self.base_url = None,
            "timeout" => self.timeout = None,
            "download_dir" => self.download_dir = None,
            "log_format" => self.log_format = None,
            _ => anyhow::bail!(
                "Unknown configuration key: '{}'. Valid keys: {}",
                key,
                CONFIG_KEYS.join(", ")
            ),
        }
        Ok(())
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Resolve the base URL from multiple sources
///
/// Checks sources in the following priority order:
/// 1. --base-url command line flag
/// 2. ~/.sslinker/config.toml
/// 3. SSLINKER_BASE_URL environment variable
/// 4. Default: http://localhost:8000
pub fn resolve_base_url(base_url_flag: Option<String>, config: &CliConfig) -> String {
    if let Some(url) = base_url_flag.filter(|u| !u.is_empty()) {
        debug!("Using base URL from --base-url flag: {}", url);
        return url;
    }

    if let Some(url) = config.base_url.clone().filter(|u| !u.is_empty()) {
        debug!("Using base URL from config file: {}", url);
        return url;
    }

    if let Some(url) = non_empty_env(BASE_URL_ENV) {
        debug!("Using base URL from {} environment variable: {}", BASE_URL_ENV, url);
        return url;
    }

    debug!("Using default base URL: {}", DEFAULT_BASE_URL);
    DEFAULT_BASE_URL.to_string()
}

/// Resolve the timeout from multiple sources
///
/// Checks sources in the following priority order:
/// 1. --timeout command line flag
/// 2. ~/.sslinker/config.toml
/// 3. SSLINKER_TIMEOUT environment variable
/// 4. Default: 30 seconds
pub fn resolve_timeout(timeout_flag: Option<u64>, config: &CliConfig) -> u64 {
    if let Some(timeout) = timeout_flag {
        debug!("Using timeout from --timeout flag: {} seconds", timeout);
        return timeout;
    }

    if let Some(timeout) = config.timeout {
        debug!("Using timeout from config file: {} seconds", timeout);
        return timeout;
    }

    if let Some(timeout) = non_empty_env(TIMEOUT_ENV).and_then(|v| v.trim().parse().ok()) {
        debug!("Using timeout from {} environment variable: {} seconds", TIMEOUT_ENV, timeout);
        return timeout;
    }

    debug!("Using default timeout: {} seconds", DEFAULT_TIMEOUT_SECS);
    DEFAULT_TIMEOUT_SECS
}

/// Resolve the download directory: flag, config file, SSLINKER_DOWNLOAD_DIR,
/// then the current directory.
pub fn resolve_download_dir(dir_flag: Option<PathBuf>, config: &CliConfig) -> PathBuf {
    if let Some(dir) = dir_flag {
        return dir;
    }
    if let Some(dir) = config.download_dir.clone() {
        return dir;
    }
    if let Some(dir) = non_empty_env(DOWNLOAD_DIR_ENV) {
        return PathBuf::from(dir);
    }
    PathBuf::from(".")
}

/// Log format from the config file, pretty when unset
pub fn resolve_log_format(config: &CliConfig) -> LogFormat {
    config.log_format.as_deref().map(LogFormat::parse).unwrap_or_default()
}
