//! # Structured Logging
//!
//! Subscriber setup and span helpers built on the tracing ecosystem.

use tracing_subscriber::{fmt, EnvFilter};

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human readable single-line output
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

impl LogFormat {
    /// Parse the configured format, falling back to pretty output
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LogFormat::Pretty => "pretty",
            LogFormat::Json => "json",
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: LogFormat::Pretty }
    }
}

impl LoggingConfig {
    /// Config for the CLI: `debug` when verbose, `info` otherwise
    pub fn for_cli(verbose: bool, format: LogFormat) -> Self {
        let level = if verbose { "debug" } else { "info" };
        Self { level: level.to_string(), format }
    }
}

/// Install the global tracing subscriber.
///
/// Returns `false` when a subscriber was already installed (e.g. by a test
/// harness); that case is not an error.
pub fn init_logging(config: &LoggingConfig) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let result = match config.format {
        LogFormat::Pretty => tracing::subscriber::set_global_default(
            fmt().with_env_filter(filter).with_target(false).with_writer(std::io::stderr).finish(),
        ),
        LogFormat::Json => tracing::subscriber::set_global_default(
            fmt().json().with_env_filter(filter).with_writer(std::io::stderr).finish(),
        ),
    };

    result.is_ok()
}

/// Create a tracing span around one backend request.
///
/// ```rust,ignore
/// let span = api_span!("GET", "/api/cert/list");
/// ```
#[macro_export]
macro_rules! api_span {
    ($method:expr, $path:expr) => {
        tracing::info_span!(
            "api_request",
            method = %$method,
            path = %$path,
            request_id = %uuid::Uuid::new_v4()
        )
    };
    ($method:expr, $path:expr, $($field:tt)*) => {
        tracing::info_span!(
            "api_request",
            method = %$method,
            path = %$path,
            request_id = %uuid::Uuid::new_v4(),
            $($field)*
        )
    };
}

/// Create a tracing span for one provisioning run
#[macro_export]
macro_rules! workflow_span {
    ($host:expr, $origin:expr) => {
        tracing::info_span!(
            "provision",
            host = %$host,
            origin = %$origin,
            run_id = %uuid::Uuid::new_v4()
        )
    };
}
