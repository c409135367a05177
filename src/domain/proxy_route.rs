//! Reverse proxy route domain types

use serde::Serialize;

/// A reverse proxy route as seen in one listing snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProxyRouteRecord {
    /// Public hostname or IP clients use; unique key
    pub domain: String,

    /// Upstream origin; `None` when the backend could not read it from the config
    pub proxy_target: Option<String>,

    /// Identifier of the certificate securing the route
    pub certificate_ref: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_path: Option<String>,
}

impl ProxyRouteRecord {
    /// Build a record from the listing shape.
    ///
    /// The listing does not echo the certificate reference back; routes created
    /// by this client always use the host name as certificate name, so that is
    /// the assumed default.
    pub fn new(
        domain: impl Into<String>,
        proxy_target: Option<String>,
        certificate_ref: Option<String>,
        config_path: Option<String>,
    ) -> Self {
        let domain = domain.into();
        let certificate_ref = certificate_ref
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| domain.clone());
        Self { domain, proxy_target, certificate_ref, config_path }
    }
}

/// Service health derived from the status probe. Purely informational.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    #[default]
    Unknown,
    Running,
    Stopped,
    Error,
}

impl ServiceStatus {
    /// Map the backend's `status` string
    pub fn from_probe(status: &str) -> Self {
        match status.trim() {
            "running" => ServiceStatus::Running,
            "stopped" => ServiceStatus::Stopped,
            _ => ServiceStatus::Error,
        }
    }
}

impl std::fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ServiceStatus::Unknown => "unknown",
            ServiceStatus::Running => "running",
            ServiceStatus::Stopped => "stopped",
            ServiceStatus::Error => "error",
        };
        f.write_str(s)
    }
}
