//! Proxy route registry
//!
//! Cached view of `GET /api/nginx/list` together with route creation, editing
//! (delete then recreate), batch deletion, service control and hosts file
//! export.

use serde::Serialize;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

use super::{lock, settle};
use crate::busy::InFlight;
use crate::client::dto::{CreateRouteRequest, RouteEntry};
use crate::client::{ServiceAction, SslinkerApi};
use crate::domain::{wildcard_covers, CertKind, CertificateRecord, ProxyRouteRecord, ServiceStatus};
use crate::errors::{Result, SslinkerError};
use crate::notify::{Notice, Notifier};
use crate::validation::{normalize_origin, validate_local_addr, validate_route_host};

/// Opens the Windows hosts file in an elevated Notepad
pub const WINDOWS_HOSTS_COMMAND: &str = r#"powershell.exe -Command "Start-Process -FilePath notepad.exe -Verb RunAs -ArgumentList \"$env:SystemRoot\system32\drivers\etc\hosts\"""#;

/// Unvalidated route form input
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteDraft {
    pub certificate_ref: String,
    /// Public host; required unless the certificate is a plain domain one
    pub domain: Option<String>,
    pub proxy_target: String,
}

impl RouteDraft {
    pub fn new(
        certificate_ref: impl Into<String>,
        domain: Option<String>,
        proxy_target: impl Into<String>,
    ) -> Self {
        Self { certificate_ref: certificate_ref.into(), domain, proxy_target: proxy_target.into() }
    }

    /// Pre-fill a draft from an existing route
    pub fn from_record(record: &ProxyRouteRecord) -> Self {
        Self {
            certificate_ref: record.certificate_ref.clone(),
            domain: Some(record.domain.clone()),
            proxy_target: record.proxy_target.clone().unwrap_or_default(),
        }
    }

    /// Validate the draft against the certificate listing and build the request.
    ///
    /// A plain domain certificate fixes the host to its identifier. Wildcard and
    /// imported certificates need an explicit host; a wildcard host must match
    /// the pattern.
    pub fn resolve(&self, certificates: &[CertificateRecord]) -> Result<CreateRouteRequest> {
        let cert_ref = self.certificate_ref.trim();
        if cert_ref.is_empty() {
            return Err(SslinkerError::validation_field("A certificate is required", "certificate"));
        }
        let certificate =
            certificates.iter().find(|c| c.identifier == cert_ref).ok_or_else(|| {
                SslinkerError::validation_field(
                    format!("Certificate '{cert_ref}' not found"),
                    "certificate",
                )
            })?;

        let domain = match certificate.kind {
            CertKind::RootCa => {
                return Err(SslinkerError::validation_field(
                    "The root CA cannot secure a route",
                    "certificate",
                ))
            }
            CertKind::Domain => validate_route_host(&certificate.identifier)?,
            CertKind::Wildcard | CertKind::Imported => {
                let explicit = self
                    .domain
                    .as_deref()
                    .map(str::trim)
                    .filter(|d| !d.is_empty())
                    .ok_or_else(|| {
                        SslinkerError::validation_field(
                            format!("A host name is required for {} certificates", certificate.kind),
                            "domain",
                        )
                    })?;
                let host = validate_route_host(explicit)?;
                if certificate.kind == CertKind::Wildcard
                    && !wildcard_covers(&certificate.identifier, &host)
                {
                    return Err(SslinkerError::validation_field(
                        format!("'{host}' is not covered by '{}'", certificate.identifier),
                        "domain",
                    ));
                }
                host
            }
        };

        Ok(CreateRouteRequest {
            cert_domain: certificate.identifier.clone(),
            server_name: domain,
            proxy_pass: normalize_origin(&self.proxy_target)?,
        })
    }
}

/// One failed entry of a batch action
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchFailure {
    pub domain: String,
    pub message: String,
}

/// Aggregated result of a sequential batch action
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchOutcome {
    pub succeeded: Vec<String>,
    pub failures: Vec<BatchFailure>,
}

impl BatchOutcome {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Single operator-facing summary of the batch
    pub fn message(&self) -> String {
        let total = self.succeeded.len() + self.failures.len();
        if self.failures.is_empty() {
            return format!("Deleted {total} route(s)");
        }
        let details: Vec<String> =
            self.failures.iter().map(|f| format!("{}: {}", f.domain, f.message)).collect();
        format!(
            "Deleted {} of {} route(s); {} failed ({})",
            self.succeeded.len(),
            total,
            self.failures.len(),
            details.join("; ")
        )
    }
}

/// Result of a reload, start or stop request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceOutcome {
    pub action: &'static str,
    pub message: String,
}

/// Build hosts file lines for `domains`, all of which must be known routes.
pub fn hosts_lines(
    local_addr: Option<&str>,
    domains: &[String],
    routes: &[ProxyRouteRecord],
) -> Result<Vec<String>> {
    let addr = validate_local_addr(local_addr.unwrap_or_default())?;
    if domains.is_empty() {
        return Err(SslinkerError::validation("Select at least one route to export"));
    }
    domains
        .iter()
        .map(|domain| {
            if routes.iter().any(|r| &r.domain == domain) {
                Ok(format!("{addr} {domain}"))
            } else {
                Err(SslinkerError::validation_field(format!("Route '{domain}' not found"), "domain"))
            }
        })
        .collect()
}

pub struct RouteRegistry {
    api: Arc<dyn SslinkerApi>,
    notifier: Arc<dyn Notifier>,
    routes: Mutex<Vec<ProxyRouteRecord>>,
    local_addr: Mutex<Option<String>>,
    status: Mutex<ServiceStatus>,
    saving: InFlight,
    deleting: InFlight,
    service: InFlight,
    addressing: InFlight,
}

impl RouteRegistry {
    pub fn new(api: Arc<dyn SslinkerApi>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            api,
            notifier,
            routes: Mutex::new(Vec::new()),
            local_addr: Mutex::new(None),
            status: Mutex::new(ServiceStatus::Unknown),
            saving: InFlight::new("save route"),
            deleting: InFlight::new("delete routes"),
            service: InFlight::new("service control"),
            addressing: InFlight::new("save local address"),
        }
    }

    pub fn routes(&self) -> Vec<ProxyRouteRecord> {
        lock(&self.routes).clone()
    }

    pub fn get(&self, domain: &str) -> Option<ProxyRouteRecord> {
        lock(&self.routes).iter().find(|r| r.domain == domain).cloned()
    }

    /// Last known local address, if the backend has one stored
    pub fn local_addr(&self) -> Option<String> {
        lock(&self.local_addr).clone()
    }

    /// Last probed service status
    pub fn status(&self) -> ServiceStatus {
        *lock(&self.status)
    }

    /// Reload routes and the stored local address.
    pub async fn refresh(&self) -> Result<Vec<ProxyRouteRecord>> {
        let listing = match self.api.list_routes().await {
            Ok(listing) => listing,
            Err(e) => {
                warn!(error = %e, "Failed to load routes");
                self.notifier.notify(Notice::error(e.notice_message()));
                return Err(e);
            }
        };

        let mut routes: Vec<ProxyRouteRecord> =
            listing.configs.into_iter().map(RouteEntry::into_record).collect();
        routes.sort_by(|a, b| a.domain.cmp(&b.domain));
        debug!(count = routes.len(), "Route listing refreshed");

        *lock(&self.local_addr) = listing.local_addr.filter(|a| !a.trim().is_empty());
        *lock(&self.routes) = routes.clone();
        Ok(routes)
    }

    async fn refresh_after_action(&self) {
        let _ = self.refresh().await;
    }

    /// Create a route from `draft`, validated against `certificates`.
    pub async fn create(
        &self,
        draft: &RouteDraft,
        certificates: &[CertificateRecord],
    ) -> Result<String> {
        let request = draft.resolve(certificates)?;
        let _guard = self.saving.acquire()?;
        info!(domain = %request.server_name, proxy_pass = %request.proxy_pass, "Creating route");
        let message = settle(&*self.notifier, "create route", self.api.create_route(&request).await)?;
        self.refresh_after_action().await;
        Ok(message)
    }

    /// Replace the route `original_domain` with `draft`.
    ///
    /// The draft is validated before anything is removed. If the recreate fails
    /// the original route is already gone; the error says so.
    pub async fn edit(
        &self,
        original_domain: &str,
        draft: &RouteDraft,
        certificates: &[CertificateRecord],
    ) -> Result<String> {
        let request = draft.resolve(certificates)?;
        if self.get(original_domain).is_none() {
            return Err(SslinkerError::validation(format!("Route '{original_domain}' not found")));
        }

        let _guard = self.saving.acquire()?;
        info!(from = %original_domain, to = %request.server_name, "Editing route");
        settle(&*self.notifier, "remove original route", self.api.delete_route(original_domain).await)?;

        let created = settle(&*self.notifier, "create route", self.api.create_route(&request).await);
        self.refresh_after_action().await;
        created.map_err(|e| match e {
            SslinkerError::Backend { message, status } => SslinkerError::Backend {
                message: format!("{message} (route '{original_domain}' was removed)"),
                status,
            },
            other => other,
        })
    }

    /// Delete one route.
    pub async fn delete(&self, domain: &str) -> Result<String> {
        let _guard = self.deleting.acquire()?;
        let message = settle(&*self.notifier, "delete route", self.api.delete_route(domain).await)?;
        self.refresh_after_action().await;
        Ok(message)
    }

    /// Delete `domains` one after another and aggregate the results.
    ///
    /// Individual failures do not stop the batch; the listing is refreshed once
    /// at the end either way.
    pub async fn delete_many(&self, domains: &[String]) -> Result<BatchOutcome> {
        if domains.is_empty() {
            return Err(SslinkerError::validation("No routes selected"));
        }
        let _guard = self.deleting.acquire()?;

        let mut outcome = BatchOutcome::default();
        for domain in domains {
            match self.api.delete_route(domain).await.and_then(|r| r.into_result()) {
                Ok(_) => outcome.succeeded.push(domain.clone()),
                Err(e) => {
                    warn!(domain = %domain, error = %e, "Route delete failed");
                    outcome
                        .failures
                        .push(BatchFailure { domain: domain.clone(), message: e.notice_message() });
                }
            }
        }

        let message = outcome.message();
        if outcome.is_complete() {
            info!(count = outcome.succeeded.len(), "Routes deleted");
            self.notifier.notify(Notice::success(message));
        } else {
            self.notifier.notify(Notice::error(message));
        }
        self.refresh_after_action().await;
        Ok(outcome)
    }

    /// `POST /api/nginx/reload`
    pub async fn reload(&self) -> Result<ServiceOutcome> {
        self.control(ServiceAction::Reload).await
    }

    /// `POST /api/nginx/start`
    pub async fn start(&self) -> Result<ServiceOutcome> {
        self.control(ServiceAction::Start).await
    }

    /// `POST /api/nginx/stop`
    pub async fn stop(&self) -> Result<ServiceOutcome> {
        self.control(ServiceAction::Stop).await
    }

    async fn control(&self, action: ServiceAction) -> Result<ServiceOutcome> {
        let _guard = self.service.acquire()?;
        let message = settle(&*self.notifier, action.name(), self.api.service_action(action).await)?;
        if action != ServiceAction::Reload {
            self.probe_status().await;
        }
        Ok(ServiceOutcome { action: action.name(), message })
    }

    /// Probe the service. Transport failures yield [`ServiceStatus::Unknown`].
    pub async fn probe_status(&self) -> ServiceStatus {
        let status = match self.api.service_status().await {
            Ok(response) => ServiceStatus::from_probe(&response.status),
            Err(e) => {
                debug!(error = %e, "Status probe failed");
                ServiceStatus::Unknown
            }
        };
        *lock(&self.status) = status;
        status
    }

    /// `GET /api/nginx/local_addr`
    pub async fn fetch_local_addr(&self) -> Result<Option<String>> {
        let response = self.api.get_local_addr().await?;
        let addr = Some(response.local_addr.trim().to_string()).filter(|a| !a.is_empty());
        *lock(&self.local_addr) = addr.clone();
        Ok(addr)
    }

    /// Store the operator's local address on the backend.
    pub async fn set_local_addr(&self, addr: &str) -> Result<String> {
        let addr = validate_local_addr(addr)?;
        let _guard = self.addressing.acquire()?;
        match self.api.set_local_addr(&addr).await {
            Ok(response) => {
                let stored = if response.local_addr.trim().is_empty() { addr } else { response.local_addr };
                info!(local_addr = %stored, "Local address saved");
                self.notifier.notify(Notice::success(format!("Local address set to {stored}")));
                *lock(&self.local_addr) = Some(stored.clone());
                Ok(stored)
            }
            Err(e) => {
                warn!(error = %e, "Failed to save local address");
                self.notifier.notify(Notice::error(e.notice_message()));
                Err(e)
            }
        }
    }

    /// Hosts lines for `domains`; `local_addr` overrides the cached address.
    pub fn hosts_export(&self, domains: &[String], local_addr: Option<&str>) -> Result<Vec<String>> {
        let cached = self.local_addr();
        let addr = local_addr.or(cached.as_deref());
        hosts_lines(addr, domains, &self.routes())
    }
}
