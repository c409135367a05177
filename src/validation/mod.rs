//! # Validation Module
//!
//! Client-side validators shared by the provisioning workflow, the registries
//! and the CLI. Everything here runs before a request is sent; a rejection
//! means nothing reached the backend.

use regex::Regex;
use std::net::IpAddr;
use std::sync::LazyLock;
use url::Url;

use crate::errors::{Result, SslinkerError};

/// Scheme prefix such as `http://`, `https://` or `ftp://`
static SCHEME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.-]*://").expect("valid scheme regex"));

/// DNS host name, optionally a leading `*.` wildcard label
static HOSTNAME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(\*\.)?[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?(\.[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*$",
    )
    .expect("valid hostname regex")
});

/// Scheme used when the operator omits one
pub const DEFAULT_SCHEME: &str = "http";

/// Normalize a proxy target so it always carries an explicit scheme.
///
/// Targets that already start with `<scheme>://` are kept as supplied; anything
/// else gets `http://` prepended. The result must parse as a URL with a host.
pub fn normalize_origin(input: &str) -> Result<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(SslinkerError::validation_field("Proxy target must not be empty", "proxy_target"));
    }

    let candidate = if SCHEME_REGEX.is_match(trimmed) {
        trimmed.to_string()
    } else {
        format!("{DEFAULT_SCHEME}://{trimmed}")
    };

    match Url::parse(&candidate) {
        Ok(url) if url.host_str().is_some_and(|h| !h.is_empty()) => Ok(candidate),
        _ => Err(SslinkerError::validation_field(
            format!("Proxy target '{trimmed}' is not a valid URL"),
            "proxy_target",
        )),
    }
}

/// Host part of a normalized origin, without scheme, port or path.
pub fn bare_host(origin: &str) -> Option<String> {
    let url = Url::parse(origin).ok()?;
    let host = url.host_str()?;
    // IPv6 hosts come back bracketed
    Some(host.trim_start_matches('[').trim_end_matches(']').to_string())
}

/// True when `value` parses as an IPv4 or IPv6 address
pub fn is_ip(value: &str) -> bool {
    value.trim().parse::<IpAddr>().is_ok()
}

/// Validate a concrete public host name or IP for a route.
pub fn validate_route_host(host: &str) -> Result<String> {
    let host = host.trim();
    if host.is_empty() {
        return Err(SslinkerError::validation_field("Host must not be empty", "host"));
    }
    if is_ip(host) {
        return Ok(host.to_string());
    }
    if host.contains('*') || !HOSTNAME_REGEX.is_match(host) {
        return Err(SslinkerError::validation_field(
            format!("'{host}' is not a valid host name or IP address"),
            "host",
        ));
    }
    Ok(host.to_string())
}

/// Validate a certificate identifier for issuance.
///
/// The backend uses it as a file name, so it must be non-empty and free of
/// whitespace and path separators. Wildcards are allowed.
pub fn validate_cert_identifier(identifier: &str) -> Result<String> {
    let identifier = identifier.trim();
    if identifier.is_empty() {
        return Err(SslinkerError::validation_field("Domain must not be empty", "domain"));
    }
    if identifier.chars().any(|c| c.is_whitespace() || c == '/' || c == '\\') {
        return Err(SslinkerError::validation_field(
            format!("'{identifier}' contains whitespace or path separators"),
            "domain",
        ));
    }
    Ok(identifier.to_string())
}

/// Parse an optional comma separated list of IP addresses.
///
/// Blank entries are ignored; any other entry must be a valid address.
pub fn parse_ip_list(input: &str) -> Result<Vec<IpAddr>> {
    input
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            entry.parse::<IpAddr>().map_err(|_| {
                SslinkerError::validation_field(format!("Invalid IP address: '{entry}'"), "ip")
            })
        })
        .collect()
}

/// Validate the operator's local network address used in hosts exports.
pub fn validate_local_addr(addr: &str) -> Result<String> {
    let addr = addr.trim();
    if addr.is_empty() {
        return Err(SslinkerError::validation_field(
            "Local address is not set; configure it before exporting hosts entries",
            "local_addr",
        ));
    }
    if !is_ip(addr) && !HOSTNAME_REGEX.is_match(addr) {
        return Err(SslinkerError::validation_field(
            format!("'{addr}' is not a valid IP address or host name"),
            "local_addr",
        ));
    }
    Ok(addr.to_string())
}
