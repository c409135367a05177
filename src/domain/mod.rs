//! Domain layer
//!
//! Pure domain entities for the SSLinker client with no HTTP or storage
//! dependencies. Records are snapshots of what the backend reported; derived
//! attributes (certificate category, display order, service health) are
//! computed here so every consumer agrees on them.
//!
//! ## Module Organization
//!
//! - `certificate`: certificate records, classification and ordering
//! - `proxy_route`: reverse proxy routes and proxy service health

pub mod certificate;
pub mod proxy_route;

pub use certificate::{
    display_order, is_wildcard_pattern, wildcard_covers, CertFile, CertKind, CertificateRecord,
    ROOT_CA_IDENTIFIER,
};
pub use proxy_route::{ProxyRouteRecord, ServiceStatus};
