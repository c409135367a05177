//! Certificate domain types
//!
//! Certificates are owned by the backend; the client only ever sees snapshots
//! of the listing. The category of a record is never stored: it is derived
//! once per fetch by [`CertKind::classify`] so that every consumer (ordering,
//! action gating, download rules) agrees on it.

use serde::Serialize;
use std::cmp::Ordering;
use std::path::Path;

/// Identifier of the self-signed root CA record, shared with the backend
/// (which stores the pair as `SSLinker.crt` / `SSLinker.key`).
pub const ROOT_CA_IDENTIFIER: &str = "SSLinker";

/// Directory name the backend uses for imported certificates.
pub const UPLOADS_SEGMENT: &str = "uploads";

/// Derived certificate category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CertKind {
    /// The root certificate authority signing every leaf
    RootCa,
    /// Plain domain or IP certificate issued by the root CA
    Domain,
    /// Certificate issued for a wildcard pattern such as `*.lan`
    Wildcard,
    /// Certificate and key uploaded by the operator
    Imported,
}

impl CertKind {
    /// Classify a record from its identifier, upload flag and storage path.
    ///
    /// Rules are applied in order: reserved root marker, uploads area,
    /// wildcard pattern, plain domain.
    pub fn classify(identifier: &str, uploaded: bool, storage_path: Option<&str>) -> Self {
        if identifier == ROOT_CA_IDENTIFIER {
            return CertKind::RootCa;
        }
        if uploaded || storage_path.is_some_and(is_in_uploads_area) {
            return CertKind::Imported;
        }
        if is_wildcard_pattern(identifier) {
            return CertKind::Wildcard;
        }
        CertKind::Domain
    }

    /// Display rank: root first, issued leaves next, imported last
    fn rank(self) -> u8 {
        match self {
            CertKind::RootCa => 0,
            CertKind::Domain | CertKind::Wildcard => 1,
            CertKind::Imported => 2,
        }
    }

    /// Short human label
    pub fn label(self) -> &'static str {
        match self {
            CertKind::RootCa => "root CA",
            CertKind::Domain => "domain",
            CertKind::Wildcard => "wildcard",
            CertKind::Imported => "imported",
        }
    }
}

impl std::fmt::Display for CertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// True when `identifier` starts with `*.` or has a `*` label anywhere.
pub fn is_wildcard_pattern(identifier: &str) -> bool {
    identifier.starts_with("*.") || identifier.split('.').any(|label| label == "*")
}

/// True when `host` is covered by the wildcard `pattern` (single label per `*`).
pub fn wildcard_covers(pattern: &str, host: &str) -> bool {
    let pattern_labels: Vec<&str> = pattern.split('.').collect();
    let host_labels: Vec<&str> = host.split('.').collect();
    pattern_labels.len() == host_labels.len()
        && pattern_labels
            .iter()
            .zip(&host_labels)
            .all(|(p, h)| (*p == "*" && !h.is_empty()) || p.eq_ignore_ascii_case(h))
}

fn is_in_uploads_area(path: &str) -> bool {
    Path::new(path).components().any(|c| c.as_os_str() == UPLOADS_SEGMENT)
}

/// Which half of a certificate pair to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertFile {
    Cert,
    Key,
}

impl CertFile {
    /// Value of the `type` query parameter
    pub fn as_param(self) -> &'static str {
        match self {
            CertFile::Cert => "cert",
            CertFile::Key => "key",
        }
    }

    /// File extension used when saving a download
    pub fn extension(self) -> &'static str {
        match self {
            CertFile::Cert => "crt",
            CertFile::Key => "key",
        }
    }
}

/// A certificate as seen in one listing snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CertificateRecord {
    pub identifier: String,
    pub display_name: String,
    pub kind: CertKind,
    pub has_private_key: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_path: Option<String>,
}

impl CertificateRecord {
    /// Build a record, classifying it on the way in.
    pub fn new(
        identifier: impl Into<String>,
        display_name: Option<String>,
        uploaded: bool,
        has_private_key: bool,
        storage_path: Option<String>,
    ) -> Self {
        let identifier = identifier.into();
        let kind = CertKind::classify(&identifier, uploaded, storage_path.as_deref());
        let display_name =
            display_name.filter(|n| !n.trim().is_empty()).unwrap_or_else(|| identifier.clone());
        Self { identifier, display_name, kind, has_private_key, storage_path }
    }

    pub fn is_root_ca(&self) -> bool {
        self.kind == CertKind::RootCa
    }

    /// Value the backend expects in `?domain=` when deleting this record.
    ///
    /// Imported files are stored as `<name>.<ext>` so the backend matches on the
    /// bare name; everything else is keyed by identifier.
    pub fn delete_key(&self) -> &str {
        match self.kind {
            CertKind::Imported => &self.display_name,
            _ => &self.identifier,
        }
    }

    /// Value used in `?domain=` for downloads.
    pub fn download_key(&self) -> &str {
        match (self.kind, self.storage_path.as_deref()) {
            (CertKind::Imported, Some(path)) => path,
            _ => &self.identifier,
        }
    }

    /// Suggested file name for a download of `file`
    pub fn download_file_name(&self, file: CertFile) -> String {
        format!("{}.{}", self.display_name, file.extension())
    }
}

/// Deterministic display order: root CA, issued leaves by identifier, imported.
pub fn display_order(a: &CertificateRecord, b: &CertificateRecord) -> Ordering {
    a.kind.rank().cmp(&b.kind.rank()).then_with(|| a.identifier.cmp(&b.identifier))
}
