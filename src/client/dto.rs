//! Wire shapes exchanged with the SSLinker backend
//!
//! These mirror the backend's JSON exactly; conversion into domain records
//! happens here so the rest of the crate never sees raw listing entries.

use serde::{Deserialize, Serialize};

use crate::domain::{CertificateRecord, ProxyRouteRecord};
use crate::errors::{Result, SslinkerError};

/// `{ success, message }` envelope returned by every mutating endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ActionResponse {
    #[serde(default)]
    pub success: bool,

    #[serde(default)]
    pub message: String,

    /// Secondary failures reported alongside a successful delete
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl ActionResponse {
    pub fn ok<S: Into<String>>(message: S) -> Self {
        Self { success: true, message: message.into(), errors: Vec::new() }
    }

    pub fn failed<S: Into<String>>(message: S) -> Self {
        Self { success: false, message: message.into(), errors: Vec::new() }
    }

    /// Turn `success: false` into a backend error carrying the message verbatim.
    pub fn into_result(self) -> Result<String> {
        if self.success {
            Ok(self.message)
        } else if self.message.is_empty() {
            Err(SslinkerError::backend("Backend reported a failure without a message"))
        } else {
            Err(SslinkerError::backend(self.message))
        }
    }
}

/// One entry of `GET /api/cert/list`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CertEntry {
    pub domain: String,

    /// Backend's own category label; informative only
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crt: Option<String>,

    /// Key file name or path; `null` when no private key is stored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default)]
    pub uploaded: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl CertEntry {
    pub fn into_record(self) -> CertificateRecord {
        let has_key = self.key.as_deref().is_some_and(|k| !k.is_empty());
        CertificateRecord::new(self.domain, self.name, self.uploaded, has_key, self.path)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CertListResponse {
    #[serde(default)]
    pub certs: Vec<CertEntry>,
}

/// Body of `POST /api/cert/delete` for batch removal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteCertsRequest {
    pub domains: Vec<String>,
}

/// Files for `POST /api/cert/upload`
#[derive(Debug, Clone)]
pub struct CertUpload {
    pub cert_file_name: String,
    pub cert_pem: Vec<u8>,
    pub key_file_name: String,
    pub key_pem: Vec<u8>,
    pub name: Option<String>,
}

/// One entry of `GET /api/nginx/list`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RouteEntry {
    pub domain: String,

    #[serde(default)]
    pub proxy_pass: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cert_domain: Option<String>,
}

impl RouteEntry {
    pub fn into_record(self) -> ProxyRouteRecord {
        ProxyRouteRecord::new(self.domain, self.proxy_pass, self.cert_domain, self.config_path)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RouteListResponse {
    #[serde(default)]
    pub configs: Vec<RouteEntry>,

    #[serde(default)]
    pub local_addr: Option<String>,
}

/// Body of `POST /api/nginx/config`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateRouteRequest {
    pub cert_domain: String,
    pub server_name: String,
    pub proxy_pass: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocalAddrResponse {
    #[serde(default)]
    pub local_addr: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalAddrRequest {
    pub local_addr: String,
}

/// FastAPI error body: `{ "detail": "..." }` (or a list for 422s)
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorDetail {
    pub detail: serde_json::Value,
}

impl ErrorDetail {
    pub(crate) fn message(&self) -> String {
        match &self.detail {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}
