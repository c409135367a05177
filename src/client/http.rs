//! HTTP client for the SSLinker backend
//!
//! Implements [`SslinkerApi`] on top of reqwest. Non-2xx responses are mapped
//! to [`SslinkerError::Backend`] when the body carries a readable message
//! (`detail` or `message`), and to [`SslinkerError::Request`] otherwise.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use std::net::IpAddr;
use std::time::Duration;
use tracing::{debug, trace, Instrument};

use super::dto::{
    ActionResponse, CertEntry, CertListResponse, CertUpload, CreateRouteRequest,
    DeleteCertsRequest, ErrorDetail, LocalAddrRequest, LocalAddrResponse, RouteListResponse,
    StatusResponse,
};
use super::{ServiceAction, SslinkerApi};
use crate::domain::CertFile;
use crate::errors::{Result, SslinkerError};

/// Default backend address (the FastAPI service's default port)
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the SSLinker backend (e.g., "http://localhost:8000")
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout: u64,

    /// Enable verbose request/response logging
    pub verbose: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self { base_url: DEFAULT_BASE_URL.to_string(), timeout: DEFAULT_TIMEOUT_SECS, verbose: false }
    }
}

/// Path and query of the canonical download URL for a certificate or key.
pub fn download_path(domain: &str, file: CertFile) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("type", file.as_param())
        .append_pair("domain", domain)
        .finish();
    format!("/api/cert/download?{query}")
}

/// HTTP implementation of [`SslinkerApi`]
#[derive(Debug, Clone)]
pub struct SslinkerClient {
    client: Client,
    config: ClientConfig,
}

impl SslinkerClient {
    /// Create a new client with the given configuration
    pub fn new(mut config: ClientConfig) -> Result<Self> {
        config.base_url = config.base_url.trim_end_matches('/').to_string();

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()
            .map_err(|e| SslinkerError::request_with_source("Failed to build HTTP client", e))?;

        Ok(Self { client, config })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Absolute URL for a path on the backend
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    fn get(&self, path: &str) -> RequestBuilder {
        let url = self.url(path);
        debug!("GET {}", url);
        self.client.get(url)
    }

    fn post(&self, path: &str) -> RequestBuilder {
        let url = self.url(path);
        debug!("POST {}", url);
        self.client.post(url)
    }

    fn delete(&self, path: &str) -> RequestBuilder {
        let url = self.url(path);
        debug!("DELETE {}", url);
        self.client.delete(url)
    }

    /// Send a request and deserialize the JSON response
    async fn send_json<T: DeserializeOwned>(
        &self,
        method: &'static str,
        path: &str,
        request: RequestBuilder,
    ) -> Result<T> {
        let span = crate::api_span!(method, path);
        async {
            let response = request.send().await.map_err(|e| {
                SslinkerError::request_with_source(format!("Failed to send {method} request"), e)
            })?;
            self.handle_response(response).await
        }
        .instrument(span)
        .await
    }

    /// Send a POST request with JSON body and deserialize the response
    async fn post_json<T: Serialize, R: DeserializeOwned>(&self, path: &str, body: &T) -> Result<R> {
        if self.config.verbose {
            let body_json = serde_json::to_string_pretty(body)
                .unwrap_or_else(|_| "<unable to serialize>".to_string());
            trace!("Request body:\n{}", body_json);
        }

        self.send_json("POST", path, self.post(path).json(body)).await
    }

    /// Handle HTTP response, checking status and deserializing JSON
    async fn handle_response<T: DeserializeOwned>(&self, response: Response) -> Result<T> {
        let status = response.status();
        debug!("Response status: {}", status);

        if !status.is_success() {
            return Err(self.error_from_response(response).await);
        }

        let body = response
            .text()
            .await
            .map_err(|e| SslinkerError::request_with_source("Failed to read response body", e))?;

        if self.config.verbose {
            trace!("Response body:\n{}", body);
        }

        serde_json::from_str(&body).map_err(|source| SslinkerError::Serialization {
            source,
            context: format!("Failed to deserialize response: {}", body),
        })
    }

    async fn error_from_response(&self, response: Response) -> SslinkerError {
        let status = response.status();
        let error_text =
            response.text().await.unwrap_or_else(|_| "<unable to read error>".to_string());

        if self.config.verbose {
            trace!("Error response:\n{}", error_text);
        }

        if let Ok(detail) = serde_json::from_str::<ErrorDetail>(&error_text) {
            return SslinkerError::backend_with_status(detail.message(), status.as_u16());
        }
        if let Ok(action) = serde_json::from_str::<ActionResponse>(&error_text) {
            if !action.message.is_empty() {
                return SslinkerError::backend_with_status(action.message, status.as_u16());
            }
        }

        SslinkerError::request(format!("HTTP request failed with status {}: {}", status, error_text))
    }
}

#[async_trait]
impl SslinkerApi for SslinkerClient {
    async fn list_certs(&self) -> Result<Vec<CertEntry>> {
        let path = "/api/cert/list";
        let response: CertListResponse = self.send_json("GET", path, self.get(path)).await?;
        Ok(response.certs)
    }

    async fn issue_root_ca(&self) -> Result<ActionResponse> {
        let path = "/api/cert/ca";
        self.send_json("POST", path, self.post(path)).await
    }

    async fn issue_domain_cert(&self, domain: &str, ips: &[IpAddr]) -> Result<ActionResponse> {
        let path = "/api/cert/domain";
        let mut request = self.post(path).query(&[("domain", domain)]);
        if !ips.is_empty() {
            let ip = ips.iter().map(IpAddr::to_string).collect::<Vec<_>>().join(",");
            request = request.query(&[("ip", ip)]);
        }
        self.send_json("POST", path, request).await
    }

    async fn upload_cert(&self, upload: CertUpload) -> Result<ActionResponse> {
        let path = "/api/cert/upload";
        let mut form = Form::new()
            .part("file", Part::bytes(upload.cert_pem).file_name(upload.cert_file_name))
            .part("key", Part::bytes(upload.key_pem).file_name(upload.key_file_name));
        if let Some(name) = upload.name {
            form = form.text("name", name);
        }
        self.send_json("POST", path, self.post(path).multipart(form)).await
    }

    async fn delete_cert(&self, domain: &str) -> Result<ActionResponse> {
        let path = "/api/cert/delete";
        self.send_json("DELETE", path, self.delete(path).query(&[("domain", domain)])).await
    }

    async fn delete_certs(&self, domains: &[String]) -> Result<ActionResponse> {
        let body = DeleteCertsRequest { domains: domains.to_vec() };
        self.post_json("/api/cert/delete", &body).await
    }

    async fn clear_certs(&self) -> Result<ActionResponse> {
        let path = "/api/cert/clear";
        self.send_json("DELETE", path, self.delete(path)).await
    }

    async fn download(&self, domain: &str, file: CertFile) -> Result<Bytes> {
        let path = download_path(domain, file);
        let span = crate::api_span!("GET", "/api/cert/download");
        async {
            let response = self
                .get(&path)
                .send()
                .await
                .map_err(|e| SslinkerError::request_with_source("Failed to send GET request", e))?;

            let status = response.status();
            debug!("Response status: {}", status);
            if !status.is_success() {
                return Err(self.error_from_response(response).await);
            }

            response
                .bytes()
                .await
                .map_err(|e| SslinkerError::request_with_source("Failed to read download body", e))
        }
        .instrument(span)
        .await
    }

    async fn list_routes(&self) -> Result<RouteListResponse> {
        let path = "/api/nginx/list";
        self.send_json("GET", path, self.get(path)).await
    }

    async fn create_route(&self, request: &CreateRouteRequest) -> Result<ActionResponse> {
        self.post_json("/api/nginx/config", request).await
    }

    async fn delete_route(&self, domain: &str) -> Result<ActionResponse> {
        let path = "/api/nginx/config";
        self.send_json("DELETE", path, self.delete(path).query(&[("domain", domain)])).await
    }

    async fn service_action(&self, action: ServiceAction) -> Result<ActionResponse> {
        let path = action.path();
        self.send_json("POST", path, self.post(path)).await
    }

    async fn service_status(&self) -> Result<StatusResponse> {
        let path = "/api/nginx/status";
        self.send_json("GET", path, self.get(path)).await
    }

    async fn get_local_addr(&self) -> Result<LocalAddrResponse> {
        let path = "/api/nginx/local_addr";
        self.send_json("GET", path, self.get(path)).await
    }

    async fn set_local_addr(&self, local_addr: &str) -> Result<LocalAddrResponse> {
        let body = LocalAddrRequest { local_addr: local_addr.to_string() };
        self.post_json("/api/nginx/local_addr", &body).await
    }
}
