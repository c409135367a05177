//! # Backend API Client
//!
//! The [`SslinkerApi`] trait is the seam between the client-side logic
//! (workflow engine, registries) and the SSLinker backend. [`SslinkerClient`]
//! implements it over HTTP with reqwest; tests substitute in-memory fakes.

pub mod dto;
pub mod http;

use async_trait::async_trait;
use bytes::Bytes;
use std::net::IpAddr;

use crate::domain::CertFile;
use crate::errors::Result;

pub use dto::{
    ActionResponse, CertEntry, CertUpload, CreateRouteRequest, LocalAddrResponse,
    RouteListResponse, StatusResponse,
};
pub use http::{ClientConfig, SslinkerClient};

/// Stateless operations on the proxy service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceAction {
    Reload,
    Start,
    Stop,
}

impl ServiceAction {
    pub fn path(self) -> &'static str {
        match self {
            ServiceAction::Reload => "/api/nginx/reload",
            ServiceAction::Start => "/api/nginx/start",
            ServiceAction::Stop => "/api/nginx/stop",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ServiceAction::Reload => "reload",
            ServiceAction::Start => "start",
            ServiceAction::Stop => "stop",
        }
    }
}

/// Operations the SSLinker backend exposes under `/api/cert` and `/api/nginx`.
///
/// Mutating calls return the raw `{ success, message }` envelope; callers decide
/// how to surface `success: false` (usually via [`ActionResponse::into_result`]).
/// `Err` is reserved for transport failures and unreadable responses.
#[async_trait]
pub trait SslinkerApi: Send + Sync {
    /// `GET /api/cert/list`
    async fn list_certs(&self) -> Result<Vec<CertEntry>>;

    /// `POST /api/cert/ca`
    async fn issue_root_ca(&self) -> Result<ActionResponse>;

    /// `POST /api/cert/domain?domain=&ip=`
    async fn issue_domain_cert(&self, domain: &str, ips: &[IpAddr]) -> Result<ActionResponse>;

    /// `POST /api/cert/upload` (multipart)
    async fn upload_cert(&self, upload: CertUpload) -> Result<ActionResponse>;

    /// `DELETE /api/cert/delete?domain=`
    async fn delete_cert(&self, domain: &str) -> Result<ActionResponse>;

    /// `POST /api/cert/delete` with `{ domains }`
    async fn delete_certs(&self, domains: &[String]) -> Result<ActionResponse>;

    /// `DELETE /api/cert/clear`
    async fn clear_certs(&self) -> Result<ActionResponse>;

    /// `GET /api/cert/download?type=&domain=`
    async fn download(&self, domain: &str, file: CertFile) -> Result<Bytes>;

    /// `GET /api/nginx/list`
    async fn list_routes(&self) -> Result<RouteListResponse>;

    /// `POST /api/nginx/config`
    async fn create_route(&self, request: &CreateRouteRequest) -> Result<ActionResponse>;

    /// `DELETE /api/nginx/config?domain=`
    async fn delete_route(&self, domain: &str) -> Result<ActionResponse>;

    /// `POST /api/nginx/{reload,start,stop}`
    async fn service_action(&self, action: ServiceAction) -> Result<ActionResponse>;

    /// `GET /api/nginx/status`
    async fn service_status(&self) -> Result<StatusResponse>;

    /// `GET /api/nginx/local_addr`
    async fn get_local_addr(&self) -> Result<LocalAddrResponse>;

    /// `POST /api/nginx/local_addr`
    async fn set_local_addr(&self, local_addr: &str) -> Result<LocalAddrResponse>;
}
