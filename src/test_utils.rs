//! Test utilities for workflow and registry tests
//!
//! [`FakeBackend`] is an in-memory [`SslinkerApi`] that behaves like the real
//! backend for the happy path (CA required before leaf issuance, config files
//! keyed by server name) and lets a test inject failures per operation.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{HashMap, HashSet};
use std::net::IpAddr;
use std::sync::Mutex;

use crate::client::dto::{
    ActionResponse, CertEntry, CertUpload, CreateRouteRequest, LocalAddrResponse, RouteEntry,
    RouteListResponse, StatusResponse,
};
use crate::client::{ServiceAction, SslinkerApi};
use crate::domain::{CertFile, ROOT_CA_IDENTIFIER};
use crate::errors::{Result, SslinkerError};

#[derive(Debug, Default)]
struct FakeState {
    certs: Vec<CertEntry>,
    routes: Vec<RouteEntry>,
    local_addr: String,
    status: String,
    calls: Vec<String>,
    /// operation -> backend message returned with `success: false`
    rejections: HashMap<String, String>,
    /// operations failing at the transport level
    transport_failures: HashSet<String>,
    /// route domains whose delete is rejected
    undeletable_routes: HashSet<String>,
}

#[derive(Debug, Default)]
pub struct FakeBackend {
    state: Mutex<FakeState>,
}

pub fn cert_entry(domain: &str) -> CertEntry {
    CertEntry {
        domain: domain.to_string(),
        type_label: None,
        crt: Some(format!("{domain}.crt")),
        key: Some(format!("{domain}.key")),
        name: Some(domain.to_string()),
        uploaded: false,
        path: None,
    }
}

pub fn imported_entry(name: &str) -> CertEntry {
    CertEntry {
        domain: format!("{name}.pem"),
        type_label: None,
        crt: Some(format!("{name}.pem")),
        key: Some(format!("/certs/uploads/{name}.key")),
        name: Some(name.to_string()),
        uploaded: true,
        path: Some(format!("/certs/uploads/{name}.pem")),
    }
}

pub fn route_entry(domain: &str, proxy_pass: &str) -> RouteEntry {
    RouteEntry {
        domain: domain.to_string(),
        proxy_pass: Some(proxy_pass.to_string()),
        config_path: Some(format!("/etc/nginx/conf.d/{domain}.conf")),
        cert_domain: None,
    }
}

impl FakeBackend {
    pub fn new() -> Self {
        let backend = Self::default();
        backend.with_state(|s| s.status = "running".to_string());
        backend
    }

    /// Backend that already holds a root CA
    pub fn with_root_ca() -> Self {
        let backend = Self::new();
        backend.add_cert(cert_entry(ROOT_CA_IDENTIFIER));
        backend
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut FakeState) -> R) -> R {
        let mut state = self.state.lock().expect("fake backend lock");
        f(&mut state)
    }

    pub fn add_cert(&self, entry: CertEntry) {
        self.with_state(|s| s.certs.push(entry));
    }

    pub fn add_route(&self, entry: RouteEntry) {
        self.with_state(|s| s.routes.push(entry));
    }

    pub fn set_status(&self, status: &str) {
        self.with_state(|s| s.status = status.to_string());
    }

    pub fn set_local_addr_value(&self, addr: &str) {
        self.with_state(|s| s.local_addr = addr.to_string());
    }

    /// Make `operation` answer `success: false` with `message`
    pub fn reject(&self, operation: &str, message: &str) {
        self.with_state(|s| s.rejections.insert(operation.to_string(), message.to_string()));
    }

    /// Make `operation` fail as if the network were down
    pub fn break_transport(&self, operation: &str) {
        self.with_state(|s| s.transport_failures.insert(operation.to_string()));
    }

    /// Restore normal behaviour for `operation`
    pub fn heal(&self, operation: &str) {
        self.with_state(|s| {
            s.rejections.remove(operation);
            s.transport_failures.remove(operation);
        });
    }

    pub fn refuse_route_delete(&self, domain: &str) {
        self.with_state(|s| s.undeletable_routes.insert(domain.to_string()));
    }

    pub fn calls(&self) -> Vec<String> {
        self.with_state(|s| s.calls.clone())
    }

    pub fn calls_to(&self, operation: &str) -> usize {
        self.calls().iter().filter(|c| c.split(':').next() == Some(operation)).count()
    }

    pub fn cert_ids(&self) -> Vec<String> {
        self.with_state(|s| s.certs.iter().map(|c| c.domain.clone()).collect())
    }

    pub fn route_domains(&self) -> Vec<String> {
        self.with_state(|s| s.routes.iter().map(|r| r.domain.clone()).collect())
    }

    /// Record the call and apply injected failures
    fn enter(&self, operation: &str, detail: &str) -> Result<Option<ActionResponse>> {
        self.with_state(|s| {
            let call =
                if detail.is_empty() { operation.to_string() } else { format!("{operation}:{detail}") };
            s.calls.push(call);
            if s.transport_failures.contains(operation) {
                return Err(SslinkerError::request(format!("{operation}: connection refused")));
            }
            Ok(s.rejections.get(operation).map(|m| ActionResponse::failed(m.clone())))
        })
    }
}

#[async_trait]
impl SslinkerApi for FakeBackend {
    async fn list_certs(&self) -> Result<Vec<CertEntry>> {
        self.enter("list_certs", "")?;
        Ok(self.with_state(|s| s.certs.clone()))
    }

    async fn issue_root_ca(&self) -> Result<ActionResponse> {
        if let Some(rejected) = self.enter("issue_root_ca", "")? {
            return Ok(rejected);
        }
        Ok(self.with_state(|s| {
            if s.certs.iter().any(|c| c.domain == ROOT_CA_IDENTIFIER) {
                ActionResponse::ok("证书已存在，无需重复生成")
            } else {
                s.certs.push(cert_entry(ROOT_CA_IDENTIFIER));
                ActionResponse::ok("CA根证书生成成功")
            }
        }))
    }

    async fn issue_domain_cert(&self, domain: &str, _ips: &[IpAddr]) -> Result<ActionResponse> {
        if let Some(rejected) = self.enter("issue_domain_cert", domain)? {
            return Ok(rejected);
        }
        Ok(self.with_state(|s| {
            if !s.certs.iter().any(|c| c.domain == ROOT_CA_IDENTIFIER) {
                return ActionResponse::failed("请先生成CA根证书");
            }
            s.certs.retain(|c| c.domain != domain);
            s.certs.push(cert_entry(domain));
            ActionResponse::ok("域名证书生成成功")
        }))
    }

    async fn upload_cert(&self, upload: CertUpload) -> Result<ActionResponse> {
        if let Some(rejected) = self.enter("upload_cert", &upload.cert_file_name)? {
            return Ok(rejected);
        }
        let name = upload.name.clone().unwrap_or_else(|| {
            upload.cert_file_name.rsplit_once('.').map(|(b, _)| b.to_string()).unwrap_or_default()
        });
        self.with_state(|s| s.certs.push(imported_entry(&name)));
        Ok(ActionResponse::ok("上传成功"))
    }

    async fn delete_cert(&self, domain: &str) -> Result<ActionResponse> {
        if let Some(rejected) = self.enter("delete_cert", domain)? {
            return Ok(rejected);
        }
        Ok(self.with_state(|s| {
            let before = s.certs.len();
            s.certs.retain(|c| c.domain != domain && c.name.as_deref() != Some(domain));
            if s.certs.len() < before {
                ActionResponse::ok("删除成功")
            } else {
                ActionResponse::failed("未找到对应证书文件")
            }
        }))
    }

    async fn delete_certs(&self, domains: &[String]) -> Result<ActionResponse> {
        if let Some(rejected) = self.enter("delete_certs", &domains.join(","))? {
            return Ok(rejected);
        }
        self.with_state(|s| {
            s.certs.retain(|c| {
                !domains.iter().any(|d| *d == c.domain || Some(d.as_str()) == c.name.as_deref())
            })
        });
        Ok(ActionResponse::ok("删除成功"))
    }

    async fn clear_certs(&self) -> Result<ActionResponse> {
        if let Some(rejected) = self.enter("clear_certs", "")? {
            return Ok(rejected);
        }
        self.with_state(|s| s.certs.clear());
        Ok(ActionResponse::ok("已清空"))
    }

    async fn download(&self, domain: &str, file: CertFile) -> Result<Bytes> {
        if let Some(rejected) = self.enter("download", domain)? {
            return Err(SslinkerError::backend_with_status(rejected.message, 404));
        }
        Ok(Bytes::from(format!("PEM:{}:{}", domain, file.as_param())))
    }

    async fn list_routes(&self) -> Result<RouteListResponse> {
        self.enter("list_routes", "")?;
        Ok(self.with_state(|s| RouteListResponse {
            configs: s.routes.clone(),
            local_addr: Some(s.local_addr.clone()).filter(|a| !a.is_empty()),
        }))
    }

    async fn create_route(&self, request: &CreateRouteRequest) -> Result<ActionResponse> {
        if let Some(rejected) = self.enter("create_route", &request.server_name)? {
            return Ok(rejected);
        }
        self.with_state(|s| {
            s.routes.retain(|r| r.domain != request.server_name);
            let mut entry = route_entry(&request.server_name, &request.proxy_pass);
            entry.cert_domain = Some(request.cert_domain.clone());
            s.routes.push(entry);
        });
        Ok(ActionResponse::ok("配置写入并nginx已重载"))
    }

    async fn delete_route(&self, domain: &str) -> Result<ActionResponse> {
        if let Some(rejected) = self.enter("delete_route", domain)? {
            return Ok(rejected);
        }
        Ok(self.with_state(|s| {
            if s.undeletable_routes.contains(domain) {
                return ActionResponse::failed(format!("删除失败: {domain} is locked"));
            }
            let before = s.routes.len();
            s.routes.retain(|r| r.domain != domain);
            if s.routes.len() < before {
                ActionResponse::ok("配置删除并nginx已重载")
            } else {
                ActionResponse::failed(format!("配置文件不存在: /etc/nginx/conf.d/{domain}.conf"))
            }
        }))
    }

    async fn service_action(&self, action: ServiceAction) -> Result<ActionResponse> {
        if let Some(rejected) = self.enter("service_action", action.name())? {
            return Ok(rejected);
        }
        Ok(ActionResponse::ok(""))
    }

    async fn service_status(&self) -> Result<StatusResponse> {
        self.enter("service_status", "")?;
        Ok(self.with_state(|s| StatusResponse { status: s.status.clone() }))
    }

    async fn get_local_addr(&self) -> Result<LocalAddrResponse> {
        self.enter("get_local_addr", "")?;
        Ok(self.with_state(|s| LocalAddrResponse { local_addr: s.local_addr.clone() }))
    }

    async fn set_local_addr(&self, local_addr: &str) -> Result<LocalAddrResponse> {
        if let Some(rejected) = self.enter("set_local_addr", local_addr)? {
            return Err(SslinkerError::backend_with_status(rejected.message, 500));
        }
        self.with_state(|s| s.local_addr = local_addr.to_string());
        Ok(LocalAddrResponse { local_addr: local_addr.to_string() })
    }
}
