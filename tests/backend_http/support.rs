//! Support utilities for backend HTTP tests
//!
//! Stands up a wiremock server playing the SSLinker backend and builds clients,
//! workflows and registries pointed at it.

use serde_json::{json, Value};
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sslinker::{ClientConfig, MemoryNotifier, SslinkerApi, SslinkerClient};

/// Fake backend plus a client pointed at it
pub struct TestBackend {
    pub server: MockServer,
    pub client: SslinkerClient,
    pub notifier: MemoryNotifier,
}

impl TestBackend {
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let client = SslinkerClient::new(ClientConfig {
            base_url: format!("{}/", server.uri()),
            timeout: 5,
            verbose: true,
        })
        .expect("build client");
        Self { server, client, notifier: MemoryNotifier::new() }
    }

    pub fn api(&self) -> Arc<dyn SslinkerApi> {
        Arc::new(self.client.clone())
    }

    /// Mount a JSON response for `verb path`
    pub async fn respond(&self, verb: &str, route: &str, status: u16, body: Value) {
        Mock::given(method(verb))
            .and(path(route))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// Requests received so far as `"METHOD /path?query"`
    pub async fn request_lines(&self) -> Vec<String> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .map(|r| match r.url.query() {
                Some(query) => format!("{} {}?{}", r.method, r.url.path(), query),
                None => format!("{} {}", r.method, r.url.path()),
            })
            .collect()
    }
}

pub fn ok(message: &str) -> Value {
    json!({ "success": true, "message": message })
}

pub fn failed(message: &str) -> Value {
    json!({ "success": false, "message": message })
}

pub fn cert(domain: &str) -> Value {
    json!({
        "domain": domain,
        "type": "domain",
        "crt": format!("{domain}.crt"),
        "key": format!("{domain}.key"),
        "name": domain
    })
}

pub fn uploaded(name: &str) -> Value {
    json!({
        "domain": format!("{name}.pem"),
        "crt": format!("{name}.pem"),
        "key": format!("/certs/uploads/{name}.key"),
        "name": name,
        "uploaded": true,
        "path": format!("/certs/uploads/{name}.pem")
    })
}

pub fn route(domain: &str, proxy_pass: &str) -> Value {
    json!({
        "domain": domain,
        "proxy_pass": proxy_pass,
        "config_path": format!("/etc/nginx/conf.d/{domain}.conf")
    })
}
