//! Route registry over HTTP: batch deletion, edits and hosts export

use serde_json::json;
use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use sslinker::registry::RouteDraft;
use sslinker::{CertificateRegistry, NoticeLevel, RouteRegistry, SslinkerError};

use super::support::{cert, ok, route, uploaded, TestBackend};

async fn mount_listing(backend: &TestBackend) {
    backend
        .respond(
            "GET",
            "/api/nginx/list",
            200,
            json!({
                "configs": [
                    route("a.lan", "http://127.0.0.1:3000"),
                    route("b.lan", "http://127.0.0.1:4000"),
                    route("c.lan", "http://127.0.0.1:5000")
                ],
                "local_addr": "192.168.1.10"
            }),
        )
        .await;
}

#[tokio::test]
async fn test_batch_delete_reports_partial_failure() {
    let backend = TestBackend::start().await;
    mount_listing(&backend).await;
    Mock::given(method("DELETE"))
        .and(path("/api/nginx/config"))
        .and(query_param("domain", "b.lan"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "detail": "配置文件不存在" })),
        )
        .mount(&backend.server)
        .await;
    backend.respond("DELETE", "/api/nginx/config", 200, ok("配置删除并nginx已重载")).await;

    let routes = RouteRegistry::new(backend.api(), Arc::new(backend.notifier.clone()));
    assert_ok!(routes.refresh().await);

    let domains = vec!["a.lan".to_string(), "b.lan".to_string(), "c.lan".to_string()];
    let outcome = assert_ok!(routes.delete_many(&domains).await);

    assert_eq!(outcome.succeeded, vec!["a.lan".to_string(), "c.lan".to_string()]);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].domain, "b.lan");
    assert_eq!(
        backend.notifier.messages(NoticeLevel::Error),
        vec!["Deleted 2 of 3 route(s); 1 failed (b.lan: 配置文件不存在)".to_string()]
    );

    let deletes: Vec<String> = backend
        .request_lines()
        .await
        .into_iter()
        .filter(|r| r.starts_with("DELETE"))
        .collect();
    assert_eq!(deletes.len(), 3);
}

#[tokio::test]
async fn test_hosts_export_uses_backend_local_addr() {
    let backend = TestBackend::start().await;
    mount_listing(&backend).await;

    let routes = RouteRegistry::new(backend.api(), Arc::new(backend.notifier.clone()));
    assert_ok!(routes.refresh().await);

    let lines = assert_ok!(routes.hosts_export(&["a.lan".to_string(), "c.lan".to_string()], None));
    assert_eq!(lines, vec!["192.168.1.10 a.lan".to_string(), "192.168.1.10 c.lan".to_string()]);

    let overridden = assert_ok!(routes.hosts_export(&["b.lan".to_string()], Some("10.0.0.2")));
    assert_eq!(overridden, vec!["10.0.0.2 b.lan".to_string()]);

    let err = assert_err!(routes.hosts_export(&["ghost.lan".to_string()], None));
    assert!(matches!(err, SslinkerError::Validation { .. }));
}

#[tokio::test]
async fn test_route_for_imported_certificate_keeps_certificate_name() {
    let backend = TestBackend::start().await;
    backend
        .respond(
            "GET",
            "/api/cert/list",
            200,
            json!({ "certs": [cert("SSLinker"), uploaded("corp")] }),
        )
        .await;
    backend.respond("GET", "/api/nginx/list", 200, json!({ "configs": [] })).await;
    backend.respond("POST", "/api/nginx/config", 200, ok("配置写入并nginx已重载")).await;

    let certificates = CertificateRegistry::new(backend.api(), Arc::new(backend.notifier.clone()));
    let routes = RouteRegistry::new(backend.api(), Arc::new(backend.notifier.clone()));
    let records = assert_ok!(certificates.refresh().await);

    let draft = RouteDraft::new("corp.pem", Some("portal.corp.lan".to_string()), "10.0.0.9:8080");
    assert_ok!(routes.create(&draft, &records).await);

    let requests = backend.server.received_requests().await.unwrap();
    let create = requests
        .iter()
        .find(|r| r.method.as_str() == "POST" && r.url.path() == "/api/nginx/config")
        .expect("create request");
    let body: serde_json::Value = serde_json::from_slice(&create.body).unwrap();
    assert_eq!(
        body,
        json!({
            "cert_domain": "corp.pem",
            "server_name": "portal.corp.lan",
            "proxy_pass": "http://10.0.0.9:8080"
        })
    );
}
