//! One-click provisioning over HTTP

use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;
use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use sslinker::{
    DirectorySink, MemorySink, NoticeLevel, ProvisioningWorkflow, SslinkerError, WorkflowStage,
};

use super::support::{cert, failed, ok, TestBackend};

#[tokio::test]
async fn test_provision_from_empty_backend() {
    let backend = TestBackend::start().await;
    backend.respond("GET", "/api/cert/list", 200, json!({ "certs": [] })).await;
    backend.respond("POST", "/api/cert/ca", 200, ok("CA根证书生成成功")).await;
    Mock::given(method("POST"))
        .and(path("/api/cert/domain"))
        .and(query_param("domain", "app.lan"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok("域名证书生成成功")))
        .expect(1)
        .mount(&backend.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/nginx/config"))
        .and(body_json(json!({
            "cert_domain": "app.lan",
            "server_name": "app.lan",
            "proxy_pass": "http://127.0.0.1:3000"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok("配置写入并nginx已重载")))
        .expect(1)
        .mount(&backend.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/cert/download"))
        .and(query_param("domain", "SSLinker"))
        .and(query_param("type", "cert"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ROOT-CA-PEM".to_vec()))
        .mount(&backend.server)
        .await;

    let downloads = TempDir::new().unwrap();
    let workflow = ProvisioningWorkflow::new(
        backend.api(),
        Arc::new(backend.notifier.clone()),
        Arc::new(DirectorySink::new(downloads.path())),
    );

    let run = assert_ok!(workflow.run("app.lan", "127.0.0.1:3000").await);

    assert!(run.is_success());
    assert!(!run.ca_reused);
    assert!(!run.cert_reused);
    assert_eq!(run.hosts_line.as_deref(), Some("127.0.0.1 app.lan"));
    assert_eq!(
        run.history,
        vec![
            WorkflowStage::CheckingCa,
            WorkflowStage::IssuingCa,
            WorkflowStage::IssuingCert,
            WorkflowStage::CreatingRoute,
            WorkflowStage::Succeeded,
        ]
    );

    let saved = downloads.path().join("SSLinker.crt");
    assert_eq!(std::fs::read(&saved).unwrap(), b"ROOT-CA-PEM");
    assert_eq!(run.ca_certificate, Some(saved.display().to_string()));
    assert!(backend
        .notifier
        .messages(NoticeLevel::Success)
        .contains(&"https://app.lan is ready".to_string()));
}

#[tokio::test]
async fn test_provision_reuses_existing_material() {
    let backend = TestBackend::start().await;
    backend
        .respond(
            "GET",
            "/api/cert/list",
            200,
            json!({ "certs": [cert("SSLinker"), cert("app.lan")] }),
        )
        .await;
    backend.respond("POST", "/api/nginx/config", 200, ok("配置写入并nginx已重载")).await;
    Mock::given(method("GET"))
        .and(path("/api/cert/download"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ROOT".to_vec()))
        .mount(&backend.server)
        .await;

    let workflow = ProvisioningWorkflow::new(
        backend.api(),
        Arc::new(backend.notifier.clone()),
        Arc::new(MemorySink::new()),
    );
    let run = assert_ok!(workflow.run("app.lan", "https://10.0.0.7:8443").await);

    assert!(run.is_success());
    assert!(run.ca_reused);
    assert!(run.cert_reused);
    assert_eq!(run.hosts_line.as_deref(), Some("10.0.0.7 app.lan"));

    let requests = backend.request_lines().await;
    assert!(!requests.iter().any(|r| r.starts_with("POST /api/cert/")));
}

#[tokio::test]
async fn test_provision_stops_at_failed_stage() {
    let backend = TestBackend::start().await;
    backend.respond("GET", "/api/cert/list", 200, json!({ "certs": [cert("SSLinker")] })).await;
    backend.respond("POST", "/api/cert/domain", 200, failed("证书生成失败")).await;

    let workflow = ProvisioningWorkflow::new(
        backend.api(),
        Arc::new(backend.notifier.clone()),
        Arc::new(MemorySink::new()),
    );
    let run = assert_ok!(workflow.run("app.lan", "127.0.0.1:3000").await);

    assert!(!run.is_success());
    assert_eq!(run.failed_stage(), Some(WorkflowStage::IssuingCert));
    assert_eq!(run.failure.as_ref().map(|f| f.message.as_str()), Some("证书生成失败"));
    assert_eq!(
        backend.notifier.messages(NoticeLevel::Error),
        vec!["issuing certificate: 证书生成失败".to_string()]
    );

    let requests = backend.request_lines().await;
    assert!(!requests.iter().any(|r| r.contains("/api/nginx/")));
}

#[tokio::test]
async fn test_provision_rejects_invalid_input_without_requests() {
    let backend = TestBackend::start().await;
    let workflow = ProvisioningWorkflow::new(
        backend.api(),
        Arc::new(backend.notifier.clone()),
        Arc::new(MemorySink::new()),
    );

    let err = assert_err!(workflow.run("app.lan", "").await);
    assert!(matches!(err, SslinkerError::Validation { .. }));
    assert!(backend.request_lines().await.is_empty());
}
