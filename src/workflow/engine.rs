//! Provisioning engine
//!
//! Drives a [`WorkflowRun`] against an [`SslinkerApi`]: ensure the root CA,
//! ensure the leaf certificate, create the proxy route, then hand the root CA
//! certificate to the operator. Each step is skipped when its result already
//! exists, so re-running after a failure never issues anything twice.

use std::net::IpAddr;
use std::sync::Arc;
use tracing::{info, warn, Instrument};

use crate::artifact::ArtifactSink;
use crate::busy::InFlight;
use crate::client::dto::{CertEntry, CreateRouteRequest};
use crate::client::SslinkerApi;
use crate::domain::{CertFile, CertKind, CertificateRecord, ROOT_CA_IDENTIFIER};
use crate::errors::{Result, SslinkerError};
use crate::notify::{Notice, Notifier};
use crate::validation::{bare_host, normalize_origin, validate_route_host};

use super::run::{WorkflowRun, WorkflowStage};

/// One-click provisioning of `https://<host>` in front of a local origin.
pub struct ProvisioningWorkflow {
    api: Arc<dyn SslinkerApi>,
    notifier: Arc<dyn Notifier>,
    sink: Arc<dyn ArtifactSink>,
    in_flight: InFlight,
}

impl ProvisioningWorkflow {
    pub fn new(
        api: Arc<dyn SslinkerApi>,
        notifier: Arc<dyn Notifier>,
        sink: Arc<dyn ArtifactSink>,
    ) -> Self {
        Self { api, notifier, sink, in_flight: InFlight::new("provision") }
    }

    /// True while a run is executing
    pub fn is_running(&self) -> bool {
        self.in_flight.is_running()
    }

    /// Provision `host` as a TLS front for `origin`.
    ///
    /// Invalid input and a concurrent run are returned as `Err` without any
    /// request being sent. Backend and transport failures are not errors here:
    /// they end the run in [`WorkflowStage::Failed`], which is returned as `Ok`.
    pub async fn run(&self, host: &str, origin: &str) -> Result<WorkflowRun> {
        let host = validate_route_host(host)?;
        if host == ROOT_CA_IDENTIFIER {
            return Err(SslinkerError::validation_field(
                format!("'{ROOT_CA_IDENTIFIER}' is reserved for the root CA"),
                "host",
            ));
        }
        let origin = normalize_origin(origin)?;

        let _guard = self.in_flight.acquire()?;
        let span = crate::workflow_span!(host, origin);
        self.execute(WorkflowRun::start(host, origin)).instrument(span).await
    }

    async fn execute(&self, mut run: WorkflowRun) -> Result<WorkflowRun> {
        info!(stage = %run.stage, "Provisioning started");
        self.notifier.notify(Notice::info(format!("Provisioning {}", run.target_host)));

        let records = match self.snapshot().await {
            Ok(records) => records,
            Err(e) => return self.abort(run, e),
        };

        if records.iter().any(CertificateRecord::is_root_ca) {
            run.ca_reused = true;
            info!("Root CA present, skipping issuance");
        } else {
            self.enter(&mut run, WorkflowStage::IssuingCa)?;
            match self.api.issue_root_ca().await.and_then(|r| r.into_result()) {
                Ok(message) => self.notifier.notify(Notice::success(message)),
                Err(e) => return self.abort(run, e),
            }
        }

        self.enter(&mut run, WorkflowStage::IssuingCert)?;
        // A listed certificate without its key cannot terminate TLS; issue it again.
        let existing = records.iter().any(|r| {
            r.identifier == run.target_host && r.kind != CertKind::Imported && r.has_private_key
        });
        if existing {
            run.cert_reused = true;
            info!(domain = %run.target_host, "Certificate present, skipping issuance");
        } else {
            let ips: Vec<IpAddr> = run.target_host.parse::<IpAddr>().ok().into_iter().collect();
            match self
                .api
                .issue_domain_cert(&run.target_host, &ips)
                .await
                .and_then(|r| r.into_result())
            {
                Ok(message) => self.notifier.notify(Notice::success(message)),
                Err(e) => return self.abort(run, e),
            }
        }

        self.enter(&mut run, WorkflowStage::CreatingRoute)?;
        let request = CreateRouteRequest {
            cert_domain: run.target_host.clone(),
            server_name: run.target_host.clone(),
            proxy_pass: run.target_origin.clone(),
        };
        if let Err(e) = self.api.create_route(&request).await.and_then(|r| r.into_result()) {
            return self.abort(run, e);
        }

        let origin_host = bare_host(&run.target_origin).unwrap_or_default();
        let hosts_line = format!("{} {}", origin_host, run.target_host);
        run.succeed(hosts_line)?;
        info!(
            ca_reused = run.ca_reused,
            cert_reused = run.cert_reused,
            "Provisioning finished"
        );
        self.notifier.notify(Notice::success(format!("https://{} is ready", run.target_host)));

        self.deliver_root_ca(&mut run).await;
        Ok(run)
    }

    async fn snapshot(&self) -> Result<Vec<CertificateRecord>> {
        let records: Vec<CertificateRecord> =
            self.api.list_certs().await?.into_iter().map(CertEntry::into_record).collect();
        if records.iter().filter(|r| r.is_root_ca()).count() > 1 {
            return Err(SslinkerError::contract("certificate listing holds more than one root CA"));
        }
        Ok(records)
    }

    fn enter(&self, run: &mut WorkflowRun, stage: WorkflowStage) -> Result<()> {
        run.advance(stage)?;
        info!(stage = %stage, "Stage entered");
        Ok(())
    }

    fn abort(&self, mut run: WorkflowRun, error: SslinkerError) -> Result<WorkflowRun> {
        let stage = run.stage;
        let message = error.notice_message();
        run.fail(message.clone())?;
        warn!(stage = %stage, error = %error, "Provisioning failed");
        self.notifier.notify(Notice::error(format!("{}: {}", stage, message)));
        Ok(run)
    }

    /// The route already exists at this point; a failed download is reported
    /// but leaves the run successful.
    async fn deliver_root_ca(&self, run: &mut WorkflowRun) {
        let file_name = format!("{}.{}", ROOT_CA_IDENTIFIER, CertFile::Cert.extension());
        let stored = match self.api.download(ROOT_CA_IDENTIFIER, CertFile::Cert).await {
            Ok(bytes) => self.sink.store(&file_name, &bytes).await,
            Err(e) => Err(e),
        };
        match stored {
            Ok(location) => {
                info!(location = %location, "Root CA certificate saved");
                run.ca_certificate = Some(location);
            }
            Err(e) => {
                warn!(error = %e, "Root CA download failed");
                self.notifier.notify(Notice::error(format!(
                    "Root CA download failed: {}",
                    e.notice_message()
                )));
            }
        }
    }
}
