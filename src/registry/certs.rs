//! Certificate registry
//!
//! Cached, classified and ordered view of `GET /api/cert/list`, with the
//! issuance, upload, delete and download actions. The root CA is protected:
//! it can only disappear through the full wipe.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

use super::{lock, settle};
use crate::artifact::ArtifactSink;
use crate::busy::InFlight;
use crate::client::dto::{CertEntry, CertUpload};
use crate::client::http::download_path;
use crate::client::SslinkerApi;
use crate::domain::{display_order, CertFile, CertificateRecord, ROOT_CA_IDENTIFIER};
use crate::errors::{Result, SslinkerError};
use crate::notify::{Notice, Notifier};
use crate::validation::{parse_ip_list, validate_cert_identifier};

/// Accepted extensions for an uploaded certificate
pub const CERT_EXTENSIONS: &[&str] = &["crt", "pem", "cer"];

/// Accepted extension for an uploaded private key
pub const KEY_EXTENSION: &str = "key";

pub struct CertificateRegistry {
    api: Arc<dyn SslinkerApi>,
    notifier: Arc<dyn Notifier>,
    records: Mutex<Vec<CertificateRecord>>,
    selection: Mutex<BTreeSet<String>>,
    issuing: InFlight,
    uploading: InFlight,
    deleting: InFlight,
}

impl CertificateRegistry {
    pub fn new(api: Arc<dyn SslinkerApi>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            api,
            notifier,
            records: Mutex::new(Vec::new()),
            selection: Mutex::new(BTreeSet::new()),
            issuing: InFlight::new("issue certificate"),
            uploading: InFlight::new("upload certificate"),
            deleting: InFlight::new("delete certificates"),
        }
    }

    /// Current snapshot in display order
    pub fn records(&self) -> Vec<CertificateRecord> {
        lock(&self.records).clone()
    }

    pub fn get(&self, identifier: &str) -> Option<CertificateRecord> {
        lock(&self.records).iter().find(|r| r.identifier == identifier).cloned()
    }

    pub fn root_ca(&self) -> Option<CertificateRecord> {
        lock(&self.records).iter().find(|r| r.is_root_ca()).cloned()
    }

    /// Reload the listing, replacing the cache only on success.
    pub async fn refresh(&self) -> Result<Vec<CertificateRecord>> {
        let entries = match self.api.list_certs().await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "Failed to load certificates");
                self.notifier.notify(Notice::error(e.notice_message()));
                return Err(e);
            }
        };

        let mut records: Vec<CertificateRecord> =
            entries.into_iter().map(CertEntry::into_record).collect();
        let roots = records.iter().filter(|r| r.is_root_ca()).count();
        if roots > 1 {
            let e = SslinkerError::contract(format!(
                "certificate listing holds {roots} records named '{ROOT_CA_IDENTIFIER}'"
            ));
            warn!(error = %e, "Rejected certificate listing");
            self.notifier.notify(Notice::error(e.to_string()));
            return Err(e);
        }
        records.sort_by(display_order);

        debug!(count = records.len(), "Certificate listing refreshed");
        lock(&self.selection).retain(|id| records.iter().any(|r| &r.identifier == id));
        *lock(&self.records) = records.clone();
        Ok(records)
    }

    /// Refresh after a successful action; a failure here is already notified
    async fn refresh_after_action(&self) {
        let _ = self.refresh().await;
    }

    /// `POST /api/cert/ca`. An already existing CA is reported, not an error.
    pub async fn issue_root_ca(&self) -> Result<String> {
        let _guard = self.issuing.acquire()?;
        let message = settle(&*self.notifier, "issue root CA", self.api.issue_root_ca().await)?;
        self.refresh_after_action().await;
        Ok(message)
    }

    /// Issue a leaf certificate for `identifier` with optional extra IP SANs.
    ///
    /// `ips` is the raw comma separated list as typed by the operator.
    pub async fn issue_domain(&self, identifier: &str, ips: &str) -> Result<String> {
        let identifier = validate_cert_identifier(identifier)?;
        if identifier == ROOT_CA_IDENTIFIER {
            return Err(SslinkerError::validation_field(
                format!("'{ROOT_CA_IDENTIFIER}' is reserved for the root CA"),
                "domain",
            ));
        }
        let ips = parse_ip_list(ips)?;

        let _guard = self.issuing.acquire()?;
        let outcome = self.api.issue_domain_cert(&identifier, &ips).await;
        let message = settle(&*self.notifier, "issue certificate", outcome)?;
        self.refresh_after_action().await;
        Ok(message)
    }

    /// Upload an existing certificate and key pair.
    ///
    /// The display name defaults to the certificate file name without its
    /// extension.
    pub async fn upload(
        &self,
        cert_path: &Path,
        key_path: &Path,
        name: Option<&str>,
    ) -> Result<String> {
        let cert_file_name = checked_file_name(cert_path, CERT_EXTENSIONS, "cert_file")?;
        let key_file_name = checked_file_name(key_path, &[KEY_EXTENSION], "key_file")?;
        let name = match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) => validate_cert_identifier(name)?,
            None => file_stem(&cert_file_name),
        };

        let _guard = self.uploading.acquire()?;
        let cert_pem = read_file(cert_path).await?;
        let key_pem = read_file(key_path).await?;
        let upload =
            CertUpload { cert_file_name, cert_pem, key_file_name, key_pem, name: Some(name) };

        let message = settle(&*self.notifier, "upload certificate", self.api.upload_cert(upload).await)?;
        self.refresh_after_action().await;
        Ok(message)
    }

    /// Delete one certificate. The root CA and unknown identifiers are refused.
    pub async fn delete(&self, identifier: &str) -> Result<String> {
        let record = self.known(identifier)?;
        if record.is_root_ca() {
            return Err(SslinkerError::validation(
                "The root CA can only be removed by clearing all certificates",
            ));
        }

        let _guard = self.deleting.acquire()?;
        let outcome = self.api.delete_cert(record.delete_key()).await;
        if let Ok(response) = &outcome {
            for secondary in &response.errors {
                warn!(identifier = %record.identifier, error = %secondary, "Partial delete");
                self.notifier.notify(Notice::error(secondary.clone()));
            }
        }
        let message = settle(&*self.notifier, "delete certificate", outcome)?;
        self.refresh_after_action().await;
        Ok(message)
    }

    pub fn select(&self, identifier: &str) -> Result<()> {
        let record = self.known(identifier)?;
        lock(&self.selection).insert(record.identifier);
        Ok(())
    }

    pub fn deselect(&self, identifier: &str) {
        lock(&self.selection).remove(identifier);
    }

    pub fn select_all(&self) {
        let ids: BTreeSet<String> =
            lock(&self.records).iter().map(|r| r.identifier.clone()).collect();
        *lock(&self.selection) = ids;
    }

    pub fn clear_selection(&self) {
        lock(&self.selection).clear();
    }

    /// Selected identifiers in display order
    pub fn selected(&self) -> Vec<String> {
        let selection = lock(&self.selection);
        lock(&self.records)
            .iter()
            .filter(|r| selection.contains(&r.identifier))
            .map(|r| r.identifier.clone())
            .collect()
    }

    /// Whether the batch delete control is enabled for the current selection.
    ///
    /// A selection holding the root CA is only deletable when it covers the
    /// whole listing.
    pub fn can_delete_selection(&self) -> bool {
        let selection = lock(&self.selection);
        let records = lock(&self.records);
        if selection.is_empty() {
            return false;
        }
        let has_root = records.iter().any(|r| r.is_root_ca() && selection.contains(&r.identifier));
        !has_root || selection.len() == records.len()
    }

    /// Delete the selected certificates.
    ///
    /// A full selection that includes the root CA wipes everything through
    /// `DELETE /api/cert/clear`; any other selection goes through the batch
    /// endpoint.
    pub async fn delete_selected(&self) -> Result<String> {
        let (targets, full_wipe) = {
            let selection = lock(&self.selection);
            let records = lock(&self.records);
            if selection.is_empty() {
                return Err(SslinkerError::validation("No certificates selected"));
            }
            let has_root =
                records.iter().any(|r| r.is_root_ca() && selection.contains(&r.identifier));
            if has_root && selection.len() != records.len() {
                return Err(SslinkerError::validation(
                    "The root CA can only be deleted together with every other certificate",
                ));
            }
            let targets: Vec<String> = records
                .iter()
                .filter(|r| selection.contains(&r.identifier))
                .map(|r| r.delete_key().to_string())
                .collect();
            (targets, has_root)
        };

        let _guard = self.deleting.acquire()?;
        let message = if full_wipe {
            info!(count = targets.len(), "Selection covers the root CA, clearing all certificates");
            settle(&*self.notifier, "clear certificates", self.api.clear_certs().await)?
        } else {
            info!(count = targets.len(), "Deleting selected certificates");
            settle(&*self.notifier, "delete certificates", self.api.delete_certs(&targets).await)?
        };
        self.clear_selection();
        self.refresh_after_action().await;
        Ok(message)
    }

    /// Privileged full wipe, root CA included
    pub async fn clear_all(&self) -> Result<String> {
        let _guard = self.deleting.acquire()?;
        let message = settle(&*self.notifier, "clear certificates", self.api.clear_certs().await)?;
        self.clear_selection();
        self.refresh_after_action().await;
        Ok(message)
    }

    /// Relative download URL for `file` of `record`.
    ///
    /// The root CA key and keys that were never stored are refused.
    pub fn download_url(record: &CertificateRecord, file: CertFile) -> Result<String> {
        check_download(record, file)?;
        Ok(download_path(record.download_key(), file))
    }

    /// Fetch `file` of the certificate `identifier` and store it in `sink`.
    pub async fn download(
        &self,
        identifier: &str,
        file: CertFile,
        sink: &dyn ArtifactSink,
    ) -> Result<String> {
        let record = self.known(identifier)?;
        check_download(&record, file)?;
        self.fetch(&record, file, sink).await
    }

    /// Fetch the certificate and, when a key is stored and may be exported,
    /// the key as well.
    pub async fn download_bundle(
        &self,
        identifier: &str,
        sink: &dyn ArtifactSink,
    ) -> Result<Vec<String>> {
        let record = self.known(identifier)?;
        let mut stored = vec![self.fetch(&record, CertFile::Cert, sink).await?];
        if check_download(&record, CertFile::Key).is_ok() {
            stored.push(self.fetch(&record, CertFile::Key, sink).await?);
        }
        Ok(stored)
    }

    async fn fetch(
        &self,
        record: &CertificateRecord,
        file: CertFile,
        sink: &dyn ArtifactSink,
    ) -> Result<String> {
        let result = match self.api.download(record.download_key(), file).await {
            Ok(bytes) => sink.store(&record.download_file_name(file), &bytes).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(location) => {
                info!(identifier = %record.identifier, file = file.as_param(), location = %location, "Downloaded");
                Ok(location)
            }
            Err(e) => {
                warn!(identifier = %record.identifier, error = %e, "Download failed");
                self.notifier.notify(Notice::error(e.notice_message()));
                Err(e)
            }
        }
    }

    fn known(&self, identifier: &str) -> Result<CertificateRecord> {
        self.get(identifier.trim()).ok_or_else(|| {
            SslinkerError::validation(format!("Certificate '{}' not found", identifier.trim()))
        })
    }
}

fn check_download(record: &CertificateRecord, file: CertFile) -> Result<()> {
    if file == CertFile::Key {
        if record.is_root_ca() {
            return Err(SslinkerError::validation("The root CA private key cannot be downloaded"));
        }
        if !record.has_private_key {
            return Err(SslinkerError::validation(format!(
                "No private key is stored for '{}'",
                record.identifier
            )));
        }
    }
    Ok(())
}

fn checked_file_name(path: &Path, extensions: &[&str], field: &str) -> Result<String> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| SslinkerError::validation_field("A file is required", field))?;
    let extension = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    if !extensions.contains(&extension.as_str()) {
        return Err(SslinkerError::validation_field(
            format!("'{name}' must have one of these extensions: {}", extensions.join(", ")),
            field,
        ));
    }
    Ok(name.to_string())
}

fn file_stem(file_name: &str) -> String {
    Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name)
        .to_string()
}

async fn read_file(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .map_err(|e| SslinkerError::io(format!("Failed to read {}", path.display()), e))
}
