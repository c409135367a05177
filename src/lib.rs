//! # SSLinker
//!
//! Client library and CLI for an SSLinker backend: a local certificate
//! authority and nginx reverse proxy manager that puts HTTPS in front of
//! services on a home or lab network.
//!
//! ## Architecture
//!
//! ```text
//! CLI / any front end → ProvisioningWorkflow, registries → SslinkerApi → backend
//!                              ↓
//!                    Notifier, ArtifactSink
//! ```
//!
//! ## Core Components
//!
//! - **Backend client**: [`SslinkerApi`] trait with a reqwest implementation
//! - **Provisioning workflow**: root CA, leaf certificate and proxy route in one run
//! - **Registries**: cached certificate and route listings with guarded actions
//! - **Validation**: origin normalization and host, IP and address checks
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use sslinker::{
//!     ClientConfig, DirectorySink, ProvisioningWorkflow, Result, SslinkerClient, TracingNotifier,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = SslinkerClient::new(ClientConfig::default())?;
//!     let workflow = ProvisioningWorkflow::new(
//!         Arc::new(client),
//!         Arc::new(TracingNotifier),
//!         Arc::new(DirectorySink::new(".")),
//!     );
//!     let run = workflow.run("app.lan", "127.0.0.1:3000").await?;
//!     println!("{:?}", run.hosts_line);
//!     Ok(())
//! }
//! ```

pub mod artifact;
pub mod busy;
pub mod cli;
pub mod client;
pub mod domain;
pub mod errors;
pub mod notify;
pub mod observability;
pub mod registry;
pub mod validation;
pub mod workflow;

#[cfg(test)]
pub(crate) mod test_utils;

// Re-export commonly used types and traits
pub use artifact::{ArtifactSink, DirectorySink, MemorySink};
pub use client::{ClientConfig, SslinkerApi, SslinkerClient};
pub use domain::{CertKind, CertificateRecord, ProxyRouteRecord, ServiceStatus, ROOT_CA_IDENTIFIER};
pub use errors::{Result, SslinkerError};
pub use notify::{MemoryNotifier, Notice, NoticeLevel, Notifier, TracingNotifier};
pub use registry::{CertificateRegistry, RouteRegistry};
pub use workflow::{ProvisioningWorkflow, WorkflowRun, WorkflowStage};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
