//! # Provisioning Workflow
//!
//! One-click provisioning: root CA, leaf certificate and proxy route for a
//! single host, driven as an explicit state machine.

pub mod engine;
pub mod run;

pub use engine::ProvisioningWorkflow;
pub use run::{StageFailure, WorkflowRun, WorkflowStage};
