//! Workflow run state machine
//!
//! A [`WorkflowRun`] only ever moves forward. Transitions are pure: they touch
//! the run and nothing else, which keeps the engine's I/O separate from the
//! ordering rules.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::errors::{Result, SslinkerError};

/// Stages of one provisioning run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStage {
    CheckingCa,
    IssuingCa,
    IssuingCert,
    CreatingRoute,
    Succeeded,
    Failed,
}

impl WorkflowStage {
    fn order(self) -> u8 {
        match self {
            WorkflowStage::CheckingCa => 0,
            WorkflowStage::IssuingCa => 1,
            WorkflowStage::IssuingCert => 2,
            WorkflowStage::CreatingRoute => 3,
            WorkflowStage::Succeeded => 4,
            WorkflowStage::Failed => 5,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, WorkflowStage::Succeeded | WorkflowStage::Failed)
    }

    pub fn label(self) -> &'static str {
        match self {
            WorkflowStage::CheckingCa => "checking CA",
            WorkflowStage::IssuingCa => "issuing CA",
            WorkflowStage::IssuingCert => "issuing certificate",
            WorkflowStage::CreatingRoute => "creating route",
            WorkflowStage::Succeeded => "succeeded",
            WorkflowStage::Failed => "failed",
        }
    }
}

impl std::fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Where and why a run stopped
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageFailure {
    pub stage: WorkflowStage,
    pub message: String,
}

/// One execution of the provisioning workflow.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowRun {
    pub target_host: String,
    pub target_origin: String,
    pub stage: WorkflowStage,
    /// Every stage entered, in order
    pub history: Vec<WorkflowStage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<StageFailure>,
    /// Root CA already existed, issuance skipped
    pub ca_reused: bool,
    /// Leaf certificate already existed, issuance skipped
    pub cert_reused: bool,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    /// `"<origin host> <target host>"` line for the operator's hosts file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hosts_line: Option<String>,
    /// Location the root CA certificate was saved to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ca_certificate: Option<String>,
}

impl WorkflowRun {
    /// New run positioned at [`WorkflowStage::CheckingCa`]
    pub fn start(target_host: impl Into<String>, target_origin: impl Into<String>) -> Self {
        Self {
            target_host: target_host.into(),
            target_origin: target_origin.into(),
            stage: WorkflowStage::CheckingCa,
            history: vec![WorkflowStage::CheckingCa],
            failure: None,
            ca_reused: false,
            cert_reused: false,
            started_at: Utc::now(),
            finished_at: None,
            hosts_line: None,
            ca_certificate: None,
        }
    }

    /// Move forward to `next`.
    ///
    /// Stages may be skipped but never revisited, terminal stages accept no
    /// transition, and `Failed` is only reachable through [`WorkflowRun::fail`].
    pub fn advance(&mut self, next: WorkflowStage) -> Result<()> {
        if self.stage.is_terminal()
            || next == WorkflowStage::Failed
            || next.order() <= self.stage.order()
        {
            return Err(SslinkerError::invalid_transition(self.stage, next));
        }
        self.stage = next;
        self.history.push(next);
        if next.is_terminal() {
            self.finished_at = Some(Utc::now());
        }
        Ok(())
    }

    /// Finish successfully, recording the hosts guidance line
    pub fn succeed(&mut self, hosts_line: impl Into<String>) -> Result<()> {
        self.advance(WorkflowStage::Succeeded)?;
        self.hosts_line = Some(hosts_line.into());
        Ok(())
    }

    /// Stop at the current stage with `message`
    pub fn fail(&mut self, message: impl Into<String>) -> Result<()> {
        if self.stage.is_terminal() {
            return Err(SslinkerError::invalid_transition(self.stage, WorkflowStage::Failed));
        }
        self.failure = Some(StageFailure { stage: self.stage, message: message.into() });
        self.stage = WorkflowStage::Failed;
        self.history.push(WorkflowStage::Failed);
        self.finished_at = Some(Utc::now());
        Ok(())
    }

    pub fn is_success(&self) -> bool {
        self.stage == WorkflowStage::Succeeded
    }

    /// Stage the run failed in, if it failed
    pub fn failed_stage(&self) -> Option<WorkflowStage> {
        self.failure.as_ref().map(|f| f.stage)
    }
}
