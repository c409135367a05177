//! Notification port
//!
//! Actions report their outcome through an injected [`Notifier`] rather than a
//! global surface, so the workflow and registries can be driven from a CLI, a
//! UI or a test with the same code.

use std::sync::{Arc, Mutex};

/// Severity of a notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// A transient message for the operator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info<S: Into<String>>(message: S) -> Self {
        Self { level: NoticeLevel::Info, message: message.into() }
    }

    pub fn success<S: Into<String>>(message: S) -> Self {
        Self { level: NoticeLevel::Success, message: message.into() }
    }

    pub fn error<S: Into<String>>(message: S) -> Self {
        Self { level: NoticeLevel::Error, message: message.into() }
    }
}

/// Receives notices from workflow and registry actions.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Forwards notices to the tracing subscriber
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Info => tracing::info!(notice = %notice.message, "notice"),
            NoticeLevel::Success => tracing::info!(notice = %notice.message, "success"),
            NoticeLevel::Error => tracing::warn!(notice = %notice.message, "failure"),
        }
    }
}

/// Keeps every notice in memory, in arrival order
#[derive(Debug, Clone, Default)]
pub struct MemoryNotifier {
    notices: Arc<Mutex<Vec<Notice>>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the notices received so far
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().map(|n| n.clone()).unwrap_or_default()
    }

    /// Messages of the notices at `level`
    pub fn messages(&self, level: NoticeLevel) -> Vec<String> {
        self.notices().into_iter().filter(|n| n.level == level).map(|n| n.message).collect()
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, notice: Notice) {
        if let Ok(mut notices) = self.notices.lock() {
            notices.push(notice);
        }
    }
}
