//! # Registries
//!
//! Read-through caches over the backend listings plus the operator actions
//! that mutate them. A cache is only replaced by a successful refresh; a
//! failed action or refresh leaves the previous snapshot in place.

pub mod certs;
pub mod routes;

use std::sync::{Mutex, MutexGuard};
use tracing::{info, warn};

use crate::client::ActionResponse;
use crate::errors::Result;
use crate::notify::{Notice, Notifier};

pub use certs::CertificateRegistry;
pub use routes::{
    hosts_lines, BatchFailure, BatchOutcome, RouteDraft, RouteRegistry, ServiceOutcome,
    WINDOWS_HOSTS_COMMAND,
};

/// Lock a cache, recovering the data if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Turn a backend envelope into the action result and tell the operator.
///
/// `action` names the operation in logs and stands in for an empty success
/// message.
pub(crate) fn settle(
    notifier: &dyn Notifier,
    action: &str,
    outcome: Result<ActionResponse>,
) -> Result<String> {
    match outcome.and_then(ActionResponse::into_result) {
        Ok(message) => {
            let message = if message.trim().is_empty() { format!("{action} succeeded") } else { message };
            info!(action, message = %message, "Action succeeded");
            notifier.notify(Notice::success(message.clone()));
            Ok(message)
        }
        Err(e) => {
            warn!(action, error = %e, "Action failed");
            notifier.notify(Notice::error(e.notice_message()));
            Err(e)
        }
    }
}
