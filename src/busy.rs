//! In-flight guards for operator actions
//!
//! Every mutating action holds a guard for the duration of its request(s). A
//! second submission of the same action while the first is still running is
//! rejected instead of being queued, the same way a front end disables the
//! triggering control until the call settles.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::errors::{Result, SslinkerError};

/// Loading flag for one action.
#[derive(Debug, Clone)]
pub struct InFlight {
    action: &'static str,
    flag: Arc<AtomicBool>,
}

impl InFlight {
    pub fn new(action: &'static str) -> Self {
        Self { action, flag: Arc::new(AtomicBool::new(false)) }
    }

    /// Mark the action as running, or fail with [`SslinkerError::Busy`].
    ///
    /// The flag is released when the returned guard drops, on success and on
    /// failure alike.
    pub fn acquire(&self) -> Result<InFlightGuard> {
        if self.flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).is_err() {
            return Err(SslinkerError::busy(self.action));
        }
        Ok(InFlightGuard { flag: Arc::clone(&self.flag) })
    }

    pub fn is_running(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    pub fn action(&self) -> &'static str {
        self.action
    }
}

/// Releases the loading flag on drop.
#[derive(Debug)]
pub struct InFlightGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
