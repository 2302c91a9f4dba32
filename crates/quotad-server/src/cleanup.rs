//! Periodic expiry sweeps over a shared list.
//!
//! The task holds only a `Weak` reference: dropping the last owning `Arc`
//! makes the next tick's upgrade fail and the task exit on its own.

use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;

use quotad_core::{QuotadError, RateLimit, Result, SharedRateLimit};

/// Handle to an installed cleanup task. Dropping it aborts the task, so
/// installing a replacement cancels the previous one.
#[derive(Debug)]
pub struct CleanupTask {
    handle: JoinHandle<()>,
}

impl CleanupTask {
    /// Cancel explicitly.
    pub fn cancel(self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for CleanupTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Schedule a recurring `cleanup()` every `interval` on the tokio runtime.
pub fn install_cleanup(list: &SharedRateLimit, interval: Duration) -> Result<CleanupTask> {
    if interval.is_zero() {
        return Err(QuotadError::InvalidInterval);
    }

    let weak: Weak<Mutex<RateLimit>> = Arc::downgrade(list);
    let handle = tokio::spawn(async move {
        loop {
            tokio::time::sleep(interval).await;
            let Some(list) = weak.upgrade() else { break };
            let mut list = match list.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            let pruned = list.cleanup();
            if pruned > 0 {
                tracing::debug!(pruned, "cleanup pass");
            }
        }
        tracing::debug!("cleanup task finished");
    });

    Ok(CleanupTask { handle })
}
