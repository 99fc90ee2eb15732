//! Persists `expired` for wall-clock licenses whose window has elapsed.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use tracing::{debug, error, info};

use licensehub_service::LicenseManager;

/// Expiry sweep. Overlapping runs are skipped.
#[derive(Debug)]
pub struct ExpirySweepJob {
    /// License lifecycle manager.
    manager: Arc<LicenseManager>,
    /// Set while a sweep is in progress.
    running: AtomicBool,
}

impl ExpirySweepJob {
    /// Create a new expiry sweep.
    pub fn new(manager: Arc<LicenseManager>) -> Self {
        Self {
            manager,
            running: AtomicBool::new(false),
        }
    }

    /// Run one sweep. Returns the number of licenses expired, or `None`
    /// when another sweep was already running or the sweep failed.
    pub async fn run(&self) -> Option<u64> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Expiry sweep already running; skipping");
            return None;
        }

        let started = Instant::now();
        let result = self.manager.expire_elapsed().await;
        self.running.store(false, Ordering::Release);

        match result {
            Ok(count) => {
                if count > 0 {
                    info!(
                        expired = count,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Expiry sweep complete"
                    );
                } else {
                    debug!("Expiry sweep found nothing to expire");
                }
                Some(count)
            }
            Err(e) => {
                error!(error = %e, "Expiry sweep failed");
                None
            }
        }
    }
}
