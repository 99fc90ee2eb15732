//! Worker runner: owns the scheduler for the lifetime of the server.

use std::sync::Arc;

use tokio::sync::watch;

use licensehub_core::config::WorkerConfig;
use licensehub_core::error::AppError;
use licensehub_service::LicenseManager;

use crate::jobs::ExpirySweepJob;
use crate::scheduler::CronScheduler;

/// Starts scheduled tasks and stops them when shutdown is signalled.
#[derive(Debug)]
pub struct WorkerRunner {
    scheduler: CronScheduler,
    expiry: Arc<ExpirySweepJob>,
}

impl WorkerRunner {
    /// Build the scheduler and register every task.
    pub async fn new(config: &WorkerConfig, manager: Arc<LicenseManager>) -> Result<Self, AppError> {
        let expiry = Arc::new(ExpirySweepJob::new(manager));
        let scheduler = CronScheduler::new(Arc::clone(&expiry)).await?;
        scheduler.register_default_tasks(config).await?;
        Ok(Self { scheduler, expiry })
    }

    /// Run until the cancel signal flips to `true`.
    pub async fn run(self, mut cancel: watch::Receiver<bool>) {
        // Catch up on anything that elapsed while the server was down.
        self.expiry.run().await;

        if let Err(e) = self.scheduler.start().await {
            tracing::error!("Worker failed to start: {}", e);
            return;
        }
        tracing::info!("Worker running");

        while !*cancel.borrow() {
            if cancel.changed().await.is_err() {
                break;
            }
        }

        tracing::info!("Worker received shutdown signal");
        if let Err(e) = self.scheduler.shutdown().await {
            tracing::warn!("Scheduler shutdown failed: {}", e);
        }
    }
}
