//! Cron scheduler for periodic tasks.

use std::sync::Arc;

use tokio_cron_scheduler::{Job as CronJob, JobScheduler};

use licensehub_core::config::WorkerConfig;
use licensehub_core::error::AppError;

use crate::jobs::ExpirySweepJob;

/// Cron-based scheduler for periodic background tasks
#[derive(Clone)]
pub struct CronScheduler {
    /// The underlying job scheduler
    scheduler: JobScheduler,
    /// License expiry sweep
    expiry: Arc<ExpirySweepJob>,
}

impl std::fmt::Debug for CronScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CronScheduler").finish()
    }
}

impl CronScheduler {
    /// Create a new cron scheduler
    pub async fn new(expiry: Arc<ExpirySweepJob>) -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {e}")))?;

        Ok(Self { scheduler, expiry })
    }

    /// Register all scheduled tasks
    pub async fn register_default_tasks(&self, config: &WorkerConfig) -> Result<(), AppError> {
        self.register_expiry_sweep(&config.expiry_sweep_cron).await?;

        tracing::info!("All scheduled tasks registered");
        Ok(())
    }

    /// Start the scheduler
    pub async fn start(&self) -> Result<(), AppError> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {e}")))?;

        tracing::info!("Cron scheduler started");
        Ok(())
    }

    /// Shutdown the scheduler
    pub async fn shutdown(&self) -> Result<(), AppError> {
        let mut scheduler = self.scheduler.clone();
        scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shutdown scheduler: {e}")))?;

        tracing::info!("Cron scheduler shut down");
        Ok(())
    }

    /// License expiry sweep
    async fn register_expiry_sweep(&self, schedule: &str) -> Result<(), AppError> {
        let expiry = Arc::clone(&self.expiry);
        let job = CronJob::new_async(schedule, move |_uuid, _lock| {
            let expiry = Arc::clone(&expiry);
            Box::pin(async move {
                expiry.run().await;
            })
        })
        .map_err(|e| {
            AppError::configuration(format!(
                "Invalid expiry sweep schedule '{schedule}': {e}"
            ))
        })?;

        self.scheduler.add(job).await.map_err(|e| {
            AppError::internal(format!("Failed to add expiry_sweep schedule: {e}"))
        })?;

        tracing::info!(schedule, "Registered: expiry_sweep");
        Ok(())
    }
}
