//! Mailer that writes to the log instead of sending.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::info;

use licensehub_core::result::AppResult;

use super::{LicenseEmail, LicenseMailer};
use crate::email::mask_email;
use crate::license::key::mask_key;

/// Logs each message and keeps it in an outbox.
#[derive(Debug, Clone, Default)]
pub struct LogMailer {
    outbox: Arc<Mutex<Vec<LicenseEmail>>>,
}

impl LogMailer {
    /// Creates a new log mailer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages "sent" so far.
    pub async fn sent(&self) -> Vec<LicenseEmail> {
        self.outbox.lock().await.clone()
    }
}

#[async_trait]
impl LicenseMailer for LogMailer {
    async fn send_license(&self, email: &LicenseEmail) -> AppResult<()> {
        info!(
            to = %mask_email(&email.to_email),
            key = %mask_key(&email.license_key),
            order_id = %email.order_id,
            "License e-mail (log only)"
        );
        self.outbox.lock().await.push(email.clone());
        Ok(())
    }

    fn provider(&self) -> &'static str {
        "log"
    }
}
