//! MailerSend HTTP API mailer.

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, error};

use licensehub_core::config::MailConfig;
use licensehub_core::error::{AppError, ErrorKind};
use licensehub_core::result::AppResult;

use super::{LicenseEmail, LicenseMailer};
use crate::email::mask_email;

/// Sends through `POST /v1/email`.
#[derive(Debug, Clone)]
pub struct MailerSendMailer {
    http: reqwest::Client,
    api_key: String,
    api_base: String,
    from: Address,
}

#[derive(Debug, Clone, Serialize)]
struct Address {
    email: String,
    name: String,
}

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    from: &'a Address,
    to: [Address; 1],
    subject: &'a str,
    text: String,
    html: String,
}

impl MailerSendMailer {
    /// Creates a new MailerSend mailer.
    pub fn new(http: reqwest::Client, config: &MailConfig) -> Self {
        Self {
            http,
            api_key: config.api_key.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            from: Address {
                email: config.from_email.clone(),
                name: config.from_name.clone(),
            },
        }
    }
}

#[async_trait]
impl LicenseMailer for MailerSendMailer {
    async fn send_license(&self, email: &LicenseEmail) -> AppResult<()> {
        let body = SendRequest {
            from: &self.from,
            to: [Address {
                email: email.to_email.clone(),
                name: email.to_name.clone(),
            }],
            subject: email.subject(),
            text: email.text_body(),
            html: email.html_body(),
        };

        let response = self
            .http
            .post(format!("{}/v1/email", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::with_source(ErrorKind::ExternalService, "Mail API unreachable", e))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            error!(%status, detail = %detail, "MailerSend rejected message");
            return Err(AppError::external_service(format!(
                "Mail provider returned {status}"
            )));
        }

        debug!(to = %mask_email(&email.to_email), "License e-mail sent");
        Ok(())
    }

    fn provider(&self) -> &'static str {
        "mailersend"
    }
}
