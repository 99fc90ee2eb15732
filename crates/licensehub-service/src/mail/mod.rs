//! License e-mail delivery.

pub mod log;
pub mod mailersend;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use licensehub_core::config::{AppConfig, MailProvider};
use licensehub_core::error::{AppError, ErrorKind};
use licensehub_core::result::AppResult;

pub use self::log::LogMailer;
pub use self::mailersend::MailerSendMailer;

/// The message sent to a buyer once their license exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LicenseEmail {
    /// Recipient address.
    pub to_email: String,
    /// Recipient name.
    pub to_name: String,
    /// The issued key.
    pub license_key: String,
    /// Order reference.
    pub order_id: String,
    /// Human-readable allotment, e.g. `"2 hours of usage"`.
    pub allotment: String,
}

impl LicenseEmail {
    /// Subject line.
    pub fn subject(&self) -> &'static str {
        "Your CyberCrack License Key"
    }

    /// Plain-text body.
    pub fn text_body(&self) -> String {
        format!(
            "Hello {name},\n\n\
             Thank you for purchasing CyberCrack! Your license key is ready.\n\n\
             License Key: {key}\n\
             Order ID: {order}\n\
             Includes: {allotment}\n\n\
             Installation Instructions:\n\
             1. Download the CyberCrack software from our website\n\
             2. Run the installer and follow the on-screen instructions\n\
             3. When prompted, enter your license key\n\n\
             Thank you for choosing CyberCrack!\n",
            name = self.to_name,
            key = self.license_key,
            order = self.order_id,
            allotment = self.allotment,
        )
    }

    /// HTML body.
    pub fn html_body(&self) -> String {
        format!(
            "<p>Hello {name},</p>\
             <p>Thank you for purchasing CyberCrack! Your license key is ready.</p>\
             <pre style=\"background:#f0f0f0;padding:15px;font-size:16px\">{key}</pre>\
             <p>Order ID: {order}<br>Includes: {allotment}</p>\
             <ol><li>Download the CyberCrack software from our website</li>\
             <li>Run the installer and follow the on-screen instructions</li>\
             <li>When prompted, enter your license key</li></ol>",
            name = escape_html(&self.to_name),
            key = escape_html(&self.license_key),
            order = escape_html(&self.order_id),
            allotment = escape_html(&self.allotment),
        )
    }
}

/// Sends license e-mails.
#[async_trait]
pub trait LicenseMailer: Send + Sync + std::fmt::Debug {
    /// Deliver the message.
    async fn send_license(&self, email: &LicenseEmail) -> AppResult<()>;

    /// Short provider name for logs.
    fn provider(&self) -> &'static str;
}

/// Build the mailer named in configuration.
pub fn build_mailer(config: &AppConfig) -> AppResult<Arc<dyn LicenseMailer>> {
    match config.mail.provider {
        MailProvider::Mailersend => {
            if config.mail.api_key.is_empty() {
                return Err(AppError::configuration(
                    "mail.api_key is required for the mailersend provider",
                ));
            }
            let http = reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Configuration, "Failed to build HTTP client", e)
                })?;
            Ok(Arc::new(MailerSendMailer::new(http, &config.mail)))
        }
        MailProvider::Log => Ok(Arc::new(LogMailer::new())),
    }
}

fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
