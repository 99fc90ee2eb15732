//! License e-mail delivery configuration.

use serde::{Deserialize, Serialize};

/// Which mailer to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MailProvider {
    /// MailerSend HTTP API.
    Mailersend,
    /// Write the message to the log instead of sending it.
    Log,
}

/// Mail configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    /// Provider selection.
    #[serde(default = "default_provider")]
    pub provider: MailProvider,
    /// Provider API key.
    #[serde(default)]
    pub api_key: String,
    /// Sender address.
    #[serde(default = "default_from_email")]
    pub from_email: String,
    /// Sender display name.
    #[serde(default = "default_from_name")]
    pub from_name: String,
    /// Provider API base URL.
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            api_key: String::new(),
            from_email: default_from_email(),
            from_name: default_from_name(),
            api_base: default_api_base(),
        }
    }
}

fn default_provider() -> MailProvider {
    MailProvider::Log
}

fn default_from_email() -> String {
    "noreply@cybercrack.app".to_string()
}

fn default_from_name() -> String {
    "CyberCrack".to_string()
}

fn default_api_base() -> String {
    "https://api.mailersend.com".to_string()
}
