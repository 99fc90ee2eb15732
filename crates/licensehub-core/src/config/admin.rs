//! Administrative access configuration.

use serde::{Deserialize, Serialize};

/// Admin API access and the purchase allowlist.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminConfig {
    /// Bearer token for `/api/admin/*`. Admin routes reject every request
    /// while this is empty.
    #[serde(default)]
    pub api_token: String,
    /// E-mail addresses whose purchases bypass payment.
    #[serde(default)]
    pub emails: Vec<String>,
}

impl AdminConfig {
    /// Whether `email` is on the admin allowlist (case-insensitive).
    pub fn is_admin_email(&self, email: &str) -> bool {
        let email = email.trim();
        self.emails
            .iter()
            .any(|admin| admin.trim().eq_ignore_ascii_case(email))
    }
}
