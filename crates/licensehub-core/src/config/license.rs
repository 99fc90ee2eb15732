//! License lifecycle configuration.

use serde::{Deserialize, Serialize};

/// Which license store backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// PostgreSQL via sqlx.
    Postgres,
    /// In-process map. Single node only; state is lost on restart.
    Memory,
}

/// License issuing and accounting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LicenseConfig {
    /// Store backend.
    #[serde(default = "default_store")]
    pub store: StoreBackend,
    /// Prefix prepended to every generated key.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    /// Trial window in seconds.
    #[serde(default = "default_trial_seconds")]
    pub trial_seconds: i64,
    /// Largest elapsed value accepted from a single usage report.
    /// Larger reports are clamped to this value.
    #[serde(default = "default_max_usage_report")]
    pub max_usage_report_seconds: i64,
    /// Compare-and-swap attempts before a usage report is dropped.
    #[serde(default = "default_cas_retries")]
    pub cas_retries: u32,
}

impl Default for LicenseConfig {
    fn default() -> Self {
        Self {
            store: default_store(),
            key_prefix: default_key_prefix(),
            trial_seconds: default_trial_seconds(),
            max_usage_report_seconds: default_max_usage_report(),
            cas_retries: default_cas_retries(),
        }
    }
}

fn default_store() -> StoreBackend {
    StoreBackend::Memory
}

fn default_key_prefix() -> String {
    "CC".to_string()
}

fn default_trial_seconds() -> i64 {
    300
}

fn default_max_usage_report() -> i64 {
    3600
}

fn default_cas_retries() -> u32 {
    8
}
