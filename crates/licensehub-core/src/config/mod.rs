//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section.

pub mod admin;
pub mod app;
pub mod database;
pub mod license;
pub mod logging;
pub mod mail;
pub mod payment;
pub mod pricing;
pub mod token;
pub mod worker;

use serde::{Deserialize, Serialize};

pub use self::admin::AdminConfig;
pub use self::app::{CorsConfig, ServerConfig};
pub use self::database::DatabaseConfig;
pub use self::license::{LicenseConfig, StoreBackend};
pub use self::logging::LoggingConfig;
pub use self::mail::{MailConfig, MailProvider};
pub use self::payment::{PaymentConfig, PaymentProvider};
pub use self::pricing::PricingConfig;
pub use self::token::{TokenAlgorithm, TokenConfig};
pub use self::worker::WorkerConfig;

use crate::error::AppError;

/// Environment variable prefix for configuration overrides.
pub const ENV_PREFIX: &str = "LICENSEHUB";

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database connection settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// License lifecycle settings.
    #[serde(default)]
    pub license: LicenseConfig,
    /// Price table.
    #[serde(default)]
    pub pricing: PricingConfig,
    /// Payment provider settings.
    #[serde(default)]
    pub payment: PaymentConfig,
    /// License e-mail delivery settings.
    #[serde(default)]
    pub mail: MailConfig,
    /// Administrative access settings.
    #[serde(default)]
    pub admin: AdminConfig,
    /// Signed license token settings.
    #[serde(default)]
    pub token: TokenConfig,
    /// Background worker settings.
    #[serde(default)]
    pub worker: WorkerConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    ///
    /// Merges the given file, an optional `config/{env}.toml` overlay and
    /// environment variables prefixed with `LICENSEHUB__`
    /// (e.g. `LICENSEHUB__DATABASE__URL`).
    pub fn load(path: &str, env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        app_config.validate()?;
        Ok(app_config)
    }

    /// Cross-section sanity checks that serde defaults cannot express.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.license.store == StoreBackend::Postgres && self.database.url.is_empty() {
            return Err(AppError::configuration(
                "database.url is required when license.store = \"postgres\"",
            ));
        }
        if self.pricing.table.is_empty() {
            return Err(AppError::configuration("pricing.table must not be empty"));
        }
        if self.license.trial_seconds <= 0 {
            return Err(AppError::configuration(
                "license.trial_seconds must be positive",
            ));
        }
        if self.license.max_usage_report_seconds <= 0 {
            return Err(AppError::configuration(
                "license.max_usage_report_seconds must be positive",
            ));
        }
        if self.token.leeway_seconds < 0 {
            return Err(AppError::configuration(
                "token.leeway_seconds must not be negative",
            ));
        }
        if self.payment.provider == PaymentProvider::Stripe && self.payment.secret_key.is_empty()
        {
            return Err(AppError::configuration(
                "payment.secret_key is required for the stripe provider",
            ));
        }
        Ok(())
    }
}
