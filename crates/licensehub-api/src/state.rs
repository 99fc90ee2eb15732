//! Application state shared across all handlers and middleware.

use std::sync::Arc;
use std::time::Instant;

use licensehub_core::config::AppConfig;
use licensehub_service::{LicenseManager, PurchaseService};

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    // ── Configuration ────────────────────────────────────────
    /// Application configuration
    pub config: Arc<AppConfig>,

    // ── Services ─────────────────────────────────────────────
    /// License lifecycle manager
    pub licenses: Arc<LicenseManager>,
    /// Purchase flow (checkout, confirmation, webhooks)
    pub purchases: Arc<PurchaseService>,

    /// When the process started serving
    pub started_at: Instant,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(
        config: Arc<AppConfig>,
        licenses: Arc<LicenseManager>,
        purchases: Arc<PurchaseService>,
    ) -> Self {
        Self {
            config,
            licenses,
            purchases,
            started_at: Instant::now(),
        }
    }

    /// Seconds since the state was built.
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
