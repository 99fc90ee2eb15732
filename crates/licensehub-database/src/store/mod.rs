//! License store abstraction and its backends.
//!
//! Every mutation goes through [`LicenseStore::put`] (atomic
//! check-and-insert on both key and order id) or
//! [`LicenseStore::compare_and_swap`] (versioned replace). Callers do a
//! read-modify-write loop on top of these; there is no global lock.

pub mod dispatch;
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use licensehub_core::result::AppResult;
use licensehub_core::types::PageRequest;
use licensehub_entity::license::License;

pub use dispatch::LicenseStoreDispatch;
pub use memory::MemoryLicenseStore;
pub use postgres::PgLicenseStore;

/// Outcome of an insert attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    /// The license was stored.
    Inserted,
    /// Another license already carries this order id. Nothing was stored.
    DuplicateOrder,
    /// Another license already carries this key. Nothing was stored.
    DuplicateKey,
}

/// Aggregate counts by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseStats {
    /// All licenses ever issued.
    pub total: u64,
    /// Licenses with status `active`.
    pub active: u64,
    /// Licenses with status `expired`.
    pub expired: u64,
    /// Licenses with status `revoked`.
    pub revoked: u64,
}

/// Keyed license repository.
///
/// Implementations must be safe to call concurrently from many tasks.
#[async_trait]
pub trait LicenseStore: Send + Sync + std::fmt::Debug {
    /// Fetch a license by key.
    async fn get(&self, key: &str) -> AppResult<Option<License>>;

    /// Fetch the license issued for an order id.
    async fn find_by_order(&self, order_id: &str) -> AppResult<Option<License>>;

    /// Insert a new license unless its key or order id is already taken.
    async fn put(&self, license: &License) -> AppResult<PutOutcome>;

    /// Replace the stored license if its version still equals
    /// `expected_version`. The stored row receives
    /// `expected_version + 1`. Returns `false` on a lost race or a
    /// missing key.
    async fn compare_and_swap(
        &self,
        expected_version: i64,
        license: &License,
    ) -> AppResult<bool>;

    /// One page of licenses, newest first, plus the total count.
    async fn list(&self, page: PageRequest) -> AppResult<(Vec<License>, u64)>;

    /// Active licenses that may have reached their calendar end: every
    /// wall-clock license, plus any license issued at or before
    /// `issued_before`.
    async fn list_expiry_candidates(
        &self,
        issued_before: DateTime<Utc>,
    ) -> AppResult<Vec<License>>;

    /// Counts by status.
    async fn stats(&self) -> AppResult<LicenseStats>;

    /// Check that the backend is reachable.
    async fn health_check(&self) -> AppResult<bool>;

    /// Short backend name for logs and health output.
    fn backend(&self) -> &'static str;
}
