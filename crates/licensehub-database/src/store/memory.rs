//! In-memory license store backed by `DashMap`.
//!
//! Suitable for single-node deployments, development and tests. State is
//! lost on restart.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::debug;

use licensehub_core::result::AppResult;
use licensehub_core::types::PageRequest;
use licensehub_entity::license::{License, LicenseStatus};

use super::{LicenseStats, LicenseStore, PutOutcome};

/// In-memory license store.
///
/// Lock order is always `orders` then `licenses`.
#[derive(Debug, Clone, Default)]
pub struct MemoryLicenseStore {
    /// License key -> license.
    licenses: Arc<DashMap<String, License>>,
    /// Order id -> license key.
    orders: Arc<DashMap<String, String>>,
}

impl MemoryLicenseStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored licenses.
    pub fn len(&self) -> usize {
        self.licenses.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.licenses.is_empty()
    }
}

#[async_trait]
impl LicenseStore for MemoryLicenseStore {
    async fn get(&self, key: &str) -> AppResult<Option<License>> {
        Ok(self.licenses.get(key).map(|entry| entry.value().clone()))
    }

    async fn find_by_order(&self, order_id: &str) -> AppResult<Option<License>> {
        let key = match self.orders.get(order_id) {
            Some(entry) => entry.value().clone(),
            None => return Ok(None),
        };
        self.get(&key).await
    }

    async fn put(&self, license: &License) -> AppResult<PutOutcome> {
        let order_slot = match self.orders.entry(license.order_id.clone()) {
            Entry::Occupied(_) => return Ok(PutOutcome::DuplicateOrder),
            Entry::Vacant(slot) => slot,
        };

        match self.licenses.entry(license.key.clone()) {
            Entry::Occupied(_) => Ok(PutOutcome::DuplicateKey),
            Entry::Vacant(slot) => {
                slot.insert(license.clone());
                order_slot.insert(license.key.clone());
                debug!(order_id = %license.order_id, "License inserted");
                Ok(PutOutcome::Inserted)
            }
        }
    }

    async fn compare_and_swap(
        &self,
        expected_version: i64,
        license: &License,
    ) -> AppResult<bool> {
        match self.licenses.get_mut(&license.key) {
            Some(mut entry) if entry.version == expected_version => {
                let mut next = license.clone();
                next.version = expected_version + 1;
                *entry = next;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list(&self, page: PageRequest) -> AppResult<(Vec<License>, u64)> {
        let mut all: Vec<License> = self
            .licenses
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        all.sort_by(|a, b| b.issued_at.cmp(&a.issued_at).then_with(|| a.key.cmp(&b.key)));

        let total = all.len() as u64;
        let items = all
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect();
        Ok((items, total))
    }

    async fn list_expiry_candidates(
        &self,
        issued_before: DateTime<Utc>,
    ) -> AppResult<Vec<License>> {
        Ok(self
            .licenses
            .iter()
            .filter(|entry| {
                entry.status.is_active()
                    && (entry.kind.is_wall_clock() || entry.issued_at <= issued_before)
            })
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn stats(&self) -> AppResult<LicenseStats> {
        let mut stats = LicenseStats::default();
        for entry in self.licenses.iter() {
            stats.total += 1;
            match entry.status {
                LicenseStatus::Active => stats.active += 1,
                LicenseStatus::Expired => stats.expired += 1,
                LicenseStatus::Revoked => stats.revoked += 1,
            }
        }
        Ok(stats)
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
