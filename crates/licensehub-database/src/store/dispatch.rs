//! Backend selection for the license store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::info;

use licensehub_core::config::{AppConfig, StoreBackend};
use licensehub_core::error::AppError;
use licensehub_core::result::AppResult;
use licensehub_core::types::PageRequest;
use licensehub_entity::license::License;

use crate::connection::DatabasePool;

use super::memory::MemoryLicenseStore;
use super::postgres::PgLicenseStore;
use super::{LicenseStats, LicenseStore, PutOutcome};

/// Dispatcher over the available store backends.
#[derive(Debug, Clone)]
pub enum LicenseStoreDispatch {
    /// PostgreSQL store (multi-node).
    Postgres(PgLicenseStore),
    /// In-memory store (single node).
    Memory(MemoryLicenseStore),
}

impl LicenseStoreDispatch {
    /// Pick the backend named in configuration. The postgres backend needs
    /// a connected pool.
    pub fn from_config(config: &AppConfig, db: Option<&DatabasePool>) -> AppResult<Self> {
        match (config.license.store, db) {
            (StoreBackend::Postgres, Some(db)) => {
                info!("Using PostgreSQL license store");
                Ok(Self::Postgres(PgLicenseStore::new(db.pool().clone())))
            }
            (StoreBackend::Postgres, None) => Err(AppError::configuration(
                "license.store = \"postgres\" requires a database connection",
            )),
            (StoreBackend::Memory, _) => {
                info!("Using in-memory license store; licenses are lost on restart");
                Ok(Self::Memory(MemoryLicenseStore::new()))
            }
        }
    }
}

#[async_trait]
impl LicenseStore for LicenseStoreDispatch {
    async fn get(&self, key: &str) -> AppResult<Option<License>> {
        match self {
            Self::Postgres(inner) => inner.get(key).await,
            Self::Memory(inner) => inner.get(key).await,
        }
    }

    async fn find_by_order(&self, order_id: &str) -> AppResult<Option<License>> {
        match self {
            Self::Postgres(inner) => inner.find_by_order(order_id).await,
            Self::Memory(inner) => inner.find_by_order(order_id).await,
        }
    }

    async fn put(&self, license: &License) -> AppResult<PutOutcome> {
        match self {
            Self::Postgres(inner) => inner.put(license).await,
            Self::Memory(inner) => inner.put(license).await,
        }
    }

    async fn compare_and_swap(
        &self,
        expected_version: i64,
        license: &License,
    ) -> AppResult<bool> {
        match self {
            Self::Postgres(inner) => inner.compare_and_swap(expected_version, license).await,
            Self::Memory(inner) => inner.compare_and_swap(expected_version, license).await,
        }
    }

    async fn list(&self, page: PageRequest) -> AppResult<(Vec<License>, u64)> {
        match self {
            Self::Postgres(inner) => inner.list(page).await,
            Self::Memory(inner) => inner.list(page).await,
        }
    }

    async fn list_expiry_candidates(
        &self,
        issued_before: DateTime<Utc>,
    ) -> AppResult<Vec<License>> {
        match self {
            Self::Postgres(inner) => inner.list_expiry_candidates(issued_before).await,
            Self::Memory(inner) => inner.list_expiry_candidates(issued_before).await,
        }
    }

    async fn stats(&self) -> AppResult<LicenseStats> {
        match self {
            Self::Postgres(inner) => inner.stats().await,
            Self::Memory(inner) => inner.stats().await,
        }
    }

    async fn health_check(&self) -> AppResult<bool> {
        match self {
            Self::Postgres(inner) => inner.health_check().await,
            Self::Memory(inner) => inner.health_check().await,
        }
    }

    fn backend(&self) -> &'static str {
        match self {
            Self::Postgres(inner) => inner.backend(),
            Self::Memory(inner) => inner.backend(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_backend_from_default_config() {
        let store = LicenseStoreDispatch::from_config(&AppConfig::default(), None).unwrap();
        assert_eq!(store.backend(), "memory");
    }

    #[test]
    fn test_postgres_backend_needs_pool() {
        let mut config = AppConfig::default();
        config.license.store = StoreBackend::Postgres;
        assert!(LicenseStoreDispatch::from_config(&config, None).is_err());
    }
}
