//! PostgreSQL license store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;

use licensehub_core::error::{AppError, ErrorKind};
use licensehub_core::result::AppResult;
use licensehub_core::types::PageRequest;
use licensehub_entity::license::{License, LicenseStatus};

use super::{LicenseStats, LicenseStore, PutOutcome};

/// Unique constraint on `licenses.order_id`.
const ORDER_ID_CONSTRAINT: &str = "licenses_order_id_unique";
/// Primary key constraint on `licenses.license_key`.
const PRIMARY_KEY_CONSTRAINT: &str = "licenses_pkey";

/// License store backed by the `licenses` table.
#[derive(Debug, Clone)]
pub struct PgLicenseStore {
    pool: PgPool,
}

impl PgLicenseStore {
    /// Create a new PostgreSQL license store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LicenseStore for PgLicenseStore {
    async fn get(&self, key: &str) -> AppResult<Option<License>> {
        sqlx::query_as::<_, License>("SELECT * FROM licenses WHERE license_key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find license", e))
    }

    async fn find_by_order(&self, order_id: &str) -> AppResult<Option<License>> {
        sqlx::query_as::<_, License>("SELECT * FROM licenses WHERE order_id = $1")
            .bind(order_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find license by order", e)
            })
    }

    async fn put(&self, license: &License) -> AppResult<PutOutcome> {
        let result = sqlx::query(
            "INSERT INTO licenses (license_key, email, order_id, kind, allotted_seconds, \
             consumed_seconds, status, issued_at, updated_at, version) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(&license.key)
        .bind(&license.email)
        .bind(&license.order_id)
        .bind(license.kind)
        .bind(license.allotted_seconds)
        .bind(license.consumed_seconds)
        .bind(license.status)
        .bind(license.issued_at)
        .bind(license.updated_at)
        .bind(license.version)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(PutOutcome::Inserted),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                match db_err.constraint() {
                    Some(ORDER_ID_CONSTRAINT) => Ok(PutOutcome::DuplicateOrder),
                    Some(PRIMARY_KEY_CONSTRAINT) => Ok(PutOutcome::DuplicateKey),
                    other => Err(AppError::database(format!(
                        "Unexpected unique violation on constraint {other:?}"
                    ))),
                }
            }
            Err(e) => Err(AppError::with_source(
                ErrorKind::Database,
                "Failed to insert license",
                e,
            )),
        }
    }

    async fn compare_and_swap(
        &self,
        expected_version: i64,
        license: &License,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE licenses SET consumed_seconds = $3, status = $4, updated_at = $5, \
             version = version + 1 \
             WHERE license_key = $1 AND version = $2",
        )
        .bind(&license.key)
        .bind(expected_version)
        .bind(license.consumed_seconds)
        .bind(license.status)
        .bind(license.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update license", e))?;

        let swapped = result.rows_affected() == 1;
        if !swapped {
            debug!(expected_version, "License compare-and-swap lost");
        }
        Ok(swapped)
    }

    async fn list(&self, page: PageRequest) -> AppResult<(Vec<License>, u64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM licenses")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to count licenses", e)
            })?;

        let items = sqlx::query_as::<_, License>(
            "SELECT * FROM licenses ORDER BY issued_at DESC, license_key ASC LIMIT $1 OFFSET $2",
        )
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list licenses", e))?;

        Ok((items, total as u64))
    }

    async fn list_expiry_candidates(
        &self,
        issued_before: DateTime<Utc>,
    ) -> AppResult<Vec<License>> {
        sqlx::query_as::<_, License>(
            "SELECT * FROM licenses WHERE status = 'active' \
             AND (kind <> 'purchase' OR issued_at <= $1)",
        )
        .bind(issued_before)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(
                ErrorKind::Database,
                "Failed to list licenses due for expiry",
                e,
            )
        })
    }

    async fn stats(&self) -> AppResult<LicenseStats> {
        let rows: Vec<(LicenseStatus, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM licenses GROUP BY status")
                .fetch_all(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to count licenses", e)
                })?;

        let mut stats = LicenseStats::default();
        for (status, count) in rows {
            let count = count as u64;
            stats.total += count;
            match status {
                LicenseStatus::Active => stats.active = count,
                LicenseStatus::Expired => stats.expired = count,
                LicenseStatus::Revoked => stats.revoked = count,
            }
        }
        Ok(stats)
    }

    async fn health_check(&self) -> AppResult<bool> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|v| v == 1)
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Health check failed", e))
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}
