//! License schema migrations.
//!
//! SQL files live in the workspace `migrations/` directory and are embedded
//! at compile time.

use serde::Serialize;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use tracing::info;

use licensehub_core::error::{AppError, ErrorKind};
use licensehub_core::result::AppResult;

static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

/// One embedded migration and whether the database has applied it.
#[derive(Debug, Clone, Serialize)]
pub struct MigrationStatus {
    /// Migration version (timestamp prefix of the file name).
    pub version: i64,
    /// Description taken from the file name.
    pub description: String,
    /// Whether the migration has been applied successfully.
    pub applied: bool,
}

/// Apply pending migrations and check that the `licenses` table exists.
pub async fn run_migrations(pool: &PgPool) -> AppResult<()> {
    info!(
        embedded = MIGRATOR.iter().count(),
        "Applying license schema migrations..."
    );

    MIGRATOR.run(pool).await.map_err(|e| {
        AppError::with_source(
            ErrorKind::Database,
            format!("Failed to run migrations: {e}"),
            e,
        )
    })?;

    if !table_exists(pool, "public.licenses").await? {
        return Err(AppError::database(
            "Migrations finished but the licenses table is missing",
        ));
    }

    info!("License schema is up to date");
    Ok(())
}

/// Every embedded migration with its applied state.
pub async fn migration_status(pool: &PgPool) -> AppResult<Vec<MigrationStatus>> {
    let applied: Vec<i64> = if table_exists(pool, "public._sqlx_migrations").await? {
        sqlx::query_scalar("SELECT version FROM _sqlx_migrations WHERE success")
            .fetch_all(pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to read migration history", e)
            })?
    } else {
        Vec::new()
    };

    Ok(statuses(&applied))
}

fn statuses(applied: &[i64]) -> Vec<MigrationStatus> {
    MIGRATOR
        .iter()
        .map(|m| MigrationStatus {
            version: m.version,
            description: m.description.to_string(),
            applied: applied.contains(&m.version),
        })
        .collect()
}

async fn table_exists(pool: &PgPool, name: &str) -> AppResult<bool> {
    sqlx::query_scalar("SELECT to_regclass($1) IS NOT NULL")
        .bind(name)
        .fetch_one(pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to inspect schema", e))
}
