//! Application builder: wires store, services, worker and router into a
//! running server.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::sync::watch;

use licensehub_core::config::{AppConfig, StoreBackend};
use licensehub_core::error::AppError;
use licensehub_core::result::AppResult;
use licensehub_core::traits::SystemClock;
use licensehub_database::{DatabasePool, LicenseStoreDispatch};
use licensehub_service::mail::build_mailer;
use licensehub_service::payment::build_gateway;
use licensehub_service::license::LicenseTokenSigner;
use licensehub_service::{LicenseManager, PurchaseService};
use licensehub_worker::WorkerRunner;

use crate::router::build_router;
use crate::state::AppState;

/// Builds the shared state from configuration.
///
/// `db` is required when `license.store = "postgres"` and ignored otherwise.
pub fn build_state(config: AppConfig, db: Option<&DatabasePool>) -> AppResult<AppState> {
    let store = Arc::new(LicenseStoreDispatch::from_config(&config, db)?);

    let tokens = LicenseTokenSigner::from_config(&config.token)?;
    let licenses = Arc::new(
        LicenseManager::new(store, Arc::new(SystemClock), config.license.clone())
            .with_tokens(tokens),
    );

    let gateway = build_gateway(&config)?;
    let mailer = build_mailer(&config)?;
    tracing::info!(
        payment = gateway.provider(),
        mail = mailer.provider(),
        "Providers configured"
    );

    let purchases = Arc::new(PurchaseService::new(
        &config,
        Arc::clone(&licenses),
        gateway,
        mailer,
    ));

    Ok(AppState::new(Arc::new(config), licenses, purchases))
}

/// Builds the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState) -> Router {
    build_router(state)
}

/// Connects to PostgreSQL when the license store needs it.
pub async fn connect_database(config: &AppConfig) -> AppResult<Option<DatabasePool>> {
    if config.license.store != StoreBackend::Postgres {
        return Ok(None);
    }

    tracing::info!("Connecting to database...");
    let db = DatabasePool::connect(&config.database).await?;

    if config.database.migrate_on_start {
        licensehub_database::migration::run_migrations(db.pool()).await?;
        tracing::info!("Database migrations complete");
    }

    Ok(Some(db))
}

/// Runs the LicenseHub server until Ctrl+C or SIGTERM.
pub async fn run_server(config: AppConfig) -> AppResult<()> {
    tracing::info!("Starting LicenseHub v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Database connection + migrations ─────────────────
    let db = connect_database(&config).await?;

    // ── Step 2: Store, services and providers ────────────────────
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    let worker_config = config.worker.clone();
    let state = build_state(config, db.as_ref())?;

    // ── Step 3: Shutdown channel ─────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ── Step 4: Start background worker ──────────────────────────
    let worker_handle = if worker_config.enabled {
        tracing::info!("Starting background worker...");
        let runner = WorkerRunner::new(&worker_config, Arc::clone(&state.licenses)).await?;
        let worker_cancel = shutdown_rx.clone();
        Some(tokio::spawn(async move {
            runner.run(worker_cancel).await;
        }))
    } else {
        tracing::info!("Background worker disabled");
        None
    };

    // ── Step 5: Build and start HTTP server ──────────────────────
    let app = build_app(state);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!("LicenseHub server listening on {}", addr);

    // ── Step 6: Graceful shutdown ────────────────────────────────
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            tracing::info!("Shutdown signal received, starting graceful shutdown...");
            let _ = shutdown_tx.send(true);
        })
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    // ── Step 7: Wait for background tasks ────────────────────────
    if let Some(handle) = worker_handle {
        tracing::info!("Waiting for background worker to stop...");
        if tokio::time::timeout(grace, handle).await.is_err() {
            tracing::warn!("Background worker did not stop within {}s", grace.as_secs());
        }
    }

    if let Some(db) = db {
        db.close().await;
    }

    tracing::info!("LicenseHub server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
