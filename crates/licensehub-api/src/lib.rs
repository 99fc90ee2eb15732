//! # licensehub-api
//!
//! HTTP API layer for LicenseHub built on Axum.
//!
//! Provides the REST endpoints used by the web front end and the desktop
//! client, the admin endpoints, middleware (CORS, request logging, body
//! limits), extractors and DTOs.

pub mod app;
pub mod dto;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{build_app, build_state, run_server};
pub use state::AppState;
