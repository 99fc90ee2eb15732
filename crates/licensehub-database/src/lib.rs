//! # licensehub-database
//!
//! PostgreSQL connection management, migrations and the license store
//! backends (PostgreSQL and in-memory).

pub mod connection;
pub mod migration;
pub mod store;

pub use connection::DatabasePool;
pub use store::{LicenseStats, LicenseStore, LicenseStoreDispatch, PutOutcome};
