//! # licensehub-core
//!
//! Core crate for LicenseHub. Contains configuration schemas, pagination
//! types, the clock abstraction, and the unified error system.
//!
//! This crate has **no** internal dependencies on other LicenseHub crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
