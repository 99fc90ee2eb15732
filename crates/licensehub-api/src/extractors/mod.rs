//! Custom Axum extractors.

pub mod admin;
pub mod pagination;

pub use admin::AdminAuth;
pub use pagination::PaginationParams;
