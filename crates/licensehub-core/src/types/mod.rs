//! Core type definitions used across the LicenseHub workspace.

pub mod pagination;
pub mod response;

pub use pagination::{PageRequest, PageResponse};
pub use response::{ApiErrorResponse, ApiResponse};
