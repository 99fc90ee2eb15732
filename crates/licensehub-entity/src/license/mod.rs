//! License domain entities.

pub mod activation;
pub mod kind;
pub mod model;
pub mod status;

pub use activation::ActivationResult;
pub use kind::LicenseKind;
pub use model::{License, MAX_ALLOTTED_SECONDS, MAX_VALIDITY_DAYS};
pub use status::LicenseStatus;
