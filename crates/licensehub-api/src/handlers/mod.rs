//! Route handlers organized by domain.

pub mod admin;
pub mod health;
pub mod license;
pub mod pricing;
pub mod purchase;
pub mod trial;
pub mod webhook;
