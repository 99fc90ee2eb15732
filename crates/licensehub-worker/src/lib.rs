//! Background tasks for LicenseHub.
//!
//! This crate provides:
//! - A cron scheduler for periodic tasks
//! - The expiry sweep that persists elapsed wall-clock licenses
//! - A runner that ties the scheduler to the server's shutdown signal

pub mod jobs;
pub mod runner;
pub mod scheduler;

pub use runner::WorkerRunner;
pub use scheduler::CronScheduler;
