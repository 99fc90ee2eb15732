//! API integration tests. Each test drives the full router against the
//! in-memory store, the mock payment gateway and the log mailer.

mod admin_test;
mod helpers;
mod license_test;
mod purchase_test;
