//! Order and pricing value objects.

pub mod quote;

pub use quote::Quote;
