//! Price table configuration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Server-side price table. Hours map to a price in the smallest
/// currency unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    /// ISO currency code sent to the payment provider.
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Product name shown on the checkout page.
    #[serde(default = "default_product_name")]
    pub product_name: String,
    /// Hours -> price in cents. Keys are strings so the table can be
    /// written as a TOML table.
    #[serde(default = "default_table")]
    pub table: BTreeMap<String, i64>,
}

impl PricingConfig {
    /// Price in cents for the given number of hours, if offered.
    pub fn price_cents(&self, hours: u32) -> Option<i64> {
        self.table.get(&hours.to_string()).copied()
    }
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            currency: default_currency(),
            product_name: default_product_name(),
            table: default_table(),
        }
    }
}

fn default_currency() -> String {
    "usd".to_string()
}

fn default_product_name() -> String {
    "CyberCrack License".to_string()
}

fn default_table() -> BTreeMap<String, i64> {
    [(1, 999), (2, 1999), (3, 2999), (4, 3700), (5, 4500)]
        .into_iter()
        .map(|(hours, cents)| (hours.to_string(), cents))
        .collect()
}
