//! Server-side price list.

use licensehub_core::config::PricingConfig;
use licensehub_core::error::AppError;
use licensehub_core::result::AppResult;
use licensehub_entity::order::Quote;

/// Price lookups backed by the configured table.
#[derive(Debug, Clone)]
pub struct PriceList {
    config: PricingConfig,
}

impl PriceList {
    /// Creates a price list.
    pub fn new(config: PricingConfig) -> Self {
        Self { config }
    }

    /// Product name shown at checkout.
    pub fn product_name(&self) -> &str {
        &self.config.product_name
    }

    /// Price for `hours`, or a validation error if it is not offered.
    pub fn quote(&self, hours: u32) -> AppResult<Quote> {
        self.config
            .price_cents(hours)
            .map(|amount_cents| Quote {
                hours,
                amount_cents,
                currency: self.config.currency.clone(),
            })
            .ok_or_else(|| AppError::validation(format!("{hours} hour package is not offered")))
    }

    /// Every offered package, ordered by hours.
    pub fn quotes(&self) -> Vec<Quote> {
        let mut quotes: Vec<Quote> = self
            .config
            .table
            .iter()
            .filter_map(|(hours, cents)| {
                hours.parse::<u32>().ok().map(|hours| Quote {
                    hours,
                    amount_cents: *cents,
                    currency: self.config.currency.clone(),
                })
            })
            .collect();
        quotes.sort_by_key(|q| q.hours);
        quotes
    }

    /// Whether a provider-reported charge matches the price for `hours`.
    pub fn matches(&self, hours: u32, amount_cents: i64, currency: &str) -> bool {
        self.config.price_cents(hours) == Some(amount_cents)
            && self.config.currency.eq_ignore_ascii_case(currency)
    }
}
