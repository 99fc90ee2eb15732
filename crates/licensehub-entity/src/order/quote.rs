//! Price quote value object.

use serde::{Deserialize, Serialize};

/// Seconds in one purchased hour.
pub const SECONDS_PER_HOUR: i64 = 3600;

/// A server-side price for a number of usage hours.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    /// Purchased hours.
    pub hours: u32,
    /// Price in the smallest currency unit.
    pub amount_cents: i64,
    /// ISO currency code.
    pub currency: String,
}

impl Quote {
    /// Usage allotment bought by this quote, in seconds.
    pub fn allotted_seconds(&self) -> i64 {
        i64::from(self.hours) * SECONDS_PER_HOUR
    }

    /// Price rendered as a decimal string, e.g. `"19.99"`.
    pub fn display_amount(&self) -> String {
        format!("{}.{:02}", self.amount_cents / 100, self.amount_cents % 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_helpers() {
        let quote = Quote {
            hours: 2,
            amount_cents: 1999,
            currency: "usd".to_string(),
        };
        assert_eq!(quote.allotted_seconds(), 7200);
        assert_eq!(quote.display_amount(), "19.99");
    }
}
