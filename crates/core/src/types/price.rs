//! Type-safe price representation using decimal arithmetic.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from constructing a [`Price`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PriceError {
    /// Prices can never be below zero.
    #[error("price cannot be negative: {0}")]
    Negative(Decimal),
}

/// A non-negative monetary amount in the store currency.
///
/// The remote API exposes bare decimal prices with an implied currency, so
/// the wrapper only enforces the non-negativity invariant and provides
/// display formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// Zero price.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new price.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] if `amount` is below zero.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative(amount));
        }
        Ok(Self(amount))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price for `quantity` units at this unit price.
    #[must_use]
    pub fn line_total(&self, quantity: u32) -> Decimal {
        self.0 * Decimal::from(quantity)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Self::new(amount)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "${:.2}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_negative_amounts() {
        let negative = Decimal::new(-1, 2);
        assert_eq!(Price::new(negative), Err(PriceError::Negative(negative)));
        assert!(Price::new(Decimal::ZERO).is_ok());
    }

    #[test]
    fn line_total_multiplies_by_quantity() {
        let price = Price::new(Decimal::new(1999, 2)).expect("valid price");
        assert_eq!(price.line_total(3), Decimal::new(5997, 2));
        assert_eq!(price.line_total(0), Decimal::ZERO);
    }

    #[test]
    fn displays_with_two_decimals() {
        let price = Price::new(Decimal::from(5)).expect("valid price");
        assert_eq!(price.to_string(), "$5.00");
    }

    #[test]
    fn deserialization_enforces_invariant() {
        let ok: Price = serde_json::from_str("12.5").expect("non-negative parses");
        assert_eq!(ok.amount(), Decimal::new(125, 1));
        assert!(serde_json::from_str::<Price>("-3").is_err());
    }
}
