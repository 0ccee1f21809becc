//! Type-safe price representation using decimal arithmetic.
//!
//! The shop API sends prices as JSON numbers in US dollars. They are parsed
//! into a [`Decimal`] so line subtotals and totals never pick up binary
//! floating-point noise, and written back out as numbers.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Mul};
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Error returned when parsing a price from user input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PriceError {
    /// The input was not a decimal number.
    #[error("invalid price '{0}'")]
    Invalid(String),
    /// The price was below zero.
    #[error("price must not be negative")]
    Negative,
}

/// A price in US dollars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price(Decimal);

impl Price {
    /// A zero price.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create a price from a whole number of cents.
    #[must_use]
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, 2))
    }

    /// Get the decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Format for display, e.g. `$1,234.50`.
    #[must_use]
    pub fn display(&self) -> String {
        let rounded = self
            .0
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        let formatted = format!("{:.2}", rounded.abs());
        let (whole, cents) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));

        let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
        for (i, digit) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(digit);
        }

        let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
            "-"
        } else {
            ""
        };
        format!("{sign}${grouped}.{cents}")
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self(self.0 + other.0)
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl Mul<u32> for Price {
    type Output = Self;

    fn mul(self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_start_matches('$');
        let amount =
            Decimal::from_str(trimmed).map_err(|_| PriceError::Invalid(s.to_string()))?;
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }
        Ok(Self(amount))
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::float::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        rust_decimal::serde::float::deserialize(deserializer).map(Self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_rounds_to_cents() {
        assert_eq!(Price::from_str("12.5").unwrap().display(), "$12.50");
        assert_eq!(Price::from_str("0.005").unwrap().display(), "$0.01");
        assert_eq!(Price::ZERO.display(), "$0.00");
    }

    #[test]
    fn test_display_groups_thousands() {
        assert_eq!(Price::from_cents(123_456_789).display(), "$1,234,567.89");
        assert_eq!(Price::from_cents(100_000).display(), "$1,000.00");
        assert_eq!(Price::from_cents(99_999).display(), "$999.99");
    }

    #[test]
    fn test_from_cents() {
        assert_eq!(Price::from_cents(1999).amount(), Decimal::new(1999, 2));
    }

    #[test]
    fn test_multiply_by_quantity() {
        let subtotal = Price::from_str("19.99").unwrap() * 3;
        assert_eq!(subtotal, Price::from_str("59.97").unwrap());
    }

    #[test]
    fn test_sum_of_subtotals() {
        let total: Price = [Price::from_cents(250) * 2, Price::from_cents(1999)]
            .into_iter()
            .sum();
        assert_eq!(total, Price::from_cents(2499));
    }

    #[test]
    fn test_parse_rejects_negative_and_garbage() {
        assert_eq!(Price::from_str("-1"), Err(PriceError::Negative));
        assert!(matches!(Price::from_str("abc"), Err(PriceError::Invalid(_))));
        assert_eq!(Price::from_str("$5").unwrap(), Price::from_cents(500));
    }

    #[test]
    fn test_json_number_roundtrip() {
        let price: Price = serde_json::from_str("12.5").unwrap();
        assert_eq!(price, Price::from_cents(1250));

        let whole: Price = serde_json::from_str("10").unwrap();
        assert_eq!(whole, Price::from_cents(1000));

        let json = serde_json::to_value(Price::from_cents(1250)).unwrap();
        assert!(json.is_number());
    }
}
