//! Prices in Algerian dinars using decimal arithmetic.
//!
//! The backend serializes `DecimalField`s as strings (`"1500.00"`); `Price`
//! accepts both strings and numbers and never goes through floating point.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, Mul};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Currency suffix used when displaying prices.
pub const CURRENCY_SUFFIX: &str = "DA";

/// A price in Algerian dinars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// The zero price.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create a price from a whole number of dinars.
    #[must_use]
    pub fn from_dinars(dinars: i64) -> Self {
        Self(Decimal::from(dinars))
    }

    /// Get the underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price of `quantity` units at this unit price.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }

    /// Whether this price is strictly negative.
    #[must_use]
    pub const fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Format for display, e.g. `12 500.00 DA`.
    #[must_use]
    pub fn display(&self) -> String {
        format!("{self} {CURRENCY_SUFFIX}")
    }
}

/// Formats the amount with two decimals and space-grouped thousands.
impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounded = format!("{:.2}", self.0.round_dp(2));
        let (sign, unsigned) = rounded
            .strip_prefix('-')
            .map_or(("", rounded.as_str()), |rest| ("-", rest));
        let (integer, fraction) = unsigned.split_once('.').unwrap_or((unsigned, "00"));

        let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
        for (i, digit) in integer.chars().enumerate() {
            if i > 0 && (integer.len() - i) % 3 == 0 {
                grouped.push(' ');
            }
            grouped.push(digit);
        }

        write!(f, "{sign}{grouped}.{fraction}")
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Mul<u32> for Price {
    type Output = Self;

    fn mul(self, rhs: u32) -> Self::Output {
        self.times(rhs)
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_groups_thousands() {
        assert_eq!(Price::from_dinars(12_500).display(), "12 500.00 DA");
        assert_eq!(Price::from_dinars(950).to_string(), "950.00");
        assert_eq!(Price::from_dinars(1_000_000).to_string(), "1 000 000.00");
    }

    #[test]
    fn test_display_rounds_to_two_decimals() {
        let price = Price::new(Decimal::new(199_995, 3)); // 199.995
        assert_eq!(price.to_string(), "200.00");
    }

    #[test]
    fn test_deserializes_from_string_and_number() {
        let from_str: Price = serde_json::from_str("\"1500.50\"").unwrap();
        let from_num: Price = serde_json::from_str("1500.5").unwrap();
        assert_eq!(from_str, from_num);
    }

    #[test]
    fn test_sum_and_times() {
        let total: Price = [Price::from_dinars(100), Price::from_dinars(250).times(2)]
            .into_iter()
            .sum();
        assert_eq!(total, Price::from_dinars(600));
    }
}
