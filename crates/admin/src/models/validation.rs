//! Field-level validation shared by the back-office forms.

use std::collections::BTreeMap;
use std::str::FromStr;

use boilerparts_core::Price;
use rust_decimal::Decimal;

/// Validation messages keyed by form field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<&'static str, String>);

impl FieldErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message for `field`, keeping the first one.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// Parse a price typed by an operator.
///
/// Accepts `1500`, `1 500`, `1500.5` and `1500,50`. Rejects negative
/// amounts and more than two decimals.
///
/// # Errors
///
/// Returns the message to show next to the field.
pub fn parse_price(raw: &str) -> Result<Price, &'static str> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    if cleaned.is_empty() {
        return Err("Required");
    }

    let amount =
        Decimal::from_str(&cleaned).map_err(|_| "Enter an amount such as 1500 or 1500.50")?;
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err("Must not be negative");
    }
    if amount.normalize().scale() > 2 {
        return Err("At most two decimals");
    }
    Ok(Price::new(amount))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_price_formats() {
        assert_eq!(parse_price("1500").unwrap(), Price::from_dinars(1_500));
        assert_eq!(parse_price(" 12 500 ").unwrap(), Price::from_dinars(12_500));
        assert_eq!(parse_price("99,50").unwrap().to_string(), "99.50");
        assert_eq!(parse_price("10.00").unwrap(), Price::from_dinars(10));
    }

    #[test]
    fn test_parse_price_rejections() {
        assert_eq!(parse_price(""), Err("Required"));
        assert_eq!(parse_price("-5"), Err("Must not be negative"));
        assert_eq!(parse_price("1.505"), Err("At most two decimals"));
        assert!(parse_price("douze").is_err());
    }

    #[test]
    fn test_field_errors_keep_first_message() {
        let mut errors = FieldErrors::new();
        errors.add("price", "Required");
        errors.add("price", "Must not be negative");
        assert_eq!(errors.get("price"), Some("Required"));
        assert_eq!(errors.len(), 1);
    }
}
