//! Per-field validation messages for re-rendered forms.

use std::collections::BTreeMap;

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

    /// Message for `field`, if any.
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

    /// `Ok(value)` when no messages were recorded.
    ///
    /// # Errors
    ///
    /// Returns `self` when at least one field failed.
    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

/// Trimmed value, `None` when blank.
#[must_use]
pub fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_message_wins() {
        let mut errors = FieldErrors::new();
        errors.add("phone", "required");
        errors.add("phone", "invalid");
        assert_eq!(errors.get("phone"), Some("required"));
        assert!(errors.has("phone"));
        assert!(!errors.has("email"));
    }

    #[test]
    fn test_into_result() {
        assert_eq!(FieldErrors::new().into_result(3), Ok(3));
        let mut errors = FieldErrors::new();
        errors.add("name", "required");
        assert!(errors.into_result(3).is_err());
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank("  Alger "), Some("Alger".to_string()));
        assert_eq!(non_blank("   "), None);
    }
}
