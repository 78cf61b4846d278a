//! Algerian phone number type.
//!
//! Orders are confirmed by phone, so checkout requires a reachable number.
//! Accepted inputs are the national format (`0551234567`, `021 23 45 67`)
//! and the international format (`+213551234567`, `00213551234567`).
//! Numbers are stored in national format without separators.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Phone`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneError {
    /// The input string is empty.
    #[error("phone number cannot be empty")]
    Empty,
    /// The input contains characters other than digits, spaces, dots, dashes or a leading +.
    #[error("phone number contains invalid characters")]
    InvalidCharacters,
    /// The number does not have a valid Algerian length or prefix.
    #[error("phone number must be a valid Algerian number (e.g. 0551234567)")]
    InvalidFormat,
}

/// A validated Algerian phone number in national format.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Phone(String);

impl Phone {
    /// Parse and normalize a phone number.
    ///
    /// Mobile numbers (`05`, `06`, `07`) have 10 digits; landlines
    /// (`02`, `03`, `04`) have 9.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, contains unexpected
    /// characters, or does not match an Algerian numbering pattern.
    pub fn parse(s: &str) -> Result<Self, PhoneError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(PhoneError::Empty);
        }

        let (has_plus, rest) = s
            .strip_prefix('+')
            .map_or((false, s), |rest| (true, rest));

        if rest
            .chars()
            .any(|c| !(c.is_ascii_digit() || matches!(c, ' ' | '.' | '-')))
        {
            return Err(PhoneError::InvalidCharacters);
        }

        let digits: String = rest.chars().filter(char::is_ascii_digit).collect();

        let national = if has_plus {
            digits
                .strip_prefix("213")
                .map(|n| format!("0{n}"))
                .ok_or(PhoneError::InvalidFormat)?
        } else if let Some(n) = digits.strip_prefix("00213") {
            format!("0{n}")
        } else {
            digits
        };

        let valid = match national.as_bytes() {
            [b'0', b'5' | b'6' | b'7', ..] => national.len() == 10,
            [b'0', b'2' | b'3' | b'4', ..] => national.len() == 9,
            _ => false,
        };

        if valid {
            Ok(Self(national))
        } else {
            Err(PhoneError::InvalidFormat)
        }
    }

    /// Returns the number in national format.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is a mobile number.
    #[must_use]
    pub fn is_mobile(&self) -> bool {
        matches!(self.0.as_bytes().get(1), Some(b'5' | b'6' | b'7'))
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_national_mobile() {
        let phone = Phone::parse("0551 23 45 67");
        assert_eq!(phone.as_ref().map(Phone::as_str), Ok("0551234567"));
        assert!(phone.is_ok_and(|p| p.is_mobile()));
    }

    #[test]
    fn test_international_formats() {
        assert_eq!(
            Phone::parse("+213 661-23-45-67").map(|p| p.as_str().to_string()),
            Ok("0661234567".to_string())
        );
        assert_eq!(
            Phone::parse("00213771234567").map(|p| p.as_str().to_string()),
            Ok("0771234567".to_string())
        );
    }

    #[test]
    fn test_landline() {
        let phone = Phone::parse("021.23.45.67");
        assert!(phone.is_ok_and(|p| !p.is_mobile()));
    }

    #[test]
    fn test_invalid_numbers() {
        assert_eq!(Phone::parse(""), Err(PhoneError::Empty));
        assert_eq!(Phone::parse("055a123456"), Err(PhoneError::InvalidCharacters));
        assert_eq!(Phone::parse("055123456"), Err(PhoneError::InvalidFormat));
        assert_eq!(Phone::parse("0851234567"), Err(PhoneError::InvalidFormat));
        assert_eq!(Phone::parse("+33612345678"), Err(PhoneError::InvalidFormat));
    }
}
