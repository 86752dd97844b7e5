//! Phone numbers in the digits-only form `wa.me` links expect.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`PhoneNumber`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneError {
    /// Fewer digits than any dialable number.
    #[error("phone number must have at least {min} digits")]
    TooShort {
        /// Minimum digit count.
        min: usize,
    },
    /// More digits than E.164 allows.
    #[error("phone number must have at most {max} digits")]
    TooLong {
        /// Maximum digit count.
        max: usize,
    },
}

/// A phone number reduced to its digits (`+54 9 11 1234-5678` → `5491112345678`).
///
/// ```
/// use frenos_core::PhoneNumber;
///
/// let phone = PhoneNumber::parse("+54 9 (11) 1234-5678").unwrap();
/// assert_eq!(phone.as_str(), "5491112345678");
/// assert!(PhoneNumber::parse("12-34").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Minimum number of digits accepted.
    pub const MIN_DIGITS: usize = 8;
    /// Maximum number of digits accepted (E.164).
    pub const MAX_DIGITS: usize = 15;

    /// Parse a phone number, discarding every non-digit character.
    ///
    /// # Errors
    ///
    /// Returns an error if the remaining digit count is outside
    /// `MIN_DIGITS..=MAX_DIGITS`.
    pub fn parse(s: &str) -> Result<Self, PhoneError> {
        let digits: String = s.chars().filter(char::is_ascii_digit).collect();
        if digits.len() < Self::MIN_DIGITS {
            return Err(PhoneError::TooShort {
                min: Self::MIN_DIGITS,
            });
        }
        if digits.len() > Self::MAX_DIGITS {
            return Err(PhoneError::TooLong {
                max: Self::MAX_DIGITS,
            });
        }
        Ok(Self(digits))
    }

    /// The digits as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PhoneNumber {
    type Error = PhoneError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PhoneNumber> for String {
    fn from(phone: PhoneNumber) -> Self {
        phone.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_formatting() {
        let phone = PhoneNumber::parse(" 11 4444.5555 ");
        assert_eq!(phone.map(|p| p.to_string()), Ok("1144445555".to_owned()));
    }

    #[test]
    fn rejects_out_of_range_lengths() {
        assert_eq!(
            PhoneNumber::parse("1234567"),
            Err(PhoneError::TooShort { min: 8 })
        );
        assert_eq!(
            PhoneNumber::parse("1234567890123456"),
            Err(PhoneError::TooLong { max: 15 })
        );
    }
}
