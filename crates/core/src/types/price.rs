//! Type-safe price representation using decimal arithmetic.
//!
//! Amounts are kept as [`Decimal`] end to end; rounding only happens when a
//! price is formatted for display.

use core::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (pesos, not centavos).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Create a price in the store's default currency.
    #[must_use]
    pub fn ars(amount: Decimal) -> Self {
        Self::new(amount, CurrencyCode::ARS)
    }

    /// Format for display using Argentine conventions.
    ///
    /// ```
    /// use frenos_core::Price;
    /// use rust_decimal::Decimal;
    ///
    /// let price = Price::ars(Decimal::new(1_234_567, 2));
    /// assert_eq!(price.display(), "$ 12.345,67");
    /// ```
    #[must_use]
    pub fn display(&self) -> String {
        let rounded = self
            .amount
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
            "-"
        } else {
            ""
        };
        let plain = format!("{:.2}", rounded.abs());
        let (int_part, frac_part) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));

        format!(
            "{sign}{} {},{frac_part}",
            self.currency_code.symbol(),
            group_thousands(int_part)
        )
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// Insert `.` separators every three digits, counting from the right.
fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    ARS,
    USD,
}

impl CurrencyCode {
    /// Currency symbol used in display strings.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::ARS => "$",
            Self::USD => "US$",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_groups_thousands() {
        assert_eq!(Price::ars(Decimal::new(1_500_000, 0)).display(), "$ 1.500.000,00");
        assert_eq!(Price::ars(Decimal::new(999, 0)).display(), "$ 999,00");
        assert_eq!(Price::ars(Decimal::new(1000, 0)).display(), "$ 1.000,00");
    }

    #[test]
    fn test_display_rounds_half_away_from_zero() {
        assert_eq!(Price::ars(Decimal::new(10_005, 3)).display(), "$ 10,01");
    }

    #[test]
    fn test_display_negative_and_zero() {
        assert_eq!(Price::ars(Decimal::new(-25_050, 2)).display(), "-$ 250,50");
        assert_eq!(Price::ars(Decimal::ZERO).display(), "$ 0,00");
    }

    #[test]
    fn test_usd_symbol() {
        let price = Price::new(Decimal::new(4200, 2), CurrencyCode::USD);
        assert_eq!(price.to_string(), "US$ 42,00");
    }
}
