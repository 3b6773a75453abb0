//! Decimal amounts used for ledger entries and balances.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Neg};
use std::str::FromStr;

use bigdecimal::BigDecimal;

use crate::error::BalanceError;

/// Longest amount text accepted, sign and exponent included.
const MAX_TEXT_LEN: usize = 64;
/// Largest power of ten accepted either side of the decimal point.
const MAX_SCALE: i64 = 32;

/// A signed decimal amount of money.
///
/// Stored as an arbitrary-precision decimal so that replaying a long ledger
/// never accumulates rounding error. Displayed normalised with at least one
/// fractional digit: `0.0`, `20.0`, `15.25`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(BigDecimal);

impl Amount {
    pub fn zero() -> Self {
        Self(BigDecimal::from(0))
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::zero()
    }

    pub fn is_positive(&self) -> bool {
        *self > Self::zero()
    }

    pub fn is_negative(&self) -> bool {
        *self < Self::zero()
    }

    /// Parse user-supplied text, reporting the original text on failure.
    pub fn parse(text: &str) -> Result<Self, BalanceError> {
        text.parse()
    }
}

impl FromStr for Amount {
    type Err = BalanceError;

    /// Text length and exponent are bounded; anything outside is invalid.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || BalanceError::InvalidAmount(s.to_string());
        let t = s.trim();
        if t.is_empty() || t.len() > MAX_TEXT_LEN {
            return Err(invalid());
        }
        let value = BigDecimal::from_str(t).map_err(|_| invalid())?;
        let (_, scale) = value.as_bigint_and_exponent();
        if scale.abs() > MAX_SCALE {
            return Err(invalid());
        }
        Ok(Amount(value))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return f.write_str("0.0");
        }
        let plain = self.0.normalized().to_plain_string();
        if plain.contains('.') {
            f.write_str(&plain)
        } else {
            write!(f, "{}.0", plain)
        }
    }
}

impl From<i64> for Amount {
    fn from(value: i64) -> Self {
        Self(BigDecimal::from(value))
    }
}

impl Add for Amount {
    type Output = Amount;
    fn add(self, rhs: Amount) -> Amount {
        Amount(self.0 + rhs.0)
    }
}

impl<'a> Add<&'a Amount> for Amount {
    type Output = Amount;
    fn add(self, rhs: &'a Amount) -> Amount {
        Amount(self.0 + &rhs.0)
    }
}

impl Neg for Amount {
    type Output = Amount;
    fn neg(self) -> Amount {
        Amount(-self.0)
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Self {
        iter.fold(Amount::zero(), |acc, a| acc + a)
    }
}

impl<'a> Sum<&'a Amount> for Amount {
    fn sum<I: Iterator<Item = &'a Amount>>(iter: I) -> Self {
        iter.fold(Amount::zero(), |acc, a| acc + a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amount(s: &str) -> Amount {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_valid() {
        assert_eq!(amount("5"), Amount::from(5));
        assert_eq!(amount("5.0"), Amount::from(5));
        assert_eq!(amount("  -3 "), Amount::from(-3));
        assert_eq!(amount("0.25").to_string(), "0.25");
    }

    #[test]
    fn test_parse_invalid() {
        assert!(Amount::parse("").is_err());
        assert!(Amount::parse("   ").is_err());
        assert!(Amount::parse("abc").is_err());
        assert!(Amount::parse("5 5").is_err());
        assert!(matches!(Amount::parse("x1"), Err(BalanceError::InvalidAmount(t)) if t == "x1"));
    }

    #[test]
    fn test_display_has_fraction() {
        assert_eq!(Amount::zero().to_string(), "0.0");
        assert_eq!(Amount::from(20).to_string(), "20.0");
        assert_eq!(amount("15.50").to_string(), "15.5");
        assert_eq!(amount("100").to_string(), "100.0");
        assert_eq!(amount("-5").to_string(), "-5.0");
    }

    #[test]
    fn test_display_zero_forms() {
        assert_eq!(amount("0.0").to_string(), "0.0");
        assert_eq!(amount("-0.0").to_string(), "0.0");
        assert_eq!(amount("0e5").to_string(), "0.0");
    }

    #[test]
    fn test_display_never_scientific() {
        assert_eq!(amount("0.0000001").to_string(), "0.0000001");
        assert_eq!(amount("1e-12").to_string(), "0.000000000001");
        assert_eq!(amount("-2.5E-7").to_string(), "-0.00000025");
        assert_eq!(amount("1e20").to_string(), "100000000000000000000.0");
    }

    #[test]
    fn test_display_parses_back() {
        for text in ["0.0", "20.0", "-0.00000025", "123456789.125", "100000000000000000000.0"] {
            assert_eq!(amount(text).to_string(), text);
        }
    }

    #[test]
    fn test_parse_rejects_huge_exponents() {
        let start = std::time::Instant::now();
        for text in ["1e50000000", "1e999999999", "-1e-999999999", "1e33", "1e-33"] {
            assert!(matches!(Amount::parse(text), Err(BalanceError::InvalidAmount(_))), "{}", text);
        }
        assert!(start.elapsed() < std::time::Duration::from_secs(1));
        assert!(Amount::parse("1e32").is_ok());
        assert!(Amount::parse("1e-32").is_ok());
    }

    #[test]
    fn test_parse_rejects_long_text() {
        let long = "1".repeat(MAX_TEXT_LEN + 1);
        assert!(matches!(Amount::parse(&long), Err(BalanceError::InvalidAmount(_))));
        assert!(Amount::parse(&"9".repeat(MAX_TEXT_LEN)).is_ok());
    }

    #[test]
    fn test_sign_checks() {
        assert!(amount("0.01").is_positive());
        assert!(amount("-0.01").is_negative());
        assert!(amount("0.000").is_zero());
        assert!(!Amount::zero().is_positive());
        assert!(!Amount::zero().is_negative());
    }

    #[test]
    fn test_sum_and_neg() {
        let entries = vec![amount("0.0"), amount("20"), amount("-5")];
        let total: Amount = entries.iter().sum();
        assert_eq!(total.to_string(), "15.0");
        assert_eq!((-amount("5")).to_string(), "-5.0");
    }

    #[test]
    fn test_ordering() {
        assert!(amount("5") <= amount("5.00"));
        assert!(amount("4.99") < amount("5"));
    }
}
