use std::fmt;
use std::str::FromStr;

use num_bigint::{BigInt, BigUint, Sign};
use num_traits::Zero;

use crate::error::{Error, Result};

/// Arbitrary-precision decimal in canonical form.
///
/// The fractional digits never carry trailing zeros and zero is never negative, so
/// structural equality coincides with numeric equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Decimal {
    negative: bool,
    integral: BigUint,
    fraction: String,
}

impl Decimal {
    /// Builds a decimal from its sign, integral part and fractional digits.
    pub fn new(negative: bool, integral: BigUint, fraction: &str) -> Result<Self> {
        if !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::domain("decimal", fraction));
        }
        Ok(Self::canonical(negative, integral, fraction.to_string()))
    }

    fn canonical(negative: bool, integral: BigUint, mut fraction: String) -> Self {
        let trimmed = fraction.trim_end_matches('0').len();
        fraction.truncate(trimmed);
        let negative = negative && !(integral.is_zero() && fraction.is_empty());
        Self {
            negative,
            integral,
            fraction,
        }
    }

    /// Returns `true` for values below zero.
    pub fn is_negative(&self) -> bool {
        self.negative
    }

    /// Integral magnitude.
    pub fn integral(&self) -> &BigUint {
        &self.integral
    }

    /// Fractional digits without trailing zeros.
    pub fn fraction(&self) -> &str {
        &self.fraction
    }

    /// Fractional digits read in reverse order, as carried on the wire.
    pub(crate) fn reversed_fraction(&self) -> BigUint {
        reverse_digits(&self.fraction)
    }

    pub(crate) fn from_wire(negative: bool, integral: BigUint, reversed_fraction: &BigUint) -> Self {
        Self::canonical(negative, integral, unreverse_digits(reversed_fraction))
    }
}

/// Parses a digit run in reverse order; an empty run yields zero.
pub(crate) fn reverse_digits(digits: &str) -> BigUint {
    let reversed: Vec<u8> = digits.bytes().rev().map(|b| b - b'0').collect();
    if reversed.is_empty() {
        return BigUint::zero();
    }
    BigUint::from_radix_be(&reversed, 10).unwrap_or_default()
}

/// Inverse of [`reverse_digits`]; trailing zeros of the result are dropped.
pub(crate) fn unreverse_digits(value: &BigUint) -> String {
    if value.is_zero() {
        return String::new();
    }
    let digits: String = value.to_str_radix(10).chars().rev().collect();
    digits.trim_end_matches('0').to_string()
}

impl FromStr for Decimal {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        let (negative, body) = match trimmed.as_bytes().first() {
            Some(b'-') => (true, &trimmed[1..]),
            Some(b'+') => (false, &trimmed[1..]),
            _ => (false, trimmed),
        };
        let (int_part, frac_part) = body.split_once('.').unwrap_or((body, ""));
        let digits_only = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if (int_part.is_empty() && frac_part.is_empty())
            || !digits_only(int_part)
            || !digits_only(frac_part)
        {
            return Err(Error::domain("decimal", text));
        }
        let integral = if int_part.is_empty() {
            BigUint::zero()
        } else {
            int_part
                .parse::<BigUint>()
                .map_err(|_| Error::domain("decimal", text))?
        };
        Ok(Self::canonical(negative, integral, frac_part.to_string()))
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negative {
            f.write_str("-")?;
        }
        write!(f, "{}", self.integral)?;
        if !self.fraction.is_empty() {
            write!(f, ".{}", self.fraction)?;
        }
        Ok(())
    }
}

impl From<&BigInt> for Decimal {
    fn from(value: &BigInt) -> Self {
        Self::canonical(
            value.sign() == Sign::Minus,
            value.magnitude().clone(),
            String::new(),
        )
    }
}

impl From<i64> for Decimal {
    fn from(value: i64) -> Self {
        Self::from(&BigInt::from(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_form_drops_trailing_zeros() {
        let value: Decimal = "-012.3400".parse().unwrap();
        assert_eq!(value.to_string(), "-12.34");
        assert_eq!(value.fraction(), "34");
    }

    #[test]
    fn negative_zero_is_zero() {
        let value: Decimal = "-0.000".parse().unwrap();
        assert!(!value.is_negative());
        assert_eq!(value, Decimal::default());
    }

    #[test]
    fn leading_fraction_zeros_survive_reversal() {
        let value: Decimal = "1.05".parse().unwrap();
        let reversed = value.reversed_fraction();
        assert_eq!(reversed, BigUint::from(50u32));
        let back = Decimal::from_wire(false, BigUint::from(1u32), &reversed);
        assert_eq!(back, value);
    }

    #[test]
    fn rejects_malformed_text() {
        for text in ["", ".", "1.2.3", "abc", "--1"] {
            assert!(text.parse::<Decimal>().is_err(), "{text}");
        }
        assert_eq!(".5".parse::<Decimal>().unwrap().to_string(), "0.5");
    }
}
