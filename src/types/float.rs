use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Largest exponent magnitude representable on the wire.
pub const FLOAT_EXPONENT_LIMIT: i64 = (1 << 14) - 1;

/// Exponent value reserved for the special values.
pub(crate) const FLOAT_SPECIAL_EXPONENT: i64 = -(1 << 14);

/// Decimal floating-point value `mantissa * 10^exponent`, or one of the specials.
///
/// Finite values are kept in canonical form: the mantissa carries no trailing decimal
/// zeros, and zero is always `0E0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Float {
    /// `mantissa * 10^exponent`.
    Finite {
        /// Significant digits, without trailing zeros.
        mantissa: i64,
        /// Power of ten, within [`FLOAT_EXPONENT_LIMIT`].
        exponent: i16,
    },
    /// `INF`
    Infinity,
    /// `-INF`
    NegativeInfinity,
    /// `NaN`
    NaN,
}

impl Float {
    /// Builds a finite value, normalising it and validating the exponent range.
    pub fn finite(mantissa: i64, exponent: i64) -> Result<Self> {
        let (mut mantissa, mut exponent) = (mantissa, exponent);
        if mantissa == 0 {
            exponent = 0;
        }
        while mantissa != 0 && mantissa % 10 == 0 && exponent < FLOAT_EXPONENT_LIMIT {
            mantissa /= 10;
            exponent += 1;
        }
        if exponent.abs() > FLOAT_EXPONENT_LIMIT {
            return Err(Error::domain(
                "float",
                format_args!("{mantissa}E{exponent}"),
            ));
        }
        Ok(Self::Finite {
            mantissa,
            exponent: exponent as i16,
        })
    }

    /// Converts to the nearest IEEE-754 double.
    pub fn to_f64(self) -> f64 {
        match self {
            Self::Finite { mantissa, exponent } => format!("{mantissa}e{exponent}")
                .parse()
                .unwrap_or(f64::NAN),
            Self::Infinity => f64::INFINITY,
            Self::NegativeInfinity => f64::NEG_INFINITY,
            Self::NaN => f64::NAN,
        }
    }
}

impl TryFrom<f64> for Float {
    type Error = Error;

    fn try_from(value: f64) -> Result<Self> {
        if value.is_nan() {
            Ok(Self::NaN)
        } else if value == f64::INFINITY {
            Ok(Self::Infinity)
        } else if value == f64::NEG_INFINITY {
            Ok(Self::NegativeInfinity)
        } else {
            // Shortest round-trip form, e.g. "1.5e3".
            format!("{value:e}").parse()
        }
    }
}

impl FromStr for Float {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        match trimmed {
            "INF" | "+INF" => return Ok(Self::Infinity),
            "-INF" => return Ok(Self::NegativeInfinity),
            "NaN" => return Ok(Self::NaN),
            _ => {}
        }
        let fail = || Error::domain("float", text);
        let (significand, exponent) = match trimmed.find(['e', 'E']) {
            Some(idx) => {
                let exp: i64 = trimmed[idx + 1..]
                    .trim_start_matches('+')
                    .parse()
                    .map_err(|_| fail())?;
                (&trimmed[..idx], exp)
            }
            None => (trimmed, 0),
        };
        let (negative, body) = match significand.as_bytes().first() {
            Some(b'-') => (true, &significand[1..]),
            Some(b'+') => (false, &significand[1..]),
            _ => (false, significand),
        };
        let (int_part, frac_part) = body.split_once('.').unwrap_or((body, ""));
        if (int_part.is_empty() && frac_part.is_empty())
            || !int_part.bytes().all(|b| b.is_ascii_digit())
            || !frac_part.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(fail());
        }

        let frac_part = frac_part.trim_end_matches('0');
        let mut digits = format!("{int_part}{frac_part}");
        let mut exponent = exponent
            .checked_sub(frac_part.len() as i64)
            .ok_or_else(fail)?;
        let significant = digits.trim_end_matches('0').len();
        if significant == 0 {
            return Self::finite(0, 0);
        }
        exponent += (digits.len() - significant) as i64;
        digits.truncate(significant);
        let magnitude: i64 = digits
            .trim_start_matches('0')
            .parse()
            .map_err(|_| fail())?;
        Self::finite(if negative { -magnitude } else { magnitude }, exponent)
    }
}

impl fmt::Display for Float {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Finite { mantissa, exponent } => write!(f, "{mantissa}E{exponent}"),
            Self::Infinity => f.write_str("INF"),
            Self::NegativeInfinity => f.write_str("-INF"),
            Self::NaN => f.write_str("NaN"),
        }
    }
}
