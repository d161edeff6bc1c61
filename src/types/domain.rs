use std::fmt;

use num_bigint::{BigInt, Sign};
use num_traits::ToPrimitive;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{DateTime, DateTimeKind, Decimal, Float, Value};

/// Primitive domain a grammar declares for a value event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum ValueDomain {
    /// Strings, through the string table.
    String,
    /// Single-bit booleans.
    Boolean,
    /// Signed integers of any magnitude.
    Integer,
    /// Non-negative integers of any magnitude.
    UnsignedInteger,
    /// Integer in `min..=min + 2^width - 1`, written as a `width`-bit offset.
    BoundedInteger {
        /// Smallest accepted value.
        min: i64,
        /// Bits of the offset; at most 32.
        width: u8,
    },
    /// Exact decimals.
    Decimal,
    /// Mantissa and exponent floats.
    Float,
    /// Date/time values of one kind.
    DateTime(DateTimeKind),
    /// Length-prefixed octets.
    Binary,
    /// Only [`Value::Null`]; nothing is written.
    Null,
}

impl ValueDomain {
    /// Converts `value` into the representation this domain writes.
    ///
    /// Typed values of the matching variant are accepted as-is; strings are parsed
    /// from their lexical form. The string domain only accepts strings.
    pub fn coerce(&self, value: &Value) -> Result<Value> {
        let fail = || Error::domain(self, value);
        match (self, value) {
            (Self::String, Value::String(_))
            | (Self::Boolean, Value::Boolean(_))
            | (Self::Decimal, Value::Decimal(_))
            | (Self::Float, Value::Float(_))
            | (Self::Binary, Value::Binary(_))
            | (Self::Null, Value::Null) => Ok(value.clone()),

            (Self::Boolean, Value::String(text)) => match text.trim() {
                "true" | "1" => Ok(Value::Boolean(true)),
                "false" | "0" => Ok(Value::Boolean(false)),
                _ => Err(fail()),
            },

            (Self::Integer | Self::UnsignedInteger | Self::BoundedInteger { .. }, _) => {
                let int = match value {
                    Value::Integer(int) => int.clone(),
                    Value::String(text) => parse_integer(text).ok_or_else(fail)?,
                    _ => return Err(fail()),
                };
                if self.accepts_integer(&int) {
                    Ok(Value::Integer(int))
                } else {
                    Err(fail())
                }
            }

            (Self::Decimal, Value::Integer(int)) => Ok(Value::Decimal(Decimal::from(int))),
            (Self::Decimal, Value::String(text)) => text
                .parse::<Decimal>()
                .map(Value::Decimal)
                .map_err(|_| fail()),

            (Self::Float, Value::Integer(int)) => {
                let mantissa = int.to_i64().ok_or_else(fail)?;
                Float::finite(mantissa, 0)
                    .map(Value::Float)
                    .map_err(|_| fail())
            }
            (Self::Float, Value::Decimal(dec)) => dec
                .to_string()
                .parse::<Float>()
                .map(Value::Float)
                .map_err(|_| fail()),
            (Self::Float, Value::String(text)) => text
                .parse::<Float>()
                .map(Value::Float)
                .map_err(|_| fail()),

            (Self::DateTime(kind), Value::DateTime(dt)) if dt.kind == *kind => {
                dt.validate().map_err(|_| fail())?;
                Ok(value.clone())
            }
            (Self::DateTime(kind), Value::String(text)) => DateTime::parse(*kind, text)
                .map(Value::DateTime)
                .map_err(|_| fail()),

            _ => Err(fail()),
        }
    }

    fn accepts_integer(&self, int: &BigInt) -> bool {
        match self {
            Self::Integer => true,
            Self::UnsignedInteger => int.sign() != Sign::Minus,
            Self::BoundedInteger { min, width } => {
                let offset = int - BigInt::from(*min);
                offset.sign() != Sign::Minus && offset.bits() <= u64::from(*width)
            }
            _ => false,
        }
    }
}

fn parse_integer(text: &str) -> Option<BigInt> {
    let trimmed = text.trim();
    trimmed
        .strip_prefix('+')
        .unwrap_or(trimmed)
        .parse::<BigInt>()
        .ok()
}

impl fmt::Display for ValueDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => f.write_str("string"),
            Self::Boolean => f.write_str("boolean"),
            Self::Integer => f.write_str("integer"),
            Self::UnsignedInteger => f.write_str("unsigned integer"),
            Self::BoundedInteger { min, width } => {
                write!(f, "integer bounded to {width} bits above {min}")
            }
            Self::Decimal => f.write_str("decimal"),
            Self::Float => f.write_str("float"),
            Self::DateTime(kind) => f.write_str(kind.type_name()),
            Self::Binary => f.write_str("binary"),
            Self::Null => f.write_str("null"),
        }
    }
}
