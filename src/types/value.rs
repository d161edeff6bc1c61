use std::fmt;

use num_bigint::BigInt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::types::{DateTime, Decimal, Float};

/// Typed content carried by a value event.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum Value {
    /// Character data.
    String(String),
    /// `true` or `false`.
    Boolean(bool),
    /// Integer of any magnitude.
    Integer(#[cfg_attr(feature = "serde", serde(with = "crate::serde_support::lexical"))] BigInt),
    /// Exact decimal number.
    Decimal(#[cfg_attr(feature = "serde", serde(with = "crate::serde_support::lexical"))] Decimal),
    /// Decimal floating-point number, including the specials.
    Float(#[cfg_attr(feature = "serde", serde(with = "crate::serde_support::lexical"))] Float),
    /// Date, time or calendar fragment.
    DateTime(DateTime),
    /// Raw octets.
    Binary(Vec<u8>),
    /// Explicit absence of content.
    Null,
}

impl Value {
    /// Convenience constructor for string values.
    pub fn string(text: impl Into<String>) -> Self {
        Self::String(text.into())
    }

    /// Convenience constructor for integer values.
    pub fn integer(value: impl Into<BigInt>) -> Self {
        Self::Integer(value.into())
    }

    /// Short name of the variant, used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Boolean(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::Decimal(_) => "decimal",
            Self::Float(_) => "float",
            Self::DateTime(dt) => dt.kind.type_name(),
            Self::Binary(_) => "binary",
            Self::Null => "null",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Decimal(d) => write!(f, "{d}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::DateTime(dt) => write!(f, "{dt}"),
            Self::Binary(bytes) => {
                for byte in bytes {
                    write!(f, "{byte:02x}")?;
                }
                Ok(())
            }
            Self::Null => f.write_str("null"),
        }
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Self::String(text.to_string())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Self::String(text)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value.into())
    }
}
