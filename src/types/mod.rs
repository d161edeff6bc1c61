//! Core type definitions used across the crate.

mod datetime;
mod decimal;
mod domain;
mod enums;
mod event;
mod float;
mod name;
mod value;

pub use datetime::{DEFAULT_YEAR, DateTime, TIMEZONE_LIMIT, days_in_month, is_leap_year};
pub use decimal::Decimal;
pub use domain::ValueDomain;
pub use enums::*;
pub use event::Event;
pub use float::{FLOAT_EXPONENT_LIMIT, Float};
pub use name::QName;
pub use value::Value;

pub(crate) use datetime::TIMEZONE_OFFSET;
pub(crate) use decimal::{reverse_digits, unreverse_digits};
pub(crate) use float::FLOAT_SPECIAL_EXPONENT;
