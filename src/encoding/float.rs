use std::io::Read;

use crate::encoding::integer::{read_i64, write_i64};
use crate::error::{Error, Result};
use crate::io::{BitReader, BitWriter};
use crate::types::{FLOAT_EXPONENT_LIMIT, FLOAT_SPECIAL_EXPONENT, Float};

/// Writes the mantissa and exponent as signed integers; the specials use the
/// reserved exponent with mantissa `1`, `-1` or `0`.
pub fn write_float(writer: &mut BitWriter, value: Float) {
    let (mantissa, exponent) = match value {
        Float::Finite { mantissa, exponent } => (mantissa, i64::from(exponent)),
        Float::Infinity => (1, FLOAT_SPECIAL_EXPONENT),
        Float::NegativeInfinity => (-1, FLOAT_SPECIAL_EXPONENT),
        Float::NaN => (0, FLOAT_SPECIAL_EXPONENT),
    };
    write_i64(writer, mantissa);
    write_i64(writer, exponent);
}

pub fn read_float<R: Read>(reader: &mut BitReader<R>) -> Result<Float> {
    let mantissa = read_i64(reader)?;
    let exponent = read_i64(reader)?;
    if exponent == FLOAT_SPECIAL_EXPONENT {
        return Ok(match mantissa {
            1 => Float::Infinity,
            -1 => Float::NegativeInfinity,
            _ => Float::NaN,
        });
    }
    if exponent.abs() > FLOAT_EXPONENT_LIMIT {
        return Err(Error::invalid(format!("float exponent {exponent} out of range")));
    }
    Ok(Float::Finite {
        mantissa,
        exponent: exponent as i16,
    })
}
