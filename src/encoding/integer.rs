use std::io::Read;

use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{One, ToPrimitive};

use crate::error::{Error, Result};
use crate::io::{BitReader, BitWriter};

/// Writes a sign bit followed by the magnitude; negative values carry `-v - 1`.
pub fn write_integer(writer: &mut BitWriter, value: &BigInt) {
    if value.sign() == Sign::Minus {
        writer.write_bool(true);
        writer.write_big_uint(&(value.magnitude() - BigUint::one()));
    } else {
        writer.write_bool(false);
        writer.write_big_uint(value.magnitude());
    }
}

pub fn read_integer<R: Read>(reader: &mut BitReader<R>) -> Result<BigInt> {
    let negative = reader.read_bool()?;
    let magnitude = reader.read_big_uint()?;
    if negative {
        Ok(-(BigInt::from(magnitude) + BigInt::one()))
    } else {
        Ok(BigInt::from(magnitude))
    }
}

/// 64-bit fast path of [`write_integer`], used for float components.
pub fn write_i64(writer: &mut BitWriter, value: i64) {
    if value < 0 {
        writer.write_bool(true);
        writer.write_uint(!(value as u64));
    } else {
        writer.write_bool(false);
        writer.write_uint(value as u64);
    }
}

pub fn read_i64<R: Read>(reader: &mut BitReader<R>) -> Result<i64> {
    let negative = reader.read_bool()?;
    let magnitude = reader.read_uint()?;
    let value = i64::try_from(magnitude)
        .map_err(|_| Error::invalid(format!("signed integer magnitude {magnitude} overflows")))?;
    Ok(if negative { -value - 1 } else { value })
}

pub fn write_unsigned(writer: &mut BitWriter, value: &BigInt) -> Result<()> {
    let magnitude = value
        .to_biguint()
        .ok_or_else(|| Error::domain("unsigned integer", value))?;
    writer.write_big_uint(&magnitude);
    Ok(())
}

pub fn read_unsigned<R: Read>(reader: &mut BitReader<R>) -> Result<BigInt> {
    Ok(BigInt::from(reader.read_big_uint()?))
}

/// Writes `value - min` in exactly `width` bits.
pub fn write_bounded(writer: &mut BitWriter, value: &BigInt, min: i64, width: u8) -> Result<()> {
    let offset = (value - BigInt::from(min))
        .to_u32()
        .filter(|offset| width >= 32 || u64::from(*offset) < 1u64 << width)
        .ok_or_else(|| Error::domain(format_args!("{width}-bit integer above {min}"), value))?;
    writer.write_nbit(offset, width)
}

pub fn read_bounded<R: Read>(reader: &mut BitReader<R>, min: i64, width: u8) -> Result<BigInt> {
    let offset = reader.read_nbit(width)?;
    Ok(BigInt::from(min) + BigInt::from(offset))
}
