use std::io::Read;

use crate::error::Result;
use crate::io::{BitReader, BitWriter};
use crate::types::Decimal;

/// Writes the sign, the integral magnitude and the fractional digits reversed.
pub fn write_decimal(writer: &mut BitWriter, value: &Decimal) {
    writer.write_bool(value.is_negative());
    writer.write_big_uint(value.integral());
    writer.write_big_uint(&value.reversed_fraction());
}

pub fn read_decimal<R: Read>(reader: &mut BitReader<R>) -> Result<Decimal> {
    let negative = reader.read_bool()?;
    let integral = reader.read_big_uint()?;
    let reversed = reader.read_big_uint()?;
    Ok(Decimal::from_wire(negative, integral, &reversed))
}
