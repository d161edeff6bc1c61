use std::io::Read;

use crate::encoding::integer::{read_i64, write_i64};
use crate::error::{Error, Result};
use crate::io::{BitReader, BitWriter};
use crate::types::{
    DateTime, DateTimeKind, TIMEZONE_LIMIT, TIMEZONE_OFFSET, reverse_digits, unreverse_digits,
};

const YEAR_OFFSET: i64 = 2000;
const MONTH_DAY_BITS: u8 = 9;
const TIME_BITS: u8 = 17;
const TIMEZONE_BITS: u8 = 11;

/// Writes the fields carried by the value's kind, followed by the optional
/// timezone.
pub fn write_datetime(writer: &mut BitWriter, value: &DateTime) -> Result<()> {
    let kind = value.kind;
    if kind.has_year() {
        let year = value
            .year
            .checked_sub(YEAR_OFFSET)
            .ok_or_else(|| Error::domain(kind.type_name(), value))?;
        write_i64(writer, year);
    }
    if kind.has_month_day() {
        let month = if kind.has_month() { u32::from(value.month) } else { 0 };
        let day = if kind.has_day() { u32::from(value.day) } else { 0 };
        writer.write_nbit(month * 32 + day, MONTH_DAY_BITS)?;
    }
    if kind.has_time() {
        let time = (u32::from(value.hour) * 64 + u32::from(value.minute)) * 64
            + u32::from(value.second);
        writer.write_nbit(time, TIME_BITS)?;
        match &value.fraction {
            Some(digits) => {
                writer.write_bool(true);
                writer.write_big_uint(&reverse_digits(digits));
            }
            None => writer.write_bool(false),
        }
    }
    match value.timezone {
        Some(tz) => {
            writer.write_bool(true);
            let minutes = i32::from(tz);
            let field = (minutes / 60) * 64 + minutes % 60 + TIMEZONE_OFFSET;
            let field = u32::try_from(field).map_err(|_| Error::domain(kind.type_name(), value))?;
            writer.write_nbit(field, TIMEZONE_BITS)?;
        }
        None => writer.write_bool(false),
    }
    Ok(())
}

/// Reads a value of `kind`; fields the kind does not carry take their defaults.
pub fn read_datetime<R: Read>(reader: &mut BitReader<R>, kind: DateTimeKind) -> Result<DateTime> {
    let mut value = DateTime::empty(kind);
    if kind.has_year() {
        value.year = read_i64(reader)?
            .checked_add(YEAR_OFFSET)
            .ok_or_else(|| Error::invalid("year out of range"))?;
    }
    if kind.has_month_day() {
        let field = reader.read_nbit(MONTH_DAY_BITS)?;
        value.month = (field / 32) as u8;
        value.day = (field % 32) as u8;
    }
    if kind.has_time() {
        let field = reader.read_nbit(TIME_BITS)?;
        value.hour = (field / 4096) as u8;
        value.minute = ((field / 64) % 64) as u8;
        value.second = (field % 64) as u8;
        if reader.read_bool()? {
            let digits = unreverse_digits(&reader.read_big_uint()?);
            value.set_fraction(&digits);
        }
    }
    if reader.read_bool()? {
        let field = reader.read_nbit(TIMEZONE_BITS)? as i32 - TIMEZONE_OFFSET;
        // Hours and minutes share the sign of the offset.
        let (hours, minutes) = (field / 64, field % 64);
        let tz = hours * 60 + minutes;
        if minutes.abs() > 59 || tz.abs() > i32::from(TIMEZONE_LIMIT) {
            return Err(Error::invalid(format!("timezone field {field} out of range")));
        }
        value.timezone = Some(tz as i16);
    }
    value.reset_uncarried();
    value
        .validate()
        .map_err(|err| Error::invalid(format!("decoded {}: {err}", kind.type_name())))?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(kind: DateTimeKind, text: &str) -> DateTime {
        let value = DateTime::parse(kind, text).unwrap();
        let mut writer = BitWriter::bit_packed();
        write_datetime(&mut writer, &value).unwrap();
        let bytes = writer.into_bytes();
        let decoded = read_datetime(&mut BitReader::bit_packed(bytes.as_slice()), kind).unwrap();
        assert_eq!(decoded, value);
        decoded
    }

    #[test]
    fn every_kind_round_trips() {
        round_trip(DateTimeKind::DateTime, "2012-07-31T23:59:58.0625-03:30");
        round_trip(DateTimeKind::Time, "00:00:00Z");
        round_trip(DateTimeKind::Date, "-0001-01-01");
        round_trip(DateTimeKind::GYearMonth, "2024-02+14:00");
        round_trip(DateTimeKind::GYear, "1999");
        round_trip(DateTimeKind::GMonthDay, "--02-29");
        round_trip(DateTimeKind::GDay, "---07");
        round_trip(DateTimeKind::GMonth, "--12-14:00");
    }

    #[test]
    fn gyear_writes_only_year_and_timezone_flag() {
        let value = DateTime::parse(DateTimeKind::GYear, "2001").unwrap();
        let mut writer = BitWriter::byte_aligned();
        write_datetime(&mut writer, &value).unwrap();
        assert_eq!(writer.into_bytes(), [0x00, 0x01, 0x00]);
    }

    #[test]
    fn negative_half_hour_timezone_round_trips() {
        let value = round_trip(DateTimeKind::Time, "10:00:00-00:30");
        assert_eq!(value.timezone, Some(-30));
    }
}
