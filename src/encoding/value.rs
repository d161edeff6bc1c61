use std::io::Read;

use crate::encoding::datetime::{read_datetime, write_datetime};
use crate::encoding::decimal::{read_decimal, write_decimal};
use crate::encoding::float::{read_float, write_float};
use crate::encoding::integer::{
    read_bounded, read_integer, read_unsigned, write_bounded, write_integer, write_unsigned,
};
use crate::error::{Error, Result};
use crate::io::{BitReader, BitWriter};
use crate::table::{NameId, StringTable};
use crate::types::{Value, ValueDomain};

/// Writes `value` in the primitive layout of `domain`.
///
/// The value must already have been coerced with [`ValueDomain::coerce`]; string
/// values go through `strings`, partitioned by `name`.
pub fn scribe_value(
    domain: ValueDomain,
    value: &Value,
    name: NameId,
    strings: &mut StringTable,
    writer: &mut BitWriter,
) -> Result<()> {
    match (domain, value) {
        (ValueDomain::String, Value::String(text)) => {
            strings.scribe(writer, name, text)?;
        }
        (ValueDomain::Boolean, Value::Boolean(flag)) => writer.write_bool(*flag),
        (ValueDomain::Integer, Value::Integer(int)) => write_integer(writer, int),
        (ValueDomain::UnsignedInteger, Value::Integer(int)) => write_unsigned(writer, int)?,
        (ValueDomain::BoundedInteger { min, width }, Value::Integer(int)) => {
            write_bounded(writer, int, min, width)?
        }
        (ValueDomain::Decimal, Value::Decimal(dec)) => write_decimal(writer, dec),
        (ValueDomain::Float, Value::Float(float)) => write_float(writer, *float),
        (ValueDomain::DateTime(kind), Value::DateTime(dt)) if dt.kind == kind => {
            write_datetime(writer, dt)?
        }
        (ValueDomain::Binary, Value::Binary(bytes)) => {
            writer.write_uint(bytes.len() as u64);
            writer.write_octets(bytes);
        }
        (ValueDomain::Null, Value::Null) => {}
        _ => return Err(Error::domain(domain, value)),
    }
    Ok(())
}

/// Reads a value of `domain` written by [`scribe_value`].
pub fn scan_value<R: Read>(
    domain: ValueDomain,
    name: NameId,
    strings: &mut StringTable,
    reader: &mut BitReader<R>,
) -> Result<Value> {
    Ok(match domain {
        ValueDomain::String => Value::String(strings.scan(reader, name)?),
        ValueDomain::Boolean => Value::Boolean(reader.read_bool()?),
        ValueDomain::Integer => Value::Integer(read_integer(reader)?),
        ValueDomain::UnsignedInteger => Value::Integer(read_unsigned(reader)?),
        ValueDomain::BoundedInteger { min, width } => {
            Value::Integer(read_bounded(reader, min, width)?)
        }
        ValueDomain::Decimal => Value::Decimal(read_decimal(reader)?),
        ValueDomain::Float => Value::Float(read_float(reader)?),
        ValueDomain::DateTime(kind) => Value::DateTime(read_datetime(reader, kind)?),
        ValueDomain::Binary => {
            let len = reader.read_len()?;
            Value::Binary(reader.read_octets(len)?)
        }
        ValueDomain::Null => Value::Null,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DateTimeKind, QName};

    #[test]
    fn every_domain_round_trips() {
        let cases = [
            (ValueDomain::String, Value::string("hello")),
            (ValueDomain::Boolean, Value::Boolean(true)),
            (ValueDomain::Integer, Value::integer(-9_000_000_000i64)),
            (ValueDomain::UnsignedInteger, Value::integer(77)),
            (ValueDomain::BoundedInteger { min: 10, width: 4 }, Value::integer(25)),
            (ValueDomain::Decimal, Value::Decimal("-0.001".parse().unwrap())),
            (ValueDomain::Float, Value::Float("6.02E23".parse().unwrap())),
            (
                ValueDomain::DateTime(DateTimeKind::Date),
                Value::string("2020-02-29Z"),
            ),
            (ValueDomain::Binary, Value::Binary(vec![0, 1, 2, 255])),
            (ValueDomain::Null, Value::Null),
        ];
        for byte_aligned in [false, true] {
            let mut names = crate::table::NameTable::new();
            let name = names.intern(&QName::local("v"));
            let mut strings = StringTable::default();
            let mut writer = BitWriter::new(byte_aligned);
            let mut expected = Vec::new();
            for (domain, value) in &cases {
                let coerced = domain.coerce(value).unwrap();
                scribe_value(*domain, &coerced, name, &mut strings, &mut writer).unwrap();
                expected.push(coerced);
            }
            let bytes = writer.into_bytes();

            let mut strings = StringTable::default();
            let mut reader = BitReader::new(bytes.as_slice(), byte_aligned);
            for ((domain, _), want) in cases.iter().zip(&expected) {
                let got = scan_value(*domain, name, &mut strings, &mut reader).unwrap();
                assert_eq!(&got, want, "{domain}");
            }
        }
    }

    #[test]
    fn uncoerced_values_are_rejected() {
        let mut writer = BitWriter::bit_packed();
        let mut strings = StringTable::default();
        let err = scribe_value(
            ValueDomain::Integer,
            &Value::string("12"),
            NameId::EMPTY,
            &mut strings,
            &mut writer,
        )
        .unwrap_err();
        assert!(matches!(err, Error::ValueDomain { .. }));
    }
}
