use std::io::Read;

use crate::error::{Error, Result};
use crate::io::{BitReader, BitWriter};

/// Largest number of characters preallocated before the decoder has seen them.
const PREALLOC_LIMIT: usize = 4096;

/// Writes `char_count + offset` followed by every code point as an unsigned
/// integer.
pub fn write_literal(writer: &mut BitWriter, text: &str, offset: u64) {
    let count = text.chars().count() as u64;
    writer.write_uint(count + offset);
    write_code_points(writer, text);
}

/// Writes the code points of `text` without a length prefix.
pub fn write_code_points(writer: &mut BitWriter, text: &str) {
    for ch in text.chars() {
        writer.write_uint(u64::from(u32::from(ch)));
    }
}

/// Reads `count` code points written by [`write_code_points`].
pub fn read_code_points<R: Read>(reader: &mut BitReader<R>, count: usize) -> Result<String> {
    let mut out = String::with_capacity(count.min(PREALLOC_LIMIT));
    for _ in 0..count {
        let code = reader.read_uint32()?;
        let ch = char::from_u32(code)
            .ok_or_else(|| Error::invalid(format!("invalid code point {code:#x}")))?;
        out.push(ch);
    }
    Ok(out)
}

/// Reads a literal written by [`write_literal`] with offset zero.
pub fn read_literal<R: Read>(reader: &mut BitReader<R>) -> Result<String> {
    let count = reader.read_len()?;
    read_code_points(reader, count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_points_are_unsigned_integers() {
        let mut writer = BitWriter::byte_aligned();
        write_literal(&mut writer, "aé", 2);
        assert_eq!(writer.into_bytes(), [0x04, 0x61, 0xe9, 0x01]);
    }

    #[test]
    fn literals_round_trip_outside_the_bmp() {
        let mut writer = BitWriter::bit_packed();
        writer.write_bool(true);
        write_literal(&mut writer, "x\u{1f980}", 0);
        let bytes = writer.into_bytes();
        let mut reader = BitReader::bit_packed(bytes.as_slice());
        assert!(reader.read_bool().unwrap());
        assert_eq!(read_literal(&mut reader).unwrap(), "x\u{1f980}");
    }

    #[test]
    fn surrogates_are_rejected() {
        let mut writer = BitWriter::byte_aligned();
        writer.write_uint(1);
        writer.write_uint(0xd800);
        let bytes = writer.into_bytes();
        let mut reader = BitReader::byte_aligned(bytes.as_slice());
        assert!(matches!(read_literal(&mut reader), Err(Error::InvalidData(_))));
    }
}
