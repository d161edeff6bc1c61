use std::io::Write;

use num_bigint::BigUint;
use num_traits::ToPrimitive;

use crate::encoding::{VarintBuf, encode_varint, encode_varint_big};
use crate::error::{Error, Result};

/// Primitive writer over a growable octet buffer.
///
/// Bit-packed writers pack every primitive into its minimum width, MSB-first within
/// each octet. Byte-aligned writers pad every primitive to whole octets.
#[derive(Debug, Clone, Default)]
pub struct BitWriter {
    buf: Vec<u8>,
    partial: u8,
    partial_bits: u8,
    byte_aligned: bool,
}

impl BitWriter {
    /// Creates a writer using the bit-packed layout.
    pub fn bit_packed() -> Self {
        Self::default()
    }

    /// Creates a writer using the byte-aligned layout.
    pub fn byte_aligned() -> Self {
        Self {
            byte_aligned: true,
            ..Self::default()
        }
    }

    /// Creates a writer with the requested layout.
    pub fn new(byte_aligned: bool) -> Self {
        if byte_aligned {
            Self::byte_aligned()
        } else {
            Self::bit_packed()
        }
    }

    /// Returns `true` when every primitive is padded to octets.
    pub fn is_byte_aligned(&self) -> bool {
        self.byte_aligned
    }

    /// Number of bits written so far (including pending partial bits).
    pub fn bit_len(&self) -> usize {
        self.buf.len() * 8 + usize::from(self.partial_bits)
    }

    /// Returns `true` when nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty() && self.partial_bits == 0
    }

    /// Writes a single boolean: one bit, or one octet when byte-aligned.
    pub fn write_bool(&mut self, value: bool) {
        if self.byte_aligned {
            self.buf.push(u8::from(value));
        } else {
            self.put_bits(u64::from(value), 1);
        }
    }

    /// Writes `value` as an unsigned integer of exactly `width` bits.
    ///
    /// A width of zero writes nothing. Byte-aligned writers emit `ceil(width / 8)`
    /// octets, least significant octet first.
    pub fn write_nbit(&mut self, value: u32, width: u8) -> Result<()> {
        if width > 32 {
            return Err(Error::invalid(format!(
                "n-bit width {width} exceeds 32 bits"
            )));
        }
        if width < 32 && u64::from(value) >= 1u64 << width {
            return Err(Error::invalid(format!(
                "value {value} does not fit into {width} bits"
            )));
        }
        if width == 0 {
            return Ok(());
        }
        if self.byte_aligned {
            for i in 0..width.div_ceil(8) {
                self.buf.push((value >> (u32::from(i) * 8)) as u8);
            }
        } else {
            self.put_bits(u64::from(value), width);
        }
        Ok(())
    }

    /// Writes a single octet as eight bits (bit-packed) or verbatim (byte-aligned).
    pub fn write_octet(&mut self, octet: u8) {
        if self.byte_aligned || self.partial_bits == 0 {
            self.buf.push(octet);
        } else {
            self.put_bits(u64::from(octet), 8);
        }
    }

    /// Writes a run of octets.
    pub fn write_octets(&mut self, octets: &[u8]) {
        if self.byte_aligned || self.partial_bits == 0 {
            self.buf.extend_from_slice(octets);
        } else {
            for &octet in octets {
                self.put_bits(u64::from(octet), 8);
            }
        }
    }

    /// Writes an unsigned integer using the 7-bits-per-octet continuation encoding.
    pub fn write_uint(&mut self, value: u64) {
        if self.byte_aligned || self.partial_bits == 0 {
            encode_varint(value, &mut self.buf);
        } else {
            let mut scratch = VarintBuf::new();
            encode_varint(value, &mut scratch);
            self.write_octets(&scratch);
        }
    }

    /// Writes an unsigned 32-bit integer.
    pub fn write_uint32(&mut self, value: u32) {
        self.write_uint(u64::from(value));
    }

    /// Writes an arbitrary-precision unsigned integer.
    pub fn write_big_uint(&mut self, value: &BigUint) {
        if let Some(small) = value.to_u64() {
            self.write_uint(small);
            return;
        }
        let mut scratch = Vec::new();
        encode_varint_big(value, &mut scratch);
        self.write_octets(&scratch);
    }

    /// Pads the pending partial octet with zero bits.
    pub fn align(&mut self) {
        if self.partial_bits > 0 {
            self.buf.push(self.partial);
            self.partial = 0;
            self.partial_bits = 0;
        }
    }

    /// Writes every completed octet to `sink`, keeping pending partial bits.
    pub fn drain_to<W: Write + ?Sized>(&mut self, sink: &mut W) -> Result<usize> {
        let drained = self.buf.len();
        if drained > 0 {
            sink.write_all(&self.buf)?;
            self.buf.clear();
        }
        Ok(drained)
    }

    /// Returns the completed octets written so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Pads to an octet boundary and returns the buffer.
    pub fn into_bytes(mut self) -> Vec<u8> {
        self.align();
        self.buf
    }

    /// Pads to an octet boundary and takes the buffer, leaving the writer empty.
    pub fn take_bytes(&mut self) -> Vec<u8> {
        self.align();
        std::mem::take(&mut self.buf)
    }

    fn put_bits(&mut self, value: u64, mut count: u8) {
        while count > 0 {
            let free = 8 - self.partial_bits;
            let take = free.min(count);
            let shift = count - take;
            let chunk = ((value >> shift) & ((1u64 << take) - 1)) as u8;
            self.partial |= chunk << (free - take);
            self.partial_bits += take;
            count -= take;
            if self.partial_bits == 8 {
                self.buf.push(self.partial);
                self.partial = 0;
                self.partial_bits = 0;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bits_pack_msb_first() {
        let mut writer = BitWriter::bit_packed();
        writer.write_bool(true);
        writer.write_nbit(0b01, 2).unwrap();
        assert_eq!(writer.bit_len(), 3);
        assert_eq!(writer.into_bytes(), [0b1010_0000]);
    }

    #[test]
    fn zero_width_is_a_no_op() {
        let mut writer = BitWriter::bit_packed();
        writer.write_nbit(0, 0).unwrap();
        assert!(writer.is_empty());
        assert!(writer.write_nbit(1, 0).is_err());
    }

    #[test]
    fn byte_aligned_pads_each_primitive() {
        let mut writer = BitWriter::byte_aligned();
        writer.write_bool(true);
        writer.write_nbit(0x1ff, 9).unwrap();
        assert_eq!(writer.into_bytes(), [0x01, 0xff, 0x01]);
    }

    #[test]
    fn octets_straddle_partial_bits() {
        let mut writer = BitWriter::bit_packed();
        writer.write_bool(true);
        writer.write_uint(0x7f);
        assert_eq!(writer.into_bytes(), [0b1011_1111, 0b1000_0000]);
    }

    #[test]
    fn rejects_oversized_values() {
        let mut writer = BitWriter::bit_packed();
        assert!(writer.write_nbit(4, 2).is_err());
        assert!(writer.write_nbit(0, 33).is_err());
        assert!(writer.write_nbit(u32::MAX, 32).is_ok());
    }

    #[test]
    fn drain_keeps_partial_bits() {
        let mut writer = BitWriter::bit_packed();
        writer.write_nbit(0xab, 8).unwrap();
        writer.write_bool(true);
        let mut sink = Vec::new();
        assert_eq!(writer.drain_to(&mut sink).unwrap(), 1);
        assert_eq!(sink, [0xab]);
        assert_eq!(writer.bit_len(), 1);
        assert_eq!(writer.into_bytes(), [0x80]);
    }
}
