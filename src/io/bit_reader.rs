use std::io::Read;

use num_bigint::BigUint;

use crate::encoding::{decode_varint_big_with, decode_varint_with};
use crate::error::{Error, Result};

/// Primitive reader mirroring [`BitWriter`](super::BitWriter).
///
/// The reader pulls one octet at a time from `inner`; wrap unbuffered sources in a
/// [`std::io::BufReader`].
#[derive(Debug)]
pub struct BitReader<R> {
    inner: R,
    partial: u8,
    partial_bits: u8,
    byte_aligned: bool,
}

impl<R: Read> BitReader<R> {
    /// Creates a reader with the requested layout.
    pub fn new(inner: R, byte_aligned: bool) -> Self {
        Self {
            inner,
            partial: 0,
            partial_bits: 0,
            byte_aligned,
        }
    }

    /// Creates a bit-packed reader.
    pub fn bit_packed(inner: R) -> Self {
        Self::new(inner, false)
    }

    /// Creates a byte-aligned reader.
    pub fn byte_aligned(inner: R) -> Self {
        Self::new(inner, true)
    }

    /// Returns `true` when every primitive is padded to octets.
    pub fn is_byte_aligned(&self) -> bool {
        self.byte_aligned
    }

    /// Reads a boolean (one bit, or one octet when byte-aligned).
    pub fn read_bool(&mut self) -> Result<bool> {
        if self.byte_aligned {
            match self.raw_octet()? {
                0 => Ok(false),
                1 => Ok(true),
                other => Err(Error::invalid(format!("boolean octet {other:#04x}"))),
            }
        } else {
            Ok(self.get_bits(1)? == 1)
        }
    }

    /// Reads an unsigned integer of exactly `width` bits; width zero yields `0`.
    pub fn read_nbit(&mut self, width: u8) -> Result<u32> {
        if width > 32 {
            return Err(Error::invalid(format!(
                "n-bit width {width} exceeds 32 bits"
            )));
        }
        if width == 0 {
            return Ok(0);
        }
        if self.byte_aligned {
            let mut value = 0u64;
            for i in 0..width.div_ceil(8) {
                value |= u64::from(self.raw_octet()?) << (u32::from(i) * 8);
            }
            if width < 32 && value >= 1u64 << width {
                return Err(Error::invalid(format!(
                    "value {value} does not fit into {width} bits"
                )));
            }
            Ok(value as u32)
        } else {
            Ok(self.get_bits(width)? as u32)
        }
    }

    /// Reads a single octet.
    pub fn read_octet(&mut self) -> Result<u8> {
        if self.byte_aligned || self.partial_bits == 0 {
            self.raw_octet()
        } else {
            Ok(self.get_bits(8)? as u8)
        }
    }

    /// Reads `len` octets.
    pub fn read_octets(&mut self, len: usize) -> Result<Vec<u8>> {
        if self.byte_aligned || self.partial_bits == 0 {
            let mut out = Vec::new();
            let read = (&mut self.inner)
                .take(len as u64)
                .read_to_end(&mut out)
                .map_err(Error::from_read)?;
            if read != len {
                return Err(Error::PrematureEnd);
            }
            Ok(out)
        } else {
            (0..len).map(|_| self.read_octet()).collect()
        }
    }

    /// Reads an unsigned integer encoded with 7-bit continuation groups.
    pub fn read_uint(&mut self) -> Result<u64> {
        decode_varint_with(|| self.read_octet())
    }

    /// Reads an unsigned integer that must fit into 32 bits.
    pub fn read_uint32(&mut self) -> Result<u32> {
        let value = self.read_uint()?;
        u32::try_from(value)
            .map_err(|_| Error::invalid(format!("unsigned integer {value} exceeds 32 bits")))
    }

    /// Reads an unsigned integer bounded only by memory.
    pub fn read_big_uint(&mut self) -> Result<BigUint> {
        decode_varint_big_with(|| self.read_octet())
    }

    /// Reads an unsigned integer used as a length or count.
    pub fn read_len(&mut self) -> Result<usize> {
        let value = self.read_uint()?;
        usize::try_from(value)
            .map_err(|_| Error::invalid(format!("length {value} exceeds addressable memory")))
    }

    /// Discards the remaining bits of the current octet.
    pub fn align(&mut self) {
        self.partial = 0;
        self.partial_bits = 0;
    }

    /// Returns a mutable reference to the underlying source.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    /// Consumes the reader, yielding the underlying source.
    pub fn into_inner(self) -> R {
        self.inner
    }

    fn raw_octet(&mut self) -> Result<u8> {
        let mut byte = [0u8; 1];
        self.inner.read_exact(&mut byte).map_err(Error::from_read)?;
        Ok(byte[0])
    }

    fn get_bits(&mut self, mut count: u8) -> Result<u64> {
        let mut value = 0u64;
        while count > 0 {
            if self.partial_bits == 0 {
                self.partial = self.raw_octet()?;
                self.partial_bits = 8;
            }
            let take = self.partial_bits.min(count);
            let shift = self.partial_bits - take;
            let chunk = (u16::from(self.partial) >> shift) & ((1u16 << take) - 1);
            value = (value << take) | u64::from(chunk);
            self.partial_bits -= take;
            count -= take;
        }
        Ok(value)
    }
}
