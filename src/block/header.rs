use std::io::{Cursor, Read, Write};

use tracing::debug;

use crate::error::{Error, Result};
use crate::io::{BitReader, BitWriter};
use crate::options::{CodecOptions, DEFAULT_BLOCK_SIZE};
use crate::types::Alignment;

/// Optional four-octet stream prefix.
pub const COOKIE: &[u8; 4] = b"$EXI";

const DISTINGUISHING_BITS: u32 = 0b10;
/// Version 1 is written as a zero preview bit followed by `0000`.
const VERSION_BITS: u32 = 0;

/// Stream header: format marker, alignment and the options the scanner must use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub cookie: bool,
    pub alignment: Alignment,
    pub block_size: usize,
    pub value_max_length: Option<usize>,
    pub value_partition_capacity: Option<usize>,
}

impl Default for Header {
    fn default() -> Self {
        Self::from_options(&CodecOptions::default())
    }
}

impl Header {
    pub fn from_options(options: &CodecOptions) -> Self {
        Self {
            cookie: options.include_cookie,
            alignment: options.alignment,
            block_size: options.block_size,
            value_max_length: options.value_max_length,
            value_partition_capacity: options.value_partition_capacity,
        }
    }

    /// Options described by the header; compression level is a scriber-only knob
    /// and stays at its default.
    pub fn options(&self) -> CodecOptions {
        CodecOptions {
            alignment: self.alignment,
            block_size: self.block_size,
            value_max_length: self.value_max_length,
            value_partition_capacity: self.value_partition_capacity,
            compression_level: None,
            include_cookie: self.cookie,
        }
    }

    fn has_options(&self) -> bool {
        self.options().has_non_default_settings()
    }

    /// Serialises the header, padded to a whole octet.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = BitWriter::bit_packed();
        writer.write_nbit(DISTINGUISHING_BITS, 2)?;
        let has_options = self.has_options();
        writer.write_bool(has_options);
        writer.write_bool(false);
        writer.write_nbit(VERSION_BITS, 4)?;
        writer.write_nbit(u32::from(u8::from(self.alignment)), 2)?;
        if has_options {
            writer.write_uint(self.block_size as u64);
            writer.write_uint(self.value_max_length.map_or(0, |n| n as u64 + 1));
            writer.write_uint(self.value_partition_capacity.map_or(0, |n| n as u64 + 1));
        }

        let mut out = Vec::with_capacity(8);
        if self.cookie {
            out.extend_from_slice(COOKIE);
        }
        out.extend_from_slice(&writer.into_bytes());
        Ok(out)
    }

    /// Writes the header and returns the number of octets written.
    pub fn write<W: Write + ?Sized>(&self, sink: &mut W) -> Result<usize> {
        let bytes = self.to_bytes()?;
        sink.write_all(&bytes)?;
        debug!(alignment = ?self.alignment, block_size = self.block_size, len = bytes.len(), "wrote stream header");
        Ok(bytes.len())
    }

    /// Reads a header, with or without cookie, consuming exactly its octets.
    pub fn read<R: Read + ?Sized>(reader: &mut R) -> Result<Self> {
        let mut first = [0u8; 1];
        reader.read_exact(&mut first).map_err(Error::from_read)?;
        let mut cookie = false;
        if first[0] == COOKIE[0] {
            let mut rest = [0u8; 3];
            reader.read_exact(&mut rest).map_err(Error::from_read)?;
            if rest != COOKIE[1..] {
                return Err(Error::invalid("malformed `$EXI` cookie"));
            }
            cookie = true;
            reader.read_exact(&mut first).map_err(Error::from_read)?;
        }

        let mut bits = BitReader::bit_packed(Cursor::new(first).chain(reader));
        if bits.read_nbit(2)? != DISTINGUISHING_BITS {
            return Err(Error::invalid("missing stream distinguishing bits"));
        }
        let has_options = bits.read_bool()?;
        if bits.read_bool()? {
            return Err(Error::unsupported("preview stream versions"));
        }
        let version = bits.read_nbit(4)?;
        if version != VERSION_BITS {
            return Err(Error::unsupported(format!("stream version {}", version + 1)));
        }
        let alignment = Alignment::try_from(bits.read_nbit(2)? as u8)
            .map_err(|err| Error::invalid(format!("alignment: {err}")))?;

        let mut header = Self {
            cookie,
            alignment,
            block_size: DEFAULT_BLOCK_SIZE,
            value_max_length: None,
            value_partition_capacity: None,
        };
        if has_options {
            header.block_size = bits.read_len()?;
            header.value_max_length = bits.read_len()?.checked_sub(1);
            header.value_partition_capacity = bits.read_len()?.checked_sub(1);
            if header.block_size == 0 {
                return Err(Error::invalid("header declares a zero block size"));
            }
        }
        debug!(alignment = ?header.alignment, block_size = header.block_size, "read stream header");
        Ok(header)
    }
}
