#![allow(missing_docs)]

//! Compression backends for the streams of a block.
//!
//! Every stream is compressed independently, so each one starts with a fresh
//! deflate window.

use std::io::BufRead;

use crate::error::Result;

/// Compresses one complete stream.
pub trait Compressor {
    fn compress(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<()>;
}

/// Expands one stream from `input`, consuming exactly its compressed octets.
pub trait Decompressor {
    fn decompress(&mut self, input: &mut dyn BufRead, output: &mut Vec<u8>) -> Result<()>;
}

/// Pass-through compressor used by the pre-compression alignment.
#[derive(Debug, Default)]
pub struct NullCompressor;

impl Compressor for NullCompressor {
    fn compress(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<()> {
        output.extend_from_slice(input);
        Ok(())
    }
}

#[cfg(feature = "deflate")]
mod deflate {
    use std::io::{BufRead, Read, Write};

    use flate2::Compression;
    use flate2::bufread::DeflateDecoder;
    use flate2::write::DeflateEncoder;

    use super::{Compressor, Decompressor};
    use crate::error::Result;

    /// Raw deflate, one stream per call.
    #[derive(Debug)]
    pub struct DeflateCompressor {
        level: Compression,
    }

    impl DeflateCompressor {
        pub fn new(level: Option<u32>) -> Self {
            Self {
                level: level.map_or_else(Compression::default, Compression::new),
            }
        }
    }

    impl Default for DeflateCompressor {
        fn default() -> Self {
            Self::new(None)
        }
    }

    impl Compressor for DeflateCompressor {
        fn compress(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<()> {
            let mut encoder = DeflateEncoder::new(output, self.level);
            encoder.write_all(input)?;
            encoder.finish()?;
            Ok(())
        }
    }

    #[derive(Debug, Default)]
    pub struct DeflateDecompressor;

    impl Decompressor for DeflateDecompressor {
        fn decompress(&mut self, input: &mut dyn BufRead, output: &mut Vec<u8>) -> Result<()> {
            let mut decoder = DeflateDecoder::new(input);
            decoder.read_to_end(output)?;
            Ok(())
        }
    }
}

#[cfg(feature = "deflate")]
pub use deflate::{DeflateCompressor, DeflateDecompressor};

/// Picks the compressor for a stream: deflate when `compressed`, pass-through
/// otherwise.
pub fn compressor_for(compressed: bool, level: Option<u32>) -> Result<Box<dyn Compressor + Send>> {
    if !compressed {
        return Ok(Box::new(NullCompressor));
    }
    cfg_if::cfg_if! {
        if #[cfg(feature = "deflate")] {
            Ok(Box::new(DeflateCompressor::new(level)))
        } else {
            let _ = level;
            Err(crate::error::Error::unsupported("compression alignment requires the `deflate` feature"))
        }
    }
}

/// Decompressor matching [`compressor_for`] with `compressed` set.
pub fn decompressor() -> Result<Box<dyn Decompressor + Send>> {
    cfg_if::cfg_if! {
        if #[cfg(feature = "deflate")] {
            Ok(Box::new(DeflateDecompressor))
        } else {
            Err(crate::error::Error::unsupported("compression alignment requires the `deflate` feature"))
        }
    }
}
