use crate::error::{Error, Result};
use crate::types::Alignment;

/// Default number of values per block.
pub const DEFAULT_BLOCK_SIZE: usize = 1_000_000;

/// Highest deflate level accepted.
pub const MAX_COMPRESSION_LEVEL: u32 = 9;

/// Codec configuration shared by both sides of a stream.
///
/// Everything except `compression_level` and `include_cookie` is recorded in the
/// stream header, so a scanner always runs with the scriber's settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecOptions {
    /// Physical layout of the body.
    pub alignment: Alignment,
    /// Values per block in channelled alignments.
    pub block_size: usize,
    /// Longest string value (in characters) added to the string table.
    pub value_max_length: Option<usize>,
    /// Maximum number of entries in the string table.
    pub value_partition_capacity: Option<usize>,
    /// Deflate level (0-9) for [`Alignment::Compression`]; `None` picks the default.
    pub compression_level: Option<u32>,
    /// Prefix the stream with the `$EXI` cookie.
    pub include_cookie: bool,
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self {
            alignment: Alignment::BitPacked,
            block_size: DEFAULT_BLOCK_SIZE,
            value_max_length: None,
            value_partition_capacity: None,
            compression_level: None,
            include_cookie: false,
        }
    }
}

impl CodecOptions {
    /// Options using `alignment` and defaults elsewhere.
    pub fn with_alignment(alignment: Alignment) -> Self {
        Self {
            alignment,
            ..Self::default()
        }
    }

    /// Returns `true` when the header must carry the options.
    pub(crate) fn has_non_default_settings(&self) -> bool {
        self.block_size != DEFAULT_BLOCK_SIZE
            || self.value_max_length.is_some()
            || self.value_partition_capacity.is_some()
    }
}

/// Rejects option combinations that cannot produce a valid stream.
pub fn validate_options(options: &CodecOptions) -> Result<()> {
    if options.block_size == 0 {
        return Err(Error::config("block size must be at least 1"));
    }
    if u32::try_from(options.block_size).is_err() {
        return Err(Error::config(format!(
            "block size {} exceeds the supported maximum of {}",
            options.block_size,
            u32::MAX
        )));
    }
    if let Some(level) = options.compression_level {
        if level > MAX_COMPRESSION_LEVEL {
            return Err(Error::config(format!(
                "compression level {level} exceeds {MAX_COMPRESSION_LEVEL}"
            )));
        }
    }
    if options.alignment.is_compressed() {
        #[cfg(not(feature = "deflate"))]
        {
            return Err(Error::unsupported(
                "compression alignment requires the `deflate` feature",
            ));
        }
    }
    Ok(())
}
