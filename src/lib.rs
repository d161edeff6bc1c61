#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Stream header and the channel bookkeeping of compressed blocks.
pub mod block;
/// Compression backends for the streams of a block.
pub mod compression;
/// Primitive value codecs and the variable-length integer encoding.
pub mod encoding;
/// Shared error and result types.
pub mod error;
/// Grammars, their builders and the per-session cursor.
pub mod grammar;
/// Bit-level primitive writers and readers.
pub mod io;
/// Codec configuration.
pub mod options;
/// Streaming decoder.
pub mod reader;
/// Name and string-value tables.
pub mod table;
/// Events, values and the enumerations shared by both directions.
pub mod types;
/// Miscellaneous helpers.
pub mod util;
/// Streaming encoder.
pub mod writer;

#[cfg(feature = "serde")]
pub mod serde_support;

pub use block::{BlockPlan, Channel, ChannelKeeper, Header, SMALL_CHANNEL_LIMIT};
pub use compression::{Compressor, Decompressor, NullCompressor};
pub use error::{Error, Result};
pub use grammar::{
    CodeLayout, EventCode, EventType, Grammar, GrammarBuilder, GrammarCursor, GrammarDefinition,
    GrammarState, NamePattern, Production, ProductionDefinition, StateDefinition, StateId, Target,
};
pub use options::{CodecOptions, DEFAULT_BLOCK_SIZE, validate_options};
pub use reader::{Scanner, ScannerBuilder, decode_events};
#[cfg(feature = "serde")]
pub use serde_support::{load_grammar, read_events, write_events};
pub use table::{NameId, NameTable, StringLookup, StringTable};
pub use types::*;
pub use writer::{Scriber, ScriberBuilder, encode_events};
