#![allow(missing_docs)]

//! Bit-level primitive sinks and sources.
//!
//! [`BitWriter`] and [`BitReader`] implement the three physical layouts of a stream
//! body: bit-packed, byte-aligned, and byte-aligned for compression (the latter two
//! share the same primitive layout; only the channelling layer above differs).

mod bit_reader;
mod bit_writer;

pub use bit_reader::BitReader;
pub use bit_writer::BitWriter;
