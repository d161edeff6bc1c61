#![allow(missing_docs)]

//! Wire encodings of the primitive value domains.
//!
//! Everything here writes through [`BitWriter`](crate::io::BitWriter) and reads
//! through [`BitReader`](crate::io::BitReader), so each codec works unchanged in
//! bit-packed and byte-aligned streams.

mod datetime;
mod decimal;
mod float;
mod integer;
mod string;
mod value;
mod varint;

pub use datetime::{read_datetime, write_datetime};
pub use decimal::{read_decimal, write_decimal};
pub use float::{read_float, write_float};
pub use integer::{
    read_bounded, read_i64, read_integer, read_unsigned, write_bounded, write_i64,
    write_integer, write_unsigned,
};
pub use string::{read_code_points, read_literal, write_code_points, write_literal};
pub use value::{scan_value, scribe_value};
pub use varint::{
    VARINT_MAX_LEN, VarintBuf, decode_varint, decode_varint_big_with, decode_varint_with,
    encode_varint, encode_varint_big,
};
