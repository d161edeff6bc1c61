//! Adaptive tables shared by the scribing and scanning sides of a stream.
//!
//! [`NameTable`] interns container and value names (their ids key the value
//! channels); [`StringTable`] remembers string values so repeats are written as
//! compact identifiers.

mod names;
mod strings;

pub use names::{NameId, NameTable};
pub use strings::{StringLookup, StringTable};
