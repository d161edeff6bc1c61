//! JSON forms of grammars and event streams.
//!
//! Numbers that do not fit JSON's double precision (integers, decimals, floats) are
//! serialised in their lexical form through [`lexical`].

use std::io::{Read, Write};

use crate::error::{Error, Result};
use crate::grammar::{Grammar, GrammarDefinition};
use crate::types::Event;

/// `serde(with = ...)` adapter for types with a lexical string form.
pub mod lexical {
    use std::fmt::Display;
    use std::str::FromStr;

    use serde::{Deserialize, Deserializer, Serializer, de};

    /// Writes `value` as its canonical string.
    pub fn serialize<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Display,
        S: Serializer,
    {
        serializer.collect_str(value)
    }

    /// Parses a value from its canonical string.
    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        T: FromStr,
        T::Err: Display,
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(de::Error::custom)
    }
}

fn json_error(err: serde_json::Error) -> Error {
    if err.is_io() {
        Error::Io(err.into())
    } else {
        Error::invalid(format!("json: {err}"))
    }
}

/// Reads a [`GrammarDefinition`] in JSON form and compiles it.
pub fn load_grammar<R: Read>(reader: R) -> Result<Grammar> {
    let definition: GrammarDefinition = serde_json::from_reader(reader).map_err(json_error)?;
    definition.compile()
}

/// Reads a JSON array of events.
pub fn read_events<R: Read>(reader: R) -> Result<Vec<Event>> {
    serde_json::from_reader(reader).map_err(json_error)
}

/// Writes events as a pretty-printed JSON array.
pub fn write_events<W: Write>(mut writer: W, events: &[Event]) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, events).map_err(json_error)?;
    writer.write_all(b"\n")?;
    Ok(())
}
