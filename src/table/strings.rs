use std::collections::HashMap;
use std::io::Read;

use tracing::trace;

use crate::encoding::{read_code_points, write_literal};
use crate::error::{Error, Result};
use crate::io::{BitReader, BitWriter};
use crate::table::NameId;
use crate::util::bit_width;

/// Outcome of looking a string value up for a given name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringLookup {
    /// Found in the partition of the same name.
    LocalHit(u32),
    /// Found, but first added under another name.
    GlobalHit(u32),
    /// Not in either partition.
    Miss,
}

#[derive(Debug, Clone)]
struct StringEntry {
    value: String,
    owner: NameId,
    local: u32,
}

/// Adaptive table of previously seen string values.
///
/// Every value lives in one global partition and in the local partition of the
/// name it first appeared under. Values are added only when non-empty, no longer
/// than the configured maximum, and while the global partition is below capacity.
/// Identifiers are assigned densely and never reused.
#[derive(Debug, Clone, Default)]
pub struct StringTable {
    entries: Vec<StringEntry>,
    by_value: HashMap<String, u32>,
    locals: HashMap<NameId, Vec<u32>>,
    max_length: Option<usize>,
    capacity: Option<usize>,
}

impl StringTable {
    /// Empty table. `max_length` bounds the strings it remembers and `capacity` the
    /// global partition; `None` is unbounded.
    pub fn new(max_length: Option<usize>, capacity: Option<usize>) -> Self {
        Self {
            max_length,
            capacity,
            ..Self::default()
        }
    }

    /// Number of strings in the global partition.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when nothing has been remembered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of strings in the local partition of `name`.
    pub fn local_len(&self, name: NameId) -> usize {
        self.locals.get(&name).map_or(0, Vec::len)
    }

    /// Global entry `id`.
    pub fn global(&self, id: u32) -> Option<&str> {
        self.entries.get(id as usize).map(|entry| entry.value.as_str())
    }

    /// Entry `id` of the local partition of `name`.
    pub fn local(&self, name: NameId, id: u32) -> Option<&str> {
        let global = *self.locals.get(&name)?.get(id as usize)?;
        self.global(global)
    }

    /// Where `value` is known for a value named `name`.
    pub fn lookup(&self, name: NameId, value: &str) -> StringLookup {
        let Some(&global) = self.by_value.get(value) else {
            return StringLookup::Miss;
        };
        let entry = &self.entries[global as usize];
        if entry.owner == name {
            StringLookup::LocalHit(entry.local)
        } else {
            StringLookup::GlobalHit(global)
        }
    }

    /// Adds `value` under `name` when the table rules permit; returns whether it was
    /// added.
    pub fn add(&mut self, name: NameId, value: &str) -> bool {
        let chars = value.chars().count();
        if chars == 0 || self.max_length.is_some_and(|max| chars > max) {
            return false;
        }
        if self.capacity.is_some_and(|cap| self.entries.len() >= cap) {
            return false;
        }
        if self.by_value.contains_key(value) {
            return false;
        }
        let global = self.entries.len() as u32;
        let locals = self.locals.entry(name).or_default();
        self.entries.push(StringEntry {
            value: value.to_string(),
            owner: name,
            local: locals.len() as u32,
        });
        locals.push(global);
        self.by_value.insert(value.to_string(), global);
        trace!(global, len = chars, "string table add");
        true
    }

    /// Looks `value` up and, on a miss, adds it under `name`.
    pub fn intern_value(&mut self, name: NameId, value: &str) -> StringLookup {
        let lookup = self.lookup(name, value);
        if lookup == StringLookup::Miss {
            self.add(name, value);
        }
        lookup
    }

    /// Writes `value` as a local hit, a global hit or a literal, updating the table.
    pub fn scribe(&mut self, writer: &mut BitWriter, name: NameId, value: &str) -> Result<StringLookup> {
        // Hit ids are written with the widths of the table before any addition.
        let lookup = self.lookup(name, value);
        match lookup {
            StringLookup::LocalHit(id) => {
                writer.write_uint(0);
                writer.write_nbit(id, bit_width(self.local_len(name)))?;
            }
            StringLookup::GlobalHit(id) => {
                writer.write_uint(1);
                writer.write_nbit(id, bit_width(self.len()))?;
            }
            StringLookup::Miss => {
                write_literal(writer, value, 2);
                self.add(name, value);
            }
        }
        Ok(lookup)
    }

    /// Reads a value written by [`StringTable::scribe`].
    pub fn scan<R: Read>(&mut self, reader: &mut BitReader<R>, name: NameId) -> Result<String> {
        match reader.read_len()? {
            0 => {
                let id = reader.read_nbit(bit_width(self.local_len(name)))?;
                self.local(name, id)
                    .map(str::to_string)
                    .ok_or_else(|| Error::invalid(format!("local string id {id} out of range")))
            }
            1 => {
                let id = reader.read_nbit(bit_width(self.len()))?;
                self.global(id)
                    .map(str::to_string)
                    .ok_or_else(|| Error::invalid(format!("global string id {id} out of range")))
            }
            len => {
                let value = read_code_points(reader, len - 2)?;
                self.add(name, &value);
                Ok(value)
            }
        }
    }
}
