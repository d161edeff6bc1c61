use std::collections::HashMap;
use std::io::Read;

use crate::encoding::{read_code_points, read_literal, write_literal};
use crate::error::{Error, Result};
use crate::io::{BitReader, BitWriter};
use crate::types::QName;
use crate::util::{bit_width, index_u32};

/// Dense identifier of an interned [`QName`]; doubles as the channel key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NameId(u32);

impl NameId {
    /// The empty name in the empty namespace, keying anonymous items.
    pub const EMPTY: NameId = NameId(0);

    /// Position of the name in its [`NameTable`].
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone)]
struct NamespacePartition {
    uri: String,
    locals: Vec<NameId>,
    by_local: HashMap<String, u32>,
}

/// Interning table for names, partitioned by namespace.
///
/// Names written through a wildcard are added in the order they first appear, so
/// scribing and scanning sides grow identical tables.
#[derive(Debug, Clone)]
pub struct NameTable {
    names: Vec<QName>,
    by_name: HashMap<QName, NameId>,
    namespaces: Vec<NamespacePartition>,
    by_namespace: HashMap<String, usize>,
}

impl Default for NameTable {
    fn default() -> Self {
        Self::new()
    }
}

impl NameTable {
    /// Creates a table holding only [`NameId::EMPTY`].
    pub fn new() -> Self {
        let mut table = Self {
            names: Vec::new(),
            by_name: HashMap::new(),
            namespaces: Vec::new(),
            by_namespace: HashMap::new(),
        };
        table.intern(&QName::default());
        table
    }

    /// Number of interned names, including the empty name.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Always `false`: the empty name is interned at creation.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Id of `name` if it has been interned.
    pub fn lookup(&self, name: &QName) -> Option<NameId> {
        self.by_name.get(name).copied()
    }

    /// Name interned as `id`.
    pub fn get(&self, id: NameId) -> Option<&QName> {
        self.names.get(id.index())
    }

    /// Returns the id of `name`, adding it when unseen.
    pub fn intern(&mut self, name: &QName) -> NameId {
        if let Some(id) = self.lookup(name) {
            return id;
        }
        let partition = self.intern_namespace(&name.namespace);
        self.add_local(partition, name.local.clone())
    }

    /// Adds a namespace partition when unseen and returns its index.
    pub fn intern_namespace(&mut self, uri: &str) -> usize {
        if let Some(&idx) = self.by_namespace.get(uri) {
            return idx;
        }
        let idx = self.namespaces.len();
        self.namespaces.push(NamespacePartition {
            uri: uri.to_string(),
            locals: Vec::new(),
            by_local: HashMap::new(),
        });
        self.by_namespace.insert(uri.to_string(), idx);
        idx
    }

    fn add_local(&mut self, partition: usize, local: String) -> NameId {
        let id = NameId(self.names.len() as u32);
        let entry = &mut self.namespaces[partition];
        let name = QName::new(entry.uri.clone(), local.clone());
        entry.by_local.insert(local, entry.locals.len() as u32);
        entry.locals.push(id);
        self.by_name.insert(name.clone(), id);
        self.names.push(name);
        id
    }

    /// Writes a wildcard-matched name. When `namespace_fixed` is set the grammar
    /// already determines the namespace and only the local name is written.
    pub fn scribe(
        &mut self,
        writer: &mut BitWriter,
        name: &QName,
        namespace_fixed: bool,
    ) -> Result<NameId> {
        let partition = if namespace_fixed {
            self.intern_namespace(&name.namespace)
        } else {
            let width = bit_width(self.namespaces.len() + 1);
            match self.by_namespace.get(&name.namespace) {
                Some(&idx) => {
                    writer.write_nbit(index_u32(idx + 1, "namespace")?, width)?;
                    idx
                }
                None => {
                    writer.write_nbit(0, width)?;
                    write_literal(writer, &name.namespace, 0);
                    self.intern_namespace(&name.namespace)
                }
            }
        };

        let entry = &self.namespaces[partition];
        match entry.by_local.get(&name.local).copied() {
            Some(local_id) => {
                writer.write_uint(0);
                writer.write_nbit(local_id, bit_width(entry.locals.len()))?;
                Ok(entry.locals[local_id as usize])
            }
            None => {
                write_literal(writer, &name.local, 1);
                Ok(self.add_local(partition, name.local.clone()))
            }
        }
    }

    /// Reads a name written by [`NameTable::scribe`]. `namespace` carries the
    /// namespace fixed by the grammar, if any.
    pub fn scan<R: Read>(
        &mut self,
        reader: &mut BitReader<R>,
        namespace: Option<&str>,
    ) -> Result<NameId> {
        let partition = match namespace {
            Some(uri) => self.intern_namespace(uri),
            None => {
                let width = bit_width(self.namespaces.len() + 1);
                match reader.read_nbit(width)? as usize {
                    0 => {
                        let uri = read_literal(reader)?;
                        self.intern_namespace(&uri)
                    }
                    hit if hit <= self.namespaces.len() => hit - 1,
                    other => {
                        return Err(Error::invalid(format!(
                            "namespace id {other} out of range"
                        )));
                    }
                }
            }
        };

        let len = reader.read_len()?;
        if len == 0 {
            let entry = &self.namespaces[partition];
            let local_id = reader.read_nbit(bit_width(entry.locals.len()))? as usize;
            entry.locals.get(local_id).copied().ok_or_else(|| {
                Error::invalid(format!(
                    "local name id {local_id} out of range in namespace `{}`",
                    entry.uri
                ))
            })
        } else {
            let local = read_code_points(reader, len - 1)?;
            let entry = &self.namespaces[partition];
            match entry.by_local.get(&local).copied() {
                Some(local_id) => Ok(entry.locals[local_id as usize]),
                None => Ok(self.add_local(partition, local)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_name_is_preinterned() {
        let table = NameTable::new();
        assert_eq!(table.lookup(&QName::default()), Some(NameId::EMPTY));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn second_occurrence_is_a_hit() {
        let mut writer_table = NameTable::new();
        let mut writer = BitWriter::bit_packed();
        let name = QName::new("urn:x", "item");
        let first = writer_table.scribe(&mut writer, &name, false).unwrap();
        let second = writer_table.scribe(&mut writer, &name, false).unwrap();
        assert_eq!(first, second);
        let bytes = writer.into_bytes();

        let mut reader_table = NameTable::new();
        let mut reader = BitReader::bit_packed(bytes.as_slice());
        let a = reader_table.scan(&mut reader, None).unwrap();
        let b = reader_table.scan(&mut reader, None).unwrap();
        assert_eq!(a, b);
        assert_eq!(reader_table.get(a), Some(&name));
    }

    #[test]
    fn fixed_namespace_writes_only_the_local_name() {
        let mut table = NameTable::new();
        table.intern_namespace("urn:y");
        let mut writer = BitWriter::byte_aligned();
        table
            .scribe(&mut writer, &QName::new("urn:y", "k"), true)
            .unwrap();
        assert_eq!(writer.into_bytes(), [0x02, b'k']);
    }
}
