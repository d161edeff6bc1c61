#![allow(missing_docs)]

//! Streaming decoder reconstructing the event stream.

use std::collections::VecDeque;
use std::io::{BufRead, Cursor, Read};
use std::sync::Arc;

use tracing::{debug, trace};

use crate::block::{ChannelBatch, ChannelKeeper, Header};
use crate::compression::{Decompressor, decompressor};
use crate::encoding::scan_value;
use crate::error::{Error, Result};
use crate::grammar::{Grammar, GrammarCursor, NamePattern};
use crate::io::BitReader;
use crate::options::{CodecOptions, validate_options};
use crate::table::{NameId, NameTable, StringTable};
use crate::types::{Event, EventKind, Value, ValueDomain};

/// Builder used to construct a [`Scanner`].
pub struct ScannerBuilder<R: BufRead> {
    source: R,
    grammar: Arc<Grammar>,
}

impl<R: BufRead> ScannerBuilder<R> {
    pub fn new(source: R, grammar: Arc<Grammar>) -> Self {
        Self { source, grammar }
    }

    /// Reads the stream header and configures the scanner from it.
    pub fn build(mut self) -> Result<Scanner<R>> {
        let header = Header::read(&mut self.source)?;
        Scanner::with_header(self.source, self.grammar, header)
    }
}

/// Where a deferred value goes once its channel is read.
#[derive(Debug, Clone, Copy)]
struct ValueSlot {
    index: usize,
    domain: ValueDomain,
}

/// Session tables; kept apart from the source so both can be borrowed at once.
#[derive(Debug)]
struct ScanContext {
    cursor: GrammarCursor,
    names: NameTable,
    strings: StringTable,
}

impl ScanContext {
    /// Reads one event's structure. Values are read in place when `inline`;
    /// otherwise the event carries [`Value::Null`] and the channel key and domain
    /// of the missing value are returned.
    fn read_event<S: Read>(
        &mut self,
        reader: &mut BitReader<S>,
        inline: bool,
    ) -> Result<(Event, Option<(NameId, ValueDomain)>)> {
        let grammar = Arc::clone(self.cursor.grammar());
        let state = grammar.state(self.cursor.state_id()?);
        let event_type = state.read_code(reader)?;
        trace!(state = state.label(), kind = ?event_type.kind(), "read event code");

        let id = match event_type.pattern() {
            NamePattern::Exact(name) => Some(self.names.lookup(name).ok_or_else(|| {
                Error::grammar(format!("name `{name}` missing from the name table"))
            })?),
            NamePattern::Namespace(uri) => Some(self.names.scan(reader, Some(uri))?),
            NamePattern::Any => Some(self.names.scan(reader, None)?),
            NamePattern::Anonymous => None,
        };
        let name = match id {
            Some(id) => Some(
                self.names
                    .get(id)
                    .cloned()
                    .ok_or_else(|| Error::invalid(format!("unknown name id {}", id.index())))?,
            ),
            None => None,
        };

        let mut deferred = None;
        let event = match event_type.kind() {
            EventKind::StartDocument => Event::StartDocument,
            EventKind::EndDocument => Event::EndDocument,
            EventKind::StartContainer => Event::StartContainer(name),
            EventKind::EndContainer => Event::EndContainer,
            EventKind::Value => {
                let key = id.unwrap_or_else(|| self.cursor.container());
                let domain = event_type
                    .domain()
                    .ok_or_else(|| Error::grammar("value event type without a domain"))?;
                let value = if inline {
                    scan_value(domain, key, &mut self.strings, reader)?
                } else {
                    deferred = Some((key, domain));
                    Value::Null
                };
                Event::Value { name, value }
            }
        };

        self.cursor.advance(event_type.target(), id)?;
        Ok((event, deferred))
    }
}

/// Decoder session.
///
/// Inline alignments decode one event per call. Channelled alignments decode a
/// whole block at a time: first its structure, then the value channels, which
/// fill the placeholders left in the structure.
pub struct Scanner<R: BufRead> {
    source: BitReader<R>,
    header: Header,
    context: ScanContext,
    keeper: ChannelKeeper<ValueSlot>,
    decompressor: Option<Box<dyn Decompressor + Send>>,
    ready: VecDeque<Event>,
    done: bool,
}

impl<R: BufRead> Scanner<R> {
    pub fn builder(source: R, grammar: Arc<Grammar>) -> ScannerBuilder<R> {
        ScannerBuilder::new(source, grammar)
    }

    fn with_header(source: R, grammar: Arc<Grammar>, header: Header) -> Result<Self> {
        let options = header.options();
        validate_options(&options)?;
        let alignment = header.alignment;
        let decompressor = if alignment.is_compressed() {
            Some(decompressor()?)
        } else {
            None
        };
        let mut names = NameTable::new();
        grammar.preload(&mut names);
        debug!(
            alignment = ?alignment,
            block_size = header.block_size,
            "scanner session started"
        );
        Ok(Self {
            source: BitReader::new(source, alignment.is_byte_aligned()),
            context: ScanContext {
                cursor: GrammarCursor::new(grammar),
                names,
                strings: StringTable::new(
                    header.value_max_length,
                    header.value_partition_capacity,
                ),
            },
            keeper: ChannelKeeper::new(header.block_size)?,
            decompressor,
            ready: VecDeque::new(),
            done: false,
            header,
        })
    }

    /// The stream header read at construction.
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Options recorded in the stream header.
    pub fn options(&self) -> CodecOptions {
        self.header.options()
    }

    /// Consumes the scanner, yielding the underlying source.
    pub fn into_inner(self) -> R {
        self.source.into_inner()
    }

    /// Returns the next event, or `None` after end-document.
    ///
    /// The first error ends the session; later calls return `None`.
    pub fn next_event(&mut self) -> Result<Option<Event>> {
        match self.advance() {
            Ok(event) => Ok(event),
            Err(err) => {
                self.done = true;
                self.ready.clear();
                Err(err)
            }
        }
    }

    fn advance(&mut self) -> Result<Option<Event>> {
        if let Some(event) = self.ready.pop_front() {
            return Ok(Some(event));
        }
        if self.done {
            return Ok(None);
        }
        if self.header.alignment.is_channelled() {
            self.scan_block()?;
            self.finish_if_ended();
            Ok(self.ready.pop_front())
        } else {
            let (event, _) = self.context.read_event(&mut self.source, true)?;
            self.finish_if_ended();
            Ok(Some(event))
        }
    }

    fn finish_if_ended(&mut self) {
        if self.context.cursor.is_finished() {
            self.done = true;
            debug!("scanner session finished");
        }
    }

    fn scan_block(&mut self) -> Result<()> {
        let Self {
            source,
            context,
            keeper,
            decompressor,
            ready,
            ..
        } = self;

        match decompressor {
            None => {
                scan_structure(context, source, keeper, ready)?;
                let plan = keeper.finish_block();
                fill_channels(context, source, plan.small.iter().chain(&plan.large), ready)?;
                log_block(plan.block, plan.total_values, plan.small.len(), plan.large.len());
            }
            Some(decompressor) => {
                let mut stream = inflate(&mut **decompressor, source.get_mut())?;
                scan_structure(context, &mut stream, keeper, ready)?;
                let plan = keeper.finish_block();
                if plan.is_single_stream() {
                    fill_channels(context, &mut stream, plan.small.iter().chain(&plan.large), ready)?;
                    ensure_consumed(&mut stream)?;
                } else {
                    ensure_consumed(&mut stream)?;
                    if !plan.small.is_empty() {
                        let mut stream = inflate(&mut **decompressor, source.get_mut())?;
                        fill_channels(context, &mut stream, &plan.small, ready)?;
                        ensure_consumed(&mut stream)?;
                    }
                    for batch in &plan.large {
                        let mut stream = inflate(&mut **decompressor, source.get_mut())?;
                        fill_channels(context, &mut stream, std::iter::once(batch), ready)?;
                        ensure_consumed(&mut stream)?;
                    }
                }
                log_block(plan.block, plan.total_values, plan.small.len(), plan.large.len());
            }
        }
        Ok(())
    }
}

impl<R: BufRead> Iterator for Scanner<R> {
    type Item = Result<Event>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_event().transpose()
    }
}

/// Reads the structure of one block: up to its last value, or end-document.
fn scan_structure<S: Read>(
    context: &mut ScanContext,
    reader: &mut BitReader<S>,
    keeper: &mut ChannelKeeper<ValueSlot>,
    ready: &mut VecDeque<Event>,
) -> Result<()> {
    loop {
        let (event, deferred) = context.read_event(reader, false)?;
        ready.push_back(event);
        if let Some((key, domain)) = deferred {
            let slot = ValueSlot {
                index: ready.len() - 1,
                domain,
            };
            if keeper.enqueue(key, slot) {
                return Ok(());
            }
        }
        if context.cursor.is_finished() {
            return Ok(());
        }
    }
}

fn fill_channels<'a, S, I>(
    context: &mut ScanContext,
    reader: &mut BitReader<S>,
    batches: I,
    ready: &mut VecDeque<Event>,
) -> Result<()>
where
    S: Read,
    I: IntoIterator<Item = &'a ChannelBatch<ValueSlot>>,
{
    for batch in batches {
        for slot in &batch.values {
            let value = scan_value(slot.domain, batch.key, &mut context.strings, reader)?;
            match ready.get_mut(slot.index) {
                Some(Event::Value { value: target, .. }) => *target = value,
                _ => return Err(Error::invalid("channel value without a value event")),
            }
        }
    }
    Ok(())
}

fn inflate<D: Decompressor + ?Sized>(
    decompressor: &mut D,
    source: &mut dyn BufRead,
) -> Result<BitReader<Cursor<Vec<u8>>>> {
    let mut buf = Vec::new();
    decompressor.decompress(source, &mut buf)?;
    Ok(BitReader::byte_aligned(Cursor::new(buf)))
}

fn ensure_consumed(stream: &mut BitReader<Cursor<Vec<u8>>>) -> Result<()> {
    let cursor = stream.get_mut();
    let left = cursor.get_ref().len() as u64 - cursor.position();
    if left > 0 {
        return Err(Error::invalid(format!(
            "{left} unread octets at the end of a compressed stream"
        )));
    }
    Ok(())
}

fn log_block(block: u64, values: usize, small: usize, large: usize) {
    debug!(block, values, small, large, "block read");
}

/// Decodes a complete stream held in memory.
pub fn decode_events(grammar: Arc<Grammar>, bytes: &[u8]) -> Result<Vec<Event>> {
    Scanner::builder(bytes, grammar).build()?.collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Alignment;
    use crate::writer::encode_events;

    fn schemaless() -> Arc<Grammar> {
        Arc::new(Grammar::schemaless().unwrap())
    }

    fn sample() -> Vec<Event> {
        vec![
            Event::StartDocument,
            Event::start("a"),
            Event::value("n", 42i64),
            Event::value("s", "text"),
            Event::EndContainer,
            Event::EndDocument,
        ]
    }

    #[test]
    fn inline_round_trip() {
        let grammar = schemaless();
        let bytes = encode_events(grammar.clone(), CodecOptions::default(), &sample()).unwrap();
        assert_eq!(decode_events(grammar, &bytes).unwrap(), sample());
    }

    #[test]
    fn pre_compression_round_trip_across_blocks() {
        let grammar = schemaless();
        let options = CodecOptions {
            block_size: 1,
            ..CodecOptions::with_alignment(Alignment::PreCompression)
        };
        let bytes = encode_events(grammar.clone(), options, &sample()).unwrap();
        assert_eq!(decode_events(grammar, &bytes).unwrap(), sample());
    }

    #[test]
    fn event_codes_beyond_the_state_are_rejected() {
        use crate::grammar::Production;

        let mut builder = Grammar::builder();
        let doc = builder.state("Document");
        let root = builder.state("Root");
        let content = builder.state("Content");
        let end = builder.state("End");
        builder.production(doc, Production::start_document(root));
        for name in ["a", "b", "c"] {
            builder.production(root, Production::start_container(NamePattern::exact(name), content, end));
        }
        builder.production(content, Production::end_container());
        builder.production(end, Production::end_document());
        let grammar = Arc::new(builder.build().unwrap());

        let events = [
            Event::StartDocument,
            Event::start("a"),
            Event::EndContainer,
            Event::EndDocument,
        ];
        let options = CodecOptions::with_alignment(Alignment::ByteAligned);
        let mut bytes = encode_events(grammar.clone(), options, &events).unwrap();
        // Two header octets, then the one-octet code of the container start.
        assert_eq!(bytes[2], 0);
        bytes[2] = 3;

        let mut scanner = Scanner::builder(bytes.as_slice(), grammar).build().unwrap();
        assert_eq!(scanner.next_event().unwrap(), Some(Event::StartDocument));
        let err = scanner.next_event().unwrap_err();
        assert!(matches!(err, Error::InvalidData(_)));
        assert!(err.to_string().contains("out of range"));
        assert!(scanner.next_event().unwrap().is_none());
    }

    #[test]
    fn truncated_stream_ends_the_session() {
        let grammar = schemaless();
        let bytes = encode_events(grammar.clone(), CodecOptions::default(), &sample()).unwrap();
        let mut scanner = Scanner::builder(&bytes[..bytes.len() - 2], grammar)
            .build()
            .unwrap();
        let result: Result<Vec<Event>> = scanner.by_ref().collect();
        assert!(result.is_err());
        assert!(scanner.next().is_none());
    }
}
