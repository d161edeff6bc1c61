#![allow(missing_docs)]

//! Incremental encoder turning an event stream into octets.

use std::io::Write;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::block::{BlockPlan, ChannelBatch, ChannelKeeper, Header};
use crate::compression::{Compressor, compressor_for};
use crate::encoding::scribe_value;
use crate::error::{Error, Result};
use crate::grammar::{Grammar, GrammarCursor, NamePattern};
use crate::io::BitWriter;
use crate::options::{CodecOptions, validate_options};
use crate::table::{NameTable, StringTable};
use crate::types::{Alignment, Event, EventKind, Value, ValueDomain};

/// Builder for [`Scriber`].
pub struct ScriberBuilder<W: Write> {
    sink: W,
    grammar: Arc<Grammar>,
    options: CodecOptions,
}

impl<W: Write> ScriberBuilder<W> {
    pub fn new(sink: W, grammar: Arc<Grammar>) -> Self {
        Self {
            sink,
            grammar,
            options: CodecOptions::default(),
        }
    }

    /// Overrides the options wholesale.
    pub fn options(mut self, options: CodecOptions) -> Self {
        self.options = options;
        self
    }

    pub fn alignment(mut self, alignment: Alignment) -> Self {
        self.options.alignment = alignment;
        self
    }

    /// Values per block in the channelled alignments.
    pub fn block_size(mut self, block_size: usize) -> Self {
        self.options.block_size = block_size;
        self
    }

    pub fn value_max_length(mut self, max_length: Option<usize>) -> Self {
        self.options.value_max_length = max_length;
        self
    }

    pub fn value_partition_capacity(mut self, capacity: Option<usize>) -> Self {
        self.options.value_partition_capacity = capacity;
        self
    }

    pub fn compression_level(mut self, level: Option<u32>) -> Self {
        self.options.compression_level = level;
        self
    }

    pub fn include_cookie(mut self, include: bool) -> Self {
        self.options.include_cookie = include;
        self
    }

    /// Validates the options and constructs the scriber.
    pub fn build(self) -> Result<Scriber<W>> {
        Scriber::with_options(self.sink, self.grammar, self.options)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Initial,
    Started,
    Ended,
    Failed,
}

/// A value held back until its block is written.
#[derive(Debug, Clone)]
struct PendingValue {
    domain: ValueDomain,
    value: Value,
}

/// Encoder session.
///
/// Structure (event codes and wildcard names) is always written in document
/// order. In the inline alignments values follow their event immediately; in the
/// channelled alignments they are queued per name and written when a block closes.
pub struct Scriber<W: Write> {
    sink: W,
    options: CodecOptions,
    cursor: GrammarCursor,
    names: NameTable,
    strings: StringTable,
    structure: BitWriter,
    keeper: ChannelKeeper<PendingValue>,
    compressor: Box<dyn Compressor + Send>,
    phase: Phase,
    bytes_written: u64,
}

impl<W: Write> Scriber<W> {
    pub fn builder(sink: W, grammar: Arc<Grammar>) -> ScriberBuilder<W> {
        ScriberBuilder::new(sink, grammar)
    }

    fn with_options(sink: W, grammar: Arc<Grammar>, options: CodecOptions) -> Result<Self> {
        validate_options(&options)?;
        let alignment = options.alignment;
        let mut names = NameTable::new();
        grammar.preload(&mut names);
        let compressor = compressor_for(alignment.is_compressed(), options.compression_level)?;
        Ok(Self {
            sink,
            cursor: GrammarCursor::new(grammar),
            names,
            strings: StringTable::new(options.value_max_length, options.value_partition_capacity),
            structure: BitWriter::new(alignment.is_byte_aligned()),
            keeper: ChannelKeeper::new(options.block_size)?,
            compressor,
            phase: Phase::Initial,
            bytes_written: 0,
            options,
        })
    }

    pub fn options(&self) -> &CodecOptions {
        &self.options
    }

    /// Octets handed to the sink so far.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Number of the block currently being filled (channelled alignments).
    pub fn current_block(&self) -> u64 {
        self.keeper.block()
    }

    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Ended
    }

    /// Encodes one event.
    ///
    /// An error leaves the session failed: later events are refused and the
    /// output written so far is not a valid stream.
    pub fn scribe(&mut self, event: &Event) -> Result<()> {
        let result = self.scribe_event(event);
        if result.is_err() && self.phase != Phase::Ended {
            self.phase = Phase::Failed;
        }
        result
    }

    fn scribe_event(&mut self, event: &Event) -> Result<()> {
        match self.phase {
            Phase::Failed => {
                return Err(Error::session(format!("{event} after a failed event")));
            }
            Phase::Ended => {
                return Err(Error::session(format!(
                    "{event} after the document has ended"
                )));
            }
            Phase::Initial => {
                if !matches!(event, Event::StartDocument) {
                    return Err(Error::session(format!(
                        "stream must begin with start-document, got {event}"
                    )));
                }
                let header = Header::from_options(&self.options);
                self.bytes_written += header.write(&mut self.sink)? as u64;
                debug!(
                    alignment = ?self.options.alignment,
                    block_size = self.options.block_size,
                    "scriber session started"
                );
                self.phase = Phase::Started;
            }
            Phase::Started => {}
        }

        let grammar = Arc::clone(self.cursor.grammar());
        let state = grammar.state(self.cursor.state_id()?);
        let matched = state.match_event(event)?;
        let event_type = &state.event_types()[matched.index];
        trace!(state = state.label(), index = matched.index, %event, "matched event type");

        event_type.code().write(&mut self.structure)?;
        let id = match event_type.pattern() {
            NamePattern::Exact(name) => Some(self.names.lookup(name).ok_or_else(|| {
                Error::grammar(format!("name `{name}` missing from the name table"))
            })?),
            pattern @ (NamePattern::Namespace(_) | NamePattern::Any) => {
                let name = event
                    .name()
                    .ok_or_else(|| Error::grammar(format!("wildcard matched unnamed {event}")))?;
                let fixed = matches!(pattern, NamePattern::Namespace(_));
                Some(self.names.scribe(&mut self.structure, name, fixed)?)
            }
            NamePattern::Anonymous => None,
        };

        let mut block_full = false;
        if event_type.kind() == EventKind::Value {
            let key = id.unwrap_or_else(|| self.cursor.container());
            let domain = event_type
                .domain()
                .ok_or_else(|| Error::grammar("value event type without a domain"))?;
            let value = matched
                .value
                .ok_or_else(|| Error::grammar("value event matched without a value"))?;
            if self.options.alignment.is_channelled() {
                block_full = self.keeper.enqueue(key, PendingValue { domain, value });
            } else {
                scribe_value(domain, &value, key, &mut self.strings, &mut self.structure)?;
            }
        }

        self.cursor.advance(event_type.target(), id)?;

        if self.options.alignment.is_channelled() {
            if block_full {
                self.flush_block()?;
            }
            if self.cursor.is_finished() {
                self.flush_block()?;
            }
        } else {
            if self.cursor.is_finished() {
                self.structure.align();
            }
            self.bytes_written += self.structure.drain_to(&mut self.sink)? as u64;
        }

        if self.cursor.is_finished() {
            self.sink.flush()?;
            self.phase = Phase::Ended;
            debug!(bytes = self.bytes_written, "scriber session finished");
        }
        Ok(())
    }

    /// Encodes every event of `events` in order.
    pub fn scribe_all<'a, I>(&mut self, events: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a Event>,
    {
        for event in events {
            self.scribe(event)?;
        }
        Ok(())
    }

    /// Ends the session and returns the sink. The document must have ended.
    pub fn finish(self) -> Result<W> {
        if self.phase != Phase::Ended {
            return Err(Error::session("finish called before end-document"));
        }
        Ok(self.sink)
    }

    /// Writes the current block: its structure stream and its value channels.
    fn flush_block(&mut self) -> Result<()> {
        let plan = self.keeper.finish_block();
        let structure = self.structure.take_bytes();
        let mut streams = Vec::with_capacity(2 + plan.large.len());
        if plan.is_single_stream() {
            let mut stream = structure;
            let mut values = BitWriter::byte_aligned();
            self.scribe_channels(plan.small.iter().chain(&plan.large), &mut values)?;
            stream.extend_from_slice(&values.into_bytes());
            streams.push(stream);
        } else {
            streams.push(structure);
            if !plan.small.is_empty() {
                let mut values = BitWriter::byte_aligned();
                self.scribe_channels(&plan.small, &mut values)?;
                streams.push(values.into_bytes());
            }
            for batch in &plan.large {
                let mut values = BitWriter::byte_aligned();
                self.scribe_channels(std::iter::once(batch), &mut values)?;
                streams.push(values.into_bytes());
            }
        }

        let mut out = Vec::new();
        for stream in &streams {
            self.compressor.compress(stream, &mut out)?;
        }
        self.sink.write_all(&out)?;
        self.bytes_written += out.len() as u64;
        log_block(&plan, streams.len(), out.len());
        Ok(())
    }

    fn scribe_channels<'a, I>(&mut self, batches: I, values: &mut BitWriter) -> Result<()>
    where
        I: IntoIterator<Item = &'a ChannelBatch<PendingValue>>,
    {
        for batch in batches {
            for pending in &batch.values {
                scribe_value(
                    pending.domain,
                    &pending.value,
                    batch.key,
                    &mut self.strings,
                    values,
                )?;
            }
        }
        Ok(())
    }
}

fn log_block<T>(plan: &BlockPlan<T>, streams: usize, octets: usize) {
    debug!(
        block = plan.block,
        values = plan.total_values,
        small = plan.small.len(),
        large = plan.large.len(),
        streams,
        octets,
        "block written"
    );
}

/// Encodes a complete event sequence into a new buffer.
pub fn encode_events(
    grammar: Arc<Grammar>,
    options: CodecOptions,
    events: &[Event],
) -> Result<Vec<u8>> {
    let mut scriber = ScriberBuilder::new(Vec::new(), grammar)
        .options(options)
        .build()?;
    scriber.scribe_all(events)?;
    scriber.finish()
}
