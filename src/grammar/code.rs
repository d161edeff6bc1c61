use std::io::Read;

use smallvec::SmallVec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::io::{BitReader, BitWriter};
use crate::util::bit_width;

/// Number of nested code tiers a state may use.
pub const MAX_TIERS: usize = 3;

/// One part of an event code: a position written in `width` bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodePart {
    /// Position of the event type within its group.
    pub position: u32,
    /// Bits the position occupies.
    pub width: u8,
}

/// Sequence of up to [`MAX_TIERS`] parts identifying an event type within its state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventCode {
    parts: SmallVec<[CodePart; MAX_TIERS]>,
}

impl EventCode {
    /// Parts from the first tier down.
    pub fn parts(&self) -> &[CodePart] {
        &self.parts
    }

    /// Total number of bits the code occupies in a bit-packed stream.
    pub fn bit_len(&self) -> u32 {
        self.parts.iter().map(|part| u32::from(part.width)).sum()
    }

    pub(crate) fn write(&self, writer: &mut BitWriter) -> Result<()> {
        for part in &self.parts {
            writer.write_nbit(part.position, part.width)?;
        }
        Ok(())
    }

    fn extended(&self, part: CodePart) -> Self {
        let mut parts = self.parts.clone();
        parts.push(part);
        Self { parts }
    }
}

/// How a state numbers its event types.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CodeLayout {
    /// Number members of each group from the end: the last member gets position 0.
    pub reversed: bool,
    /// Explicit width of each tier's group; `None` uses `ceil(log2(members))`.
    pub widths: [Option<u8>; MAX_TIERS],
}

impl CodeLayout {
    /// Layout numbering every group from the end.
    pub fn reversed() -> Self {
        Self {
            reversed: true,
            ..Self::default()
        }
    }

    /// Fixes the width of `tier`; out-of-range tiers are ignored.
    pub fn with_width(mut self, tier: usize, width: u8) -> Self {
        if let Some(slot) = self.widths.get_mut(tier) {
            *slot = Some(width);
        }
        self
    }
}

#[derive(Debug, Clone)]
enum CodeSlot {
    Event(usize),
    Nested(Box<CodeGroup>),
}

/// Decoding tree of one state: a group per tier, the next tier nested as the
/// group's last member.
#[derive(Debug, Clone)]
pub(crate) struct CodeGroup {
    width: u8,
    slots: Vec<CodeSlot>,
}

impl CodeGroup {
    /// Builds the group for `tiers[depth..]`, assigning the code of every event type
    /// into `codes` (indexed like the state's event type list).
    pub(crate) fn build(
        tiers: &[Vec<usize>],
        layout: &CodeLayout,
        depth: usize,
        prefix: &EventCode,
        codes: &mut [EventCode],
    ) -> Result<Self> {
        let members = &tiers[depth];
        let nested = tiers[depth + 1..].iter().any(|tier| !tier.is_empty());
        let count = members.len() + usize::from(nested);
        let width = match layout.widths[depth] {
            Some(width) if width > 32 || (width < 32 && count > 1usize << width) => {
                return Err(Error::grammar(format!(
                    "tier {depth} has {count} members, which do not fit into {width} bits"
                )));
            }
            Some(width) => width,
            None => bit_width(count),
        };
        let position_of = |idx: usize| {
            if layout.reversed { count - 1 - idx } else { idx }
        };

        let mut slots: Vec<Option<CodeSlot>> = (0..count).map(|_| None).collect();
        for (idx, &event_type) in members.iter().enumerate() {
            let position = position_of(idx);
            codes[event_type] = prefix.extended(CodePart {
                position: position as u32,
                width,
            });
            slots[position] = Some(CodeSlot::Event(event_type));
        }
        if nested {
            let position = position_of(members.len());
            let inner_prefix = prefix.extended(CodePart {
                position: position as u32,
                width,
            });
            let inner = Self::build(tiers, layout, depth + 1, &inner_prefix, codes)?;
            slots[position] = Some(CodeSlot::Nested(Box::new(inner)));
        }
        Ok(Self {
            width,
            slots: slots.into_iter().flatten().collect(),
        })
    }

    /// Reads a code and returns the index of the event type it denotes.
    pub(crate) fn read<R: Read>(&self, reader: &mut BitReader<R>) -> Result<usize> {
        let position = reader.read_nbit(self.width)? as usize;
        match self.slots.get(position) {
            Some(CodeSlot::Event(index)) => Ok(*index),
            Some(CodeSlot::Nested(inner)) => inner.read(reader),
            None => Err(Error::invalid(format!(
                "event code {position} out of range ({} members)",
                self.slots.len()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout_codes(tiers: &[Vec<usize>], layout: &CodeLayout, total: usize) -> Vec<EventCode> {
        let mut codes = vec![EventCode::default(); total];
        CodeGroup::build(tiers, layout, 0, &EventCode::default(), &mut codes).unwrap();
        codes
    }

    fn positions(code: &EventCode) -> Vec<(u32, u8)> {
        code.parts().iter().map(|p| (p.position, p.width)).collect()
    }

    #[test]
    fn nested_tier_takes_the_last_position() {
        let tiers = vec![vec![0, 1], vec![2], vec![]];
        let codes = layout_codes(&tiers, &CodeLayout::default(), 3);
        assert_eq!(positions(&codes[0]), [(0, 2)]);
        assert_eq!(positions(&codes[1]), [(1, 2)]);
        assert_eq!(positions(&codes[2]), [(2, 2), (0, 0)]);
    }

    #[test]
    fn reversed_numbering_counts_from_the_end() {
        let tiers = vec![vec![0, 1, 2], vec![], vec![]];
        let codes = layout_codes(&tiers, &CodeLayout::reversed(), 3);
        assert_eq!(positions(&codes[0]), [(2, 2)]);
        assert_eq!(positions(&codes[2]), [(0, 2)]);
    }

    #[test]
    fn explicit_width_must_fit() {
        let tiers = vec![vec![0, 1, 2], vec![], vec![]];
        let mut codes = vec![EventCode::default(); 3];
        let layout = CodeLayout::default().with_width(0, 1);
        assert!(CodeGroup::build(&tiers, &layout, 0, &EventCode::default(), &mut codes).is_err());

        let layout = CodeLayout::default().with_width(0, 4);
        let codes = layout_codes(&tiers, &layout, 3);
        assert_eq!(codes[1].bit_len(), 4);
    }

    #[test]
    fn decoding_walks_nested_groups() {
        let tiers = vec![vec![0], vec![1, 2], vec![3]];
        let layout = CodeLayout::default();
        let mut codes = vec![EventCode::default(); 4];
        let group = CodeGroup::build(&tiers, &layout, 0, &EventCode::default(), &mut codes).unwrap();

        let mut writer = BitWriter::bit_packed();
        for code in &codes {
            code.write(&mut writer).unwrap();
        }
        let bytes = writer.into_bytes();
        let mut reader = BitReader::bit_packed(bytes.as_slice());
        for expected in 0..4 {
            assert_eq!(group.read(&mut reader).unwrap(), expected);
        }
    }

    #[test]
    fn unused_positions_are_corrupt() {
        let tiers = vec![vec![0, 1, 2], vec![], vec![]];
        let mut codes = vec![EventCode::default(); 3];
        let group = CodeGroup::build(&tiers, &CodeLayout::default(), 0, &EventCode::default(), &mut codes).unwrap();
        let mut reader = BitReader::bit_packed(&[0b1100_0000u8][..]);
        assert!(matches!(group.read(&mut reader), Err(Error::InvalidData(_))));
    }
}
