#![allow(missing_docs)]

use num_enum::{IntoPrimitive, TryFromPrimitive};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Physical layout of a stream body, recorded in the stream header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
#[repr(u8)]
pub enum Alignment {
    /// Primitives occupy their minimum bit width.
    #[default]
    BitPacked = 0,
    /// Every primitive is padded to an octet boundary.
    ByteAligned = 1,
    /// Byte-aligned, with values regrouped into channels but left uncompressed.
    PreCompression = 2,
    /// Byte-aligned channels, each block written as deflate streams.
    Compression = 3,
}

impl Alignment {
    /// Returns `true` when primitives are padded to octets.
    pub fn is_byte_aligned(self) -> bool {
        !matches!(self, Self::BitPacked)
    }

    /// Returns `true` when values are regrouped by channel.
    pub fn is_channelled(self) -> bool {
        matches!(self, Self::PreCompression | Self::Compression)
    }

    /// Returns `true` when block streams are deflated.
    pub fn is_compressed(self) -> bool {
        matches!(self, Self::Compression)
    }
}

/// The eight date/time primitive kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
#[repr(u8)]
pub enum DateTimeKind {
    DateTime = 0,
    Time = 1,
    Date = 2,
    GYearMonth = 3,
    GYear = 4,
    GMonthDay = 5,
    GDay = 6,
    GMonth = 7,
}

impl DateTimeKind {
    pub(crate) fn has_year(self) -> bool {
        matches!(
            self,
            Self::DateTime | Self::Date | Self::GYearMonth | Self::GYear
        )
    }

    pub(crate) fn has_month(self) -> bool {
        matches!(
            self,
            Self::DateTime | Self::Date | Self::GYearMonth | Self::GMonthDay | Self::GMonth
        )
    }

    pub(crate) fn has_day(self) -> bool {
        matches!(
            self,
            Self::DateTime | Self::Date | Self::GMonthDay | Self::GDay
        )
    }

    pub(crate) fn has_month_day(self) -> bool {
        self.has_month() || self.has_day()
    }

    pub(crate) fn has_time(self) -> bool {
        matches!(self, Self::DateTime | Self::Time)
    }

    /// Schema type name of the kind.
    pub fn type_name(self) -> &'static str {
        match self {
            Self::DateTime => "dateTime",
            Self::Time => "time",
            Self::Date => "date",
            Self::GYearMonth => "gYearMonth",
            Self::GYear => "gYear",
            Self::GMonthDay => "gMonthDay",
            Self::GDay => "gDay",
            Self::GMonth => "gMonth",
        }
    }
}

/// Item kind of an event or event type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum EventKind {
    StartDocument,
    EndDocument,
    StartContainer,
    EndContainer,
    Value,
}
