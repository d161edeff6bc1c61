#![allow(missing_docs)]

//! Stream framing: the header and the per-block channel bookkeeping used by the
//! compressed alignments.

mod header;
mod keeper;

pub use header::{COOKIE, Header};
pub use keeper::{BlockPlan, Channel, ChannelBatch, ChannelId, ChannelKeeper, SMALL_CHANNEL_LIMIT};
