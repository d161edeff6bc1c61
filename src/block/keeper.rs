use std::collections::HashMap;

use tracing::trace;

use crate::error::{Error, Result};
use crate::options::DEFAULT_BLOCK_SIZE;
use crate::table::NameId;

/// Channels holding more values than this are written as streams of their own.
pub const SMALL_CHANNEL_LIMIT: usize = 100;

/// Index of a channel in its keeper's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelId(u32);

/// Values of one name queued in the current block.
#[derive(Debug, Clone)]
pub struct Channel<T> {
    key: NameId,
    first_position: usize,
    block: u64,
    value_count: usize,
    values: Vec<T>,
}

impl<T> Channel<T> {
    pub fn key(&self) -> NameId {
        self.key
    }

    /// Position of the channel's first value among all values of the block.
    pub fn first_position(&self) -> usize {
        self.first_position
    }

    pub fn value_count(&self) -> usize {
        self.value_count
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn is_large(&self) -> bool {
        self.value_count > SMALL_CHANNEL_LIMIT
    }
}

/// Channel drained at the end of a block.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelBatch<T> {
    pub key: NameId,
    pub values: Vec<T>,
}

/// Contents of a completed block, channels ordered by first appearance.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockPlan<T> {
    pub block: u64,
    pub total_values: usize,
    pub small: Vec<ChannelBatch<T>>,
    pub large: Vec<ChannelBatch<T>>,
}

impl<T> BlockPlan<T> {
    /// Returns `true` when structure and every channel share a single stream.
    pub fn is_single_stream(&self) -> bool {
        self.total_values <= SMALL_CHANNEL_LIMIT
    }
}

/// Groups deferred values by name and tracks block boundaries.
///
/// Channels live in an arena and are reused across blocks: a channel last touched
/// in an earlier block is reset in place the next time its name appears.
#[derive(Debug, Clone)]
pub struct ChannelKeeper<T> {
    channels: Vec<Channel<T>>,
    by_key: HashMap<NameId, ChannelId>,
    small: Vec<ChannelId>,
    large: Vec<ChannelId>,
    block: u64,
    total_values: usize,
    block_size: usize,
}

impl<T> Default for ChannelKeeper<T> {
    fn default() -> Self {
        Self {
            channels: Vec::new(),
            by_key: HashMap::new(),
            small: Vec::new(),
            large: Vec::new(),
            block: 0,
            total_values: 0,
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }
}

impl<T> ChannelKeeper<T> {
    pub fn new(block_size: usize) -> Result<Self> {
        let mut keeper = Self::default();
        keeper.set_block_size(block_size)?;
        Ok(keeper)
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Changes the block size; only permitted before the first value is queued.
    pub fn set_block_size(&mut self, block_size: usize) -> Result<()> {
        if block_size == 0 {
            return Err(Error::config("block size must be at least 1"));
        }
        if self.block > 0 || self.total_values > 0 {
            return Err(Error::config(
                "block size cannot change after values have been queued",
            ));
        }
        self.block_size = block_size;
        Ok(())
    }

    /// Number of the block currently being filled, starting at zero.
    pub fn block(&self) -> u64 {
        self.block
    }

    pub fn total_values(&self) -> usize {
        self.total_values
    }

    pub fn get(&self, id: ChannelId) -> &Channel<T> {
        &self.channels[id.0 as usize]
    }

    /// Channels of the current block that are still small, in creation order.
    pub fn small_channels(&self) -> impl Iterator<Item = &Channel<T>> {
        self.small.iter().map(|id| self.get(*id))
    }

    pub fn large_channels(&self) -> impl Iterator<Item = &Channel<T>> {
        self.large.iter().map(|id| self.get(*id))
    }

    /// Returns the channel for `key` in the current block, creating or resetting it.
    pub fn channel(&mut self, key: NameId) -> ChannelId {
        let block = self.block;
        let position = self.total_values;
        match self.by_key.get(&key).copied() {
            Some(id) => {
                let channel = &mut self.channels[id.0 as usize];
                if channel.block != block {
                    channel.block = block;
                    channel.first_position = position;
                    channel.value_count = 0;
                    channel.values.clear();
                    self.small.push(id);
                }
                id
            }
            None => {
                let id = ChannelId(self.channels.len() as u32);
                self.channels.push(Channel {
                    key,
                    first_position: position,
                    block,
                    value_count: 0,
                    values: Vec::new(),
                });
                self.by_key.insert(key, id);
                self.small.push(id);
                id
            }
        }
    }

    pub fn push(&mut self, id: ChannelId, value: T) {
        self.channels[id.0 as usize].values.push(value);
    }

    /// Counts one value for `id`; returns `true` when the block is now full.
    pub fn increment_value_count(&mut self, id: ChannelId) -> bool {
        let channel = &mut self.channels[id.0 as usize];
        channel.value_count += 1;
        if channel.value_count == SMALL_CHANNEL_LIMIT + 1 {
            trace!(key = channel.key.index(), block = self.block, "channel became large");
            self.small.retain(|small| *small != id);
            self.large.push(id);
        }
        self.total_values += 1;
        self.total_values == self.block_size
    }

    /// Queues `value` under `key`; returns `true` when the block is now full.
    pub fn enqueue(&mut self, key: NameId, value: T) -> bool {
        let id = self.channel(key);
        self.push(id, value);
        self.increment_value_count(id)
    }

    /// Closes the current block, draining its channels ordered by first position.
    pub fn finish_block(&mut self) -> BlockPlan<T> {
        let mut small = std::mem::take(&mut self.small);
        let mut large = std::mem::take(&mut self.large);
        small.sort_by_key(|id| self.channels[id.0 as usize].first_position);
        large.sort_by_key(|id| self.channels[id.0 as usize].first_position);

        let mut drain = |ids: Vec<ChannelId>| -> Vec<ChannelBatch<T>> {
            ids.into_iter()
                .map(|id| {
                    let channel = &mut self.channels[id.0 as usize];
                    ChannelBatch {
                        key: channel.key,
                        values: std::mem::take(&mut channel.values),
                    }
                })
                .collect()
        };
        let small = drain(small);
        let large = drain(large);

        let plan = BlockPlan {
            block: self.block,
            total_values: self.total_values,
            small,
            large,
        };
        self.block += 1;
        self.total_values = 0;
        plan
    }
}
