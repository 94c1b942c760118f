//! Block store: the data array of the cache.
//!
//! A flat table from block address to block data. There is no set indexing; any block
//! may live anywhere, bounded only by the block count. Blocks live in a slab
//! (`Vec<Block>`) with a hash index beside it, so a uniformly random victim can be
//! chosen in O(1) by slab position.

use std::collections::HashMap;
use std::fmt;

use tracing::trace;

use super::random::RandomSource;
use crate::common::{Addr, CacheError};

/// One resident block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    /// Block-aligned address.
    pub addr: Addr,
    /// Exactly one block of bytes.
    pub data: Box<[u8]>,
}

/// Block-granular storage with random eviction.
pub struct BlockStore {
    block_size: usize,
    capacity: usize,
    blocks: Vec<Block>,
    index: HashMap<Addr, usize>,
    rng: Box<dyn RandomSource>,
}

impl BlockStore {
    /// Creates an empty store.
    ///
    /// # Arguments
    ///
    /// * `block_size` - Bytes per block (power of two).
    /// * `capacity` - Maximum number of resident blocks.
    /// * `rng` - Source used to choose eviction victims.
    pub fn new(block_size: usize, capacity: usize, rng: Box<dyn RandomSource>) -> Self {
        Self {
            block_size,
            capacity,
            blocks: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
            rng,
        }
    }

    /// Bytes per block.
    pub const fn block_size(&self) -> usize {
        self.block_size
    }

    /// Maximum number of resident blocks.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of resident blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Returns `true` if nothing is resident.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Returns `true` if the block at `addr` is resident.
    pub fn contains(&self, addr: Addr) -> bool {
        self.index.contains_key(&addr)
    }

    /// Returns the data of the block at `addr`, if resident.
    pub fn lookup(&self, addr: Addr) -> Option<&[u8]> {
        self.index.get(&addr).map(|&i| &*self.blocks[i].data)
    }

    /// Returns the data of the block at `addr` mutably, if resident.
    pub fn lookup_mut(&mut self, addr: Addr) -> Option<&mut [u8]> {
        let i = *self.index.get(&addr)?;
        Some(&mut *self.blocks[i].data)
    }

    /// Reads `len` bytes at `offset` within the block at `addr`.
    ///
    /// Returns `None` if the block is not resident or the span leaves it.
    pub fn read(&self, addr: Addr, offset: usize, len: usize) -> Option<&[u8]> {
        self.lookup(addr)?.get(offset..offset.checked_add(len)?)
    }

    /// Writes `bytes` at `offset` within the block at `addr`.
    ///
    /// Returns `false` if the block is not resident or the span leaves it.
    pub fn write(&mut self, addr: Addr, offset: usize, bytes: &[u8]) -> bool {
        let Some(end) = offset.checked_add(bytes.len()) else {
            return false;
        };
        match self.lookup_mut(addr).and_then(|block| block.get_mut(offset..end)) {
            Some(span) => {
                span.copy_from_slice(bytes);
                true
            }
            None => false,
        }
    }

    /// Iterates over resident block addresses in slab order.
    pub fn addresses(&self) -> impl Iterator<Item = Addr> + '_ {
        self.blocks.iter().map(|b| b.addr)
    }

    /// Installs a block, evicting a random resident block first when full.
    ///
    /// # Returns
    ///
    /// The evicted block, which the caller must write back.
    ///
    /// # Errors
    ///
    /// Returns `MisalignedInsert`, `DuplicateInsert`, or `PartialBlock` if the
    /// address is not block aligned, already resident, or the data is not
    /// exactly one block.
    pub fn insert(&mut self, addr: Addr, data: Vec<u8>) -> Result<Option<Block>, CacheError> {
        if !addr.is_block_aligned(self.block_size) {
            return Err(CacheError::MisalignedInsert {
                addr,
                block_size: self.block_size,
            });
        }
        if self.contains(addr) {
            return Err(CacheError::DuplicateInsert { addr });
        }
        if data.len() != self.block_size {
            return Err(CacheError::PartialBlock {
                addr,
                len: data.len(),
                block_size: self.block_size,
            });
        }

        let victim = if self.blocks.len() >= self.capacity {
            self.evict_random()
        } else {
            None
        };

        trace!(addr = %addr, "inserting block");
        let _ = self.index.insert(addr, self.blocks.len());
        self.blocks.push(Block {
            addr,
            data: data.into_boxed_slice(),
        });
        Ok(victim)
    }

    /// Removes the block at `addr`, if resident.
    pub fn remove(&mut self, addr: Addr) -> Option<Block> {
        let i = self.index.remove(&addr)?;
        Some(self.take_slot(i))
    }

    fn evict_random(&mut self) -> Option<Block> {
        if self.blocks.is_empty() {
            return None;
        }
        let i = self.rng.below(self.blocks.len());
        let victim = self.take_slot(i);
        let _ = self.index.remove(&victim.addr);
        trace!(addr = %victim.addr, "evicting block");
        Some(victim)
    }

    /// Swap-removes slab slot `i` and repoints the index at whichever block moved.
    fn take_slot(&mut self, i: usize) -> Block {
        let block = self.blocks.swap_remove(i);
        if let Some(moved) = self.blocks.get(i) {
            let _ = self.index.insert(moved.addr, i);
        }
        block
    }
}

impl fmt::Debug for BlockStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockStore")
            .field("block_size", &self.block_size)
            .field("capacity", &self.capacity)
            .field("resident", &self.blocks.len())
            .finish_non_exhaustive()
    }
}
