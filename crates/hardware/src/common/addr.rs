//! Physical address and address-range types.
//!
//! This module defines the address vocabulary shared by the cache, its ports, and the
//! backing memory. It provides the following:
//! 1. **Type Safety:** A strong `Addr` type so byte counts and addresses are not mixed.
//! 2. **Block Arithmetic:** Alignment and in-block offset helpers for power-of-two blocks.
//! 3. **Ranges:** Half-open `AddrRange` values advertised across links.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A physical address in the simulated memory system.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Addr(pub u64);

impl Addr {
    /// Creates a new address from a raw 64-bit value.
    #[inline(always)]
    pub const fn new(addr: u64) -> Self {
        Self(addr)
    }

    /// Returns the raw 64-bit address value.
    #[inline(always)]
    pub const fn val(self) -> u64 {
        self.0
    }

    /// Rounds the address down to the start of its enclosing block.
    ///
    /// # Arguments
    ///
    /// * `block_size` - Block size in bytes; must be a power of two.
    #[inline(always)]
    pub const fn block_align(self, block_size: usize) -> Self {
        Self(self.0 & !(block_size as u64 - 1))
    }

    /// Returns the byte offset of this address within its enclosing block.
    #[inline(always)]
    pub const fn block_offset(self, block_size: usize) -> usize {
        (self.0 & (block_size as u64 - 1)) as usize
    }

    /// Returns `true` if the address is the first byte of a block.
    #[inline(always)]
    pub const fn is_block_aligned(self, block_size: usize) -> bool {
        self.block_offset(block_size) == 0
    }

    /// Returns the address `bytes` past this one.
    #[inline(always)]
    pub const fn offset(self, bytes: u64) -> Self {
        Self(self.0.wrapping_add(bytes))
    }
}

impl fmt::Display for Addr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl fmt::LowerHex for Addr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

impl From<u64> for Addr {
    fn from(addr: u64) -> Self {
        Self(addr)
    }
}

/// Half-open physical address range `[start, end)`.
///
/// Ranges are what a downstream component advertises as "served here"; the cache
/// passes them through to its requestors unchanged.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AddrRange {
    /// First address in the range.
    pub start: Addr,
    /// One past the last address in the range.
    pub end: Addr,
}

impl AddrRange {
    /// Creates a range from a base address and a size in bytes.
    pub const fn with_size(base: u64, size: u64) -> Self {
        Self {
            start: Addr(base),
            end: Addr(base.saturating_add(size)),
        }
    }

    /// Returns the number of bytes covered by the range.
    pub const fn size(&self) -> u64 {
        self.end.0.saturating_sub(self.start.0)
    }

    /// Returns `true` if `addr` lies inside the range.
    pub const fn contains(&self, addr: Addr) -> bool {
        addr.0 >= self.start.0 && addr.0 < self.end.0
    }

    /// Returns `true` if all of `[addr, addr + len)` lies inside the range.
    pub const fn contains_span(&self, addr: Addr, len: usize) -> bool {
        match addr.0.checked_add(len as u64) {
            Some(last) => addr.0 >= self.start.0 && last <= self.end.0,
            None => false,
        }
    }
}

impl fmt::Display for AddrRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}:{})", self.start, self.end)
    }
}
