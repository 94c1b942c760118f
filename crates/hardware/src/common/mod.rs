//! Common types shared by every component of the cache model.
//!
//! This module provides the vocabulary the cache, its links, and the simulated
//! environment agree on. It includes:
//! 1. **Address Types:** Strong physical addresses and half-open address ranges.
//! 2. **Packets:** Memory commands and the packets that carry them across links.
//! 3. **Error Handling:** The fatal error taxonomy of the simulation.

/// Address and address-range definitions.
pub mod addr;

/// Error types for fatal simulation conditions.
pub mod error;

/// Memory commands and packets.
pub mod packet;

pub use addr::{Addr, AddrRange};
pub use error::CacheError;
pub use packet::{MemCmd, Packet};

/// Simulated time in ticks.
pub type Tick = u64;
