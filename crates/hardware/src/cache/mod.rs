//! Single-level blocking cache.
//!
//! This module implements the cache model and everything it owns:
//! 1. **Block Store:** Flat block-address table with uniformly random eviction.
//! 2. **Ports:** CPU-side and memory-side ports with backpressure and retry.
//! 3. **Controller:** The one-outstanding-miss state machine and sub-block upgrade.
//! 4. **Statistics:** Hit/miss counters and the miss-latency histogram.

/// Blocking cache controller and its timed events.
pub mod controller;

/// Link traits and the CPU-side/memory-side ports.
pub mod port;

/// Seedable random source for eviction.
pub mod random;

/// Hit/miss counters and histograms.
pub mod stats;

/// Block-granular data store.
pub mod store;

pub use controller::{CacheEvent, SimpleCache};
pub use port::{CpuSidePort, Delivery, DownstreamLink, MemSidePort, UpstreamLink};
pub use random::{RandomSource, XorShift64};
pub use stats::{CacheStats, Histogram};
pub use store::{Block, BlockStore};
