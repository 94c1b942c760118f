//! Single-level blocking cache simulator library.
//!
//! This crate models a small cache sitting between several requestors and one backing
//! memory, with the following:
//! 1. **Cache:** Block store with random eviction, a one-outstanding-miss controller,
//!    sub-block upgrade, and hit/miss statistics.
//! 2. **Ports:** CPU-side and memory-side ports with backpressure and retry.
//! 3. **Memory:** A fixed-latency backing store with a bounded request queue.
//! 4. **Simulation:** Event queue, scripted requestors, trace loading, and configuration.

/// Common types (addresses, packets, errors).
pub mod common;
/// Cache and memory configuration (defaults, validation, JSON loading).
pub mod config;
/// Cache model (controller, ports, block store, statistics).
pub mod cache;
/// Event queue, requestors, traces, and the system run loop.
pub mod sim;
/// Backing memory.
pub mod soc;

/// Root configuration type; use `Config::default()` or load it from JSON.
pub use crate::config::Config;
/// The cache controller, generic over its upstream and downstream peers.
pub use crate::cache::SimpleCache;
/// Top-level system (cache, requestors, memory); construct with `System::new`.
pub use crate::sim::System;
