//! Simulated components around the cache.
//!
//! The cache itself only defines the link traits; this module supplies the
//! downstream side used by the harness and the CLI.

/// Fixed-latency backing memory.
pub mod memory;

pub use memory::BackingMemory;
