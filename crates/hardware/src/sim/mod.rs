//! Simulation harness.
//!
//! Everything needed to run the cache outside of a larger simulator:
//! 1. **Events:** The `Scheduler` interface and a deterministic event queue.
//! 2. **Requestors:** Scripted upstream peers that issue packets and collect responses.
//! 3. **Traces:** Text access traces parsed into per-port request streams.
//! 4. **System:** Cache, requestors, and backing memory wired together and driven tick by tick.

/// Scheduling interface and event queue.
pub mod event;
/// Scripted upstream traffic source.
pub mod requestor;
/// Top-level run loop.
pub mod system;
/// Trace file parsing.
pub mod trace;

pub use event::{EventQueue, Scheduler};
pub use requestor::Requestor;
pub use system::{SimEvent, System, SystemCache};
pub use trace::{TraceEntry, load_trace, parse_trace, write_pattern};
