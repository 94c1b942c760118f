//! Backing memory behind the cache.
//!
//! This module implements the downstream store the cache's memory-side port talks to.
//! It provides:
//! 1. **Storage:** A byte array mapped over one address range.
//! 2. **Timing:** A fixed latency from accepting a request to its response being ready.
//! 3. **Backpressure:** A bounded response queue; a full queue refuses requests and owes
//!    the sender a retry once a slot frees.
//!
//! Write-backs need no response, so they are applied on arrival and never refused.

use std::collections::VecDeque;

use tracing::{trace, warn};

use crate::cache::{Delivery, DownstreamLink};
use crate::common::{Addr, AddrRange, MemCmd, Packet, Tick};
use crate::config::MemoryConfig;

/// Fixed-latency memory with a bounded request queue.
#[derive(Debug)]
pub struct BackingMemory {
    range: AddrRange,
    data: Vec<u8>,
    latency: Tick,
    queue_depth: usize,
    now: Tick,
    in_flight: VecDeque<(Tick, Packet)>,
    retry_owed: bool,
    /// Timed read requests serviced.
    pub reads: u64,
    /// Timed write requests serviced.
    pub writes: u64,
    /// Write-backs absorbed.
    pub writebacks: u64,
}

impl BackingMemory {
    /// Creates a zero-filled memory from its configuration.
    pub fn new(config: &MemoryConfig) -> Self {
        Self {
            range: AddrRange::with_size(config.base, config.size_bytes as u64),
            data: vec![0; config.size_bytes],
            latency: config.latency,
            queue_depth: config.queue_depth.max(1),
            now: 0,
            in_flight: VecDeque::with_capacity(config.queue_depth),
            retry_owed: false,
            reads: 0,
            writes: 0,
            writebacks: 0,
        }
    }

    /// Address range served.
    pub const fn range(&self) -> AddrRange {
        self.range
    }

    /// Moves the memory's notion of time forward.
    pub fn advance_to(&mut self, now: Tick) {
        self.now = self.now.max(now);
    }

    /// Tick at which the oldest in-flight response becomes ready.
    pub fn next_ready_tick(&self) -> Option<Tick> {
        self.in_flight.front().map(|(ready, _)| *ready)
    }

    /// Number of requests waiting for their response to be delivered.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Pops the oldest response if it is ready at the current tick.
    pub fn pop_ready(&mut self) -> Option<Packet> {
        if self.next_ready_tick()? > self.now {
            return None;
        }
        self.in_flight.pop_front().map(|(_, pkt)| pkt)
    }

    /// Returns `true`, once, when a refused sender may now retry.
    pub fn take_retry_owed(&mut self) -> bool {
        if self.retry_owed && self.in_flight.len() < self.queue_depth {
            self.retry_owed = false;
            return true;
        }
        false
    }

    /// Writes `bytes` at `addr` directly, bypassing timing.
    ///
    /// Returns `false` if the span is not served by this memory.
    pub fn load(&mut self, addr: Addr, bytes: &[u8]) -> bool {
        match self.offset_of(addr, bytes.len()) {
            Some(off) => {
                self.data[off..off + bytes.len()].copy_from_slice(bytes);
                true
            }
            None => false,
        }
    }

    /// Reads `len` bytes at `addr` directly, bypassing timing.
    pub fn peek(&self, addr: Addr, len: usize) -> Option<&[u8]> {
        self.offset_of(addr, len).map(|off| &self.data[off..off + len])
    }

    fn offset_of(&self, addr: Addr, len: usize) -> Option<usize> {
        self.range
            .contains_span(addr, len)
            .then(|| (addr.val() - self.range.start.val()) as usize)
    }

    /// Reads or writes the packet's bytes against the array.
    fn service(&mut self, pkt: &mut Packet) {
        let Some(off) = self.offset_of(pkt.addr(), pkt.size()) else {
            warn!(%pkt, range = %self.range, "access outside backing memory");
            return;
        };
        if pkt.is_write() {
            self.data[off..off + pkt.size()].copy_from_slice(pkt.data());
        } else if pkt.is_read() {
            let size = pkt.size();
            pkt.data_mut().copy_from_slice(&self.data[off..off + size]);
        }
    }
}

impl DownstreamLink for BackingMemory {
    fn recv_timing_req(&mut self, mut pkt: Packet) -> Delivery {
        if pkt.cmd() == MemCmd::WritebackDirty {
            trace!(%pkt, "absorbing writeback");
            self.service(&mut pkt);
            self.writebacks += 1;
            return Delivery::Accepted;
        }

        if self.in_flight.len() >= self.queue_depth {
            trace!(%pkt, "queue full, refusing");
            self.retry_owed = true;
            return Delivery::Refused(pkt);
        }

        self.service(&mut pkt);
        if pkt.is_write() {
            self.writes += 1;
        } else {
            self.reads += 1;
        }
        if pkt.make_response().is_err() {
            warn!(%pkt, "dropping request with no response form");
            return Delivery::Accepted;
        }
        self.in_flight
            .push_back((self.now.saturating_add(self.latency), pkt));
        Delivery::Accepted
    }

    fn recv_functional(&mut self, pkt: &mut Packet) {
        self.service(pkt);
        if pkt.needs_response() {
            let _ = pkt.make_response();
        }
    }

    fn address_ranges(&self) -> Vec<AddrRange> {
        vec![self.range]
    }
}
