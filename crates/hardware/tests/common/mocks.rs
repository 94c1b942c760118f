//! Mock peers and a manual scheduler.
//!
//! The recording peers are plain structs reached through the cache's port accessors,
//! so tests can inspect every packet and notification after the fact. `MockDownstream`
//! is a `mockall` mock for tests that pin down exact call sequences.

use mockall::mock;
use simcache_core::cache::{CacheEvent, Delivery, DownstreamLink, UpstreamLink};
use simcache_core::common::{AddrRange, Packet, Tick};
use simcache_core::sim::Scheduler;

/// Requestor that records everything the cache sends it.
#[derive(Debug, Default)]
pub struct RecordingRequestor {
    /// Responses accepted, in arrival order.
    pub responses: Vec<Packet>,
    /// Request retries received.
    pub retries: u32,
    /// Range changes received.
    pub range_changes: u32,
    /// Number of upcoming responses to refuse.
    pub refuse_responses: usize,
    /// Responses refused so far.
    pub refused: u32,
}

impl UpstreamLink for RecordingRequestor {
    fn recv_timing_resp(&mut self, pkt: Packet) -> Delivery {
        if self.refuse_responses > 0 {
            self.refuse_responses -= 1;
            self.refused += 1;
            return Delivery::Refused(pkt);
        }
        self.responses.push(pkt);
        Delivery::Accepted
    }

    fn recv_req_retry(&mut self) {
        self.retries += 1;
    }

    fn recv_range_change(&mut self) {
        self.range_changes += 1;
    }
}

/// Backing store that records requests and answers only when the test says so.
#[derive(Debug)]
pub struct ScriptedMemory {
    /// Timed requests accepted, in arrival order.
    pub requests: Vec<Packet>,
    /// Number of upcoming timed requests to refuse.
    pub refuse_requests: usize,
    /// Functional accesses seen.
    pub functional: Vec<Packet>,
    /// Byte returned for every functional read.
    pub fill: u8,
    /// Ranges advertised.
    pub ranges: Vec<AddrRange>,
}

impl Default for ScriptedMemory {
    fn default() -> Self {
        Self {
            requests: Vec::new(),
            refuse_requests: 0,
            functional: Vec::new(),
            fill: 0xEE,
            ranges: vec![AddrRange::with_size(0, 0x10_0000)],
        }
    }
}

impl ScriptedMemory {
    /// Turns the most recent non-writeback request into its response, filling
    /// read data from `data`.
    pub fn respond(&mut self, data: &[u8]) -> Packet {
        let i = self
            .requests
            .iter()
            .rposition(Packet::needs_response)
            .expect("no request waiting for a response");
        let mut pkt = self.requests.remove(i);
        if pkt.is_read() {
            pkt.data_mut().copy_from_slice(data);
        }
        pkt.make_response().unwrap();
        pkt
    }
}

impl DownstreamLink for ScriptedMemory {
    fn recv_timing_req(&mut self, pkt: Packet) -> Delivery {
        if self.refuse_requests > 0 {
            self.refuse_requests -= 1;
            return Delivery::Refused(pkt);
        }
        self.requests.push(pkt);
        Delivery::Accepted
    }

    fn recv_functional(&mut self, pkt: &mut Packet) {
        if pkt.is_read() {
            pkt.data_mut().fill(self.fill);
        }
        self.functional.push(pkt.clone());
        pkt.make_response().unwrap();
    }

    fn address_ranges(&self) -> Vec<AddrRange> {
        self.ranges.clone()
    }
}

mock! {
    pub Downstream {}
    impl DownstreamLink for Downstream {
        fn recv_timing_req(&mut self, pkt: Packet) -> Delivery;
        fn recv_functional(&mut self, pkt: &mut Packet);
        fn address_ranges(&self) -> Vec<AddrRange>;
    }
}

mock! {
    pub Upstream {}
    impl UpstreamLink for Upstream {
        fn recv_timing_resp(&mut self, pkt: Packet) -> Delivery;
        fn recv_req_retry(&mut self);
        fn recv_range_change(&mut self);
    }
}

/// Scheduler whose clock only moves when the test moves it.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    /// Current tick.
    pub now: Tick,
    /// Scheduled events with their due ticks, in scheduling order.
    pub events: Vec<(Tick, CacheEvent)>,
}

impl ManualScheduler {
    /// Removes the earliest event (first scheduled on ties) and moves the clock to it.
    pub fn pop(&mut self) -> Option<CacheEvent> {
        let (i, _) = self
            .events
            .iter()
            .enumerate()
            .min_by_key(|(i, (when, _))| (*when, *i))?;
        let (when, event) = self.events.remove(i);
        self.now = self.now.max(when);
        Some(event)
    }
}

impl Scheduler for ManualScheduler {
    fn now(&self) -> Tick {
        self.now
    }

    fn schedule_after(&mut self, delay: Tick, event: CacheEvent) {
        self.events.push((self.now + delay, event));
    }
}
