//! System: owns the cache, its requestors, its memory, and the event queue.
//!
//! Components never hold references to each other. The cache owns its peers through
//! its ports, and the system reaches them through the cache's accessors, so every
//! interaction is a method call made from the run loop below.

use tracing::debug;

use super::event::EventQueue;
use super::requestor::Requestor;
use super::trace::TraceEntry;
use crate::cache::{CacheEvent, Delivery, SimpleCache};
use crate::common::{Addr, AddrRange, CacheError, Packet, Tick};
use crate::config::Config;
use crate::soc::BackingMemory;

/// Events the system schedules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimEvent {
    /// A cache-internal timed event.
    Cache(CacheEvent),
    /// The requestor on this port can take a response again.
    RespRetry(usize),
}

impl From<CacheEvent> for SimEvent {
    fn from(event: CacheEvent) -> Self {
        Self::Cache(event)
    }
}

/// Concrete cache type the system drives.
pub type SystemCache = SimpleCache<Requestor, BackingMemory>;

/// Top-level simulated system.
#[derive(Debug)]
pub struct System {
    cache: SystemCache,
    queue: EventQueue<SimEvent>,
}

impl System {
    /// Builds a system with one idle requestor per CPU-side port.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::InvalidConfig` if the configuration is unusable.
    pub fn new(config: &Config) -> Result<Self, CacheError> {
        config.validate()?;
        let requestors = (0..config.cache.cpu_ports)
            .map(|i| Requestor::new(format!("cpu{i}")))
            .collect();
        let memory = BackingMemory::new(&config.memory);
        let cache = SimpleCache::new("cache", &config.cache, requestors, memory)?;
        Ok(Self {
            cache,
            queue: EventQueue::new(),
        })
    }

    /// Current simulated time.
    pub const fn now(&self) -> Tick {
        self.queue.now()
    }

    /// The cache.
    pub const fn cache(&self) -> &SystemCache {
        &self.cache
    }

    /// The cache, mutably.
    pub fn cache_mut(&mut self) -> &mut SystemCache {
        &mut self.cache
    }

    /// Requestor on port `port`.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::InvalidPort` for an out-of-range index.
    pub fn requestor(&self, port: usize) -> Result<&Requestor, CacheError> {
        Ok(self.cache.cpu_port(port)?.link())
    }

    /// Requestor on port `port`, mutably.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::InvalidPort` for an out-of-range index.
    pub fn requestor_mut(&mut self, port: usize) -> Result<&mut Requestor, CacheError> {
        Ok(self.cache.cpu_port_mut(port)?.link_mut())
    }

    /// The backing memory.
    pub const fn memory(&self) -> &BackingMemory {
        self.cache.mem_port().link()
    }

    /// The backing memory, mutably.
    pub fn memory_mut(&mut self) -> &mut BackingMemory {
        self.cache.mem_port_mut().link_mut()
    }

    /// Queues `pkt` on the requestor attached to `port`.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::InvalidPort` for an out-of-range index.
    pub fn enqueue(&mut self, port: usize, pkt: Packet) -> Result<(), CacheError> {
        self.requestor_mut(port)?.push(pkt);
        Ok(())
    }

    /// Queues every trace entry on its port, in file order.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::InvalidPort` if an entry names a missing port.
    pub fn load_trace(&mut self, entries: Vec<TraceEntry>) -> Result<(), CacheError> {
        for entry in entries {
            self.enqueue(entry.port, entry.packet)?;
        }
        Ok(())
    }

    /// Reads `len` bytes through `port` without timing.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPort` or `SpansMultipleBlocks`.
    pub fn functional_read(
        &mut self,
        port: usize,
        addr: Addr,
        len: usize,
    ) -> Result<Vec<u8>, CacheError> {
        let mut pkt = Packet::read(0, addr, len);
        self.cache.recv_functional(port, &mut pkt)?;
        Ok(pkt.into_data())
    }

    /// Writes `data` through `port` without timing.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPort` or `SpansMultipleBlocks`.
    pub fn functional_write(
        &mut self,
        port: usize,
        addr: Addr,
        data: Vec<u8>,
    ) -> Result<(), CacheError> {
        let mut pkt = Packet::write(0, addr, data);
        self.cache.recv_functional(port, &mut pkt)
    }

    /// Address ranges the requestors see.
    pub fn address_ranges(&self) -> Vec<AddrRange> {
        self.cache.address_ranges()
    }

    /// Signals that the memory's ranges changed.
    pub fn notify_range_change(&mut self) {
        self.cache.recv_range_change();
    }

    /// Returns `true` once every queued request has been answered.
    pub fn is_quiescent(&self) -> bool {
        !self.cache.is_blocked()
            && self.queue.is_empty()
            && self.memory().in_flight() == 0
            && (0..self.cache.num_cpu_ports()).all(|port| {
                self.cache
                    .cpu_port(port)
                    .is_ok_and(|p| p.link().queued() == 0 && p.blocked_packet().is_none())
            })
    }

    /// Runs until nothing is left to do or the next activity lies past `max_tick`.
    ///
    /// # Returns
    ///
    /// The tick at which the run stopped.
    ///
    /// # Errors
    ///
    /// Propagates the first fatal error; the system must not be run further.
    pub fn run(&mut self, max_tick: Option<Tick>) -> Result<Tick, CacheError> {
        loop {
            self.issue_requests()?;
            let Some(next) = self.next_tick() else {
                break;
            };
            if max_tick.is_some_and(|limit| next > limit) {
                break;
            }
            self.advance(next)?;
        }
        debug!(tick = self.now(), "run finished");
        Ok(self.now())
    }

    /// Processes everything due at the next active tick.
    ///
    /// Returns `false` if nothing was left to process.
    ///
    /// # Errors
    ///
    /// Propagates the first fatal error.
    pub fn step(&mut self) -> Result<bool, CacheError> {
        self.issue_requests()?;
        match self.next_tick() {
            Some(next) => {
                self.advance(next)?;
                self.issue_requests()?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn next_tick(&self) -> Option<Tick> {
        match (self.queue.peek_tick(), self.memory().next_ready_tick()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Moves to `tick`, then runs due events before due memory responses.
    fn advance(&mut self, tick: Tick) -> Result<(), CacheError> {
        self.queue.advance_to(tick);
        self.memory_mut().advance_to(tick);

        while let Some(event) = self.queue.pop_due() {
            match event {
                SimEvent::Cache(event) => self.cache.process_event(event, &mut self.queue)?,
                SimEvent::RespRetry(port) => self.cache.recv_resp_retry(port)?,
            }
        }

        while let Some(pkt) = self.memory_mut().pop_ready() {
            self.cache.recv_timing_resp(pkt, &mut self.queue)?;
            if self.memory_mut().take_retry_owed() {
                self.cache.recv_req_retry()?;
            }
        }
        Ok(())
    }

    /// Lets each requestor, in port order, issue until refused or empty.
    fn issue_requests(&mut self) -> Result<(), CacheError> {
        for port in 0..self.cache.num_cpu_ports() {
            while let Some(pkt) = self.requestor_mut(port)?.next_request() {
                if let Delivery::Refused(pkt) =
                    self.cache.recv_timing_req(port, pkt, &mut self.queue)?
                {
                    self.requestor_mut(port)?.request_refused(pkt);
                    break;
                }
            }
            if self.requestor_mut(port)?.take_resp_retry() {
                self.queue.schedule_in(1, SimEvent::RespRetry(port));
            }
        }
        Ok(())
    }
}
