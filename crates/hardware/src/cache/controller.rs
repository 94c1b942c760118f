//! Blocking cache controller.
//!
//! The controller owns the block store and every port, and runs a two-state machine:
//! 1. **Idle:** no pending request. The next request from any port is accepted and a
//!    timed access is scheduled `latency` cycles out.
//! 2. **Blocked:** exactly one pending request. Every other request is refused and
//!    its port records a retry obligation.
//!
//! At the timed access a hit is serviced in place and answered at once. A miss goes
//! downstream, upgraded to a whole-block read when the request is smaller than a
//! block, and the controller stays blocked until the reply is consumed. Leaving the
//! blocked state always ends with a retry sweep over all ports in index order.

use tracing::debug;

use super::port::{CpuSidePort, Delivery, DownstreamLink, MemSidePort, UpstreamLink};
use super::random::{RandomSource, XorShift64};
use super::stats::CacheStats;
use super::store::BlockStore;
use crate::common::{AddrRange, CacheError, Packet, Tick};
use crate::config::CacheConfig;
use crate::sim::Scheduler;

/// Timed events the controller schedules for itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    /// Perform the tag/data lookup for an accepted request.
    Access(Packet),
}

/// The single outstanding request (MSHR).
#[derive(Debug)]
struct PendingRequest {
    /// CPU-side port the response goes back to.
    port: usize,
    /// Sub-block request held back while its whole block is fetched.
    original: Option<Packet>,
    /// Tick the miss was detected; `None` until the lookup has missed.
    miss_tick: Option<Tick>,
}

/// Single-level blocking cache with random replacement.
#[derive(Debug)]
pub struct SimpleCache<U, D> {
    name: String,
    access_delay: Tick,
    block_size: usize,
    cpu_ports: Vec<CpuSidePort<U>>,
    mem_port: MemSidePort<D>,
    store: BlockStore,
    pending: Option<PendingRequest>,
    stats: CacheStats,
}

impl<U: UpstreamLink, D: DownstreamLink> SimpleCache<U, D> {
    /// Builds a cache with the xorshift eviction source seeded from the config.
    ///
    /// # Arguments
    ///
    /// * `name` - Instance name; ports are named `<name>.cpu_side[i]` and `<name>.mem_side`.
    /// * `config` - Cache parameters.
    /// * `requestors` - One upstream peer per CPU-side port.
    /// * `memory` - The downstream peer.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::InvalidConfig` if the config fails validation or the
    /// number of requestors differs from `config.cpu_ports`.
    pub fn new(
        name: &str,
        config: &CacheConfig,
        requestors: Vec<U>,
        memory: D,
    ) -> Result<Self, CacheError> {
        let rng = Box::new(XorShift64::new(config.seed));
        Self::with_random_source(name, config, requestors, memory, rng)
    }

    /// Builds a cache with an explicit eviction random source.
    ///
    /// # Errors
    ///
    /// Same as [`SimpleCache::new`].
    pub fn with_random_source(
        name: &str,
        config: &CacheConfig,
        requestors: Vec<U>,
        memory: D,
        rng: Box<dyn RandomSource>,
    ) -> Result<Self, CacheError> {
        config.validate()?;
        if requestors.len() != config.cpu_ports {
            return Err(CacheError::InvalidConfig(format!(
                "{} requestors supplied for {} cpu ports",
                requestors.len(),
                config.cpu_ports
            )));
        }

        let cpu_ports = requestors
            .into_iter()
            .enumerate()
            .map(|(i, link)| CpuSidePort::new(i, format!("{name}.cpu_side[{i}]"), link))
            .collect();

        Ok(Self {
            name: name.to_string(),
            access_delay: config.access_delay(),
            block_size: config.block_size,
            cpu_ports,
            mem_port: MemSidePort::new(format!("{name}.mem_side"), memory),
            store: BlockStore::new(config.block_size, config.capacity(), rng),
            pending: None,
            stats: CacheStats::default(),
        })
    }

    /// Instance name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Block size in bytes.
    pub const fn block_size(&self) -> usize {
        self.block_size
    }

    /// Returns `true` while a request is outstanding.
    pub const fn is_blocked(&self) -> bool {
        self.pending.is_some()
    }

    /// Port the outstanding request came from, if any.
    pub fn waiting_port(&self) -> Option<usize> {
        self.pending.as_ref().map(|p| p.port)
    }

    /// Statistics gathered on the timed path.
    pub const fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Clears all statistics.
    pub fn reset_stats(&mut self) {
        self.stats = CacheStats::default();
    }

    /// Read-only view of the block store.
    pub const fn store(&self) -> &BlockStore {
        &self.store
    }

    /// Number of CPU-side ports.
    pub fn num_cpu_ports(&self) -> usize {
        self.cpu_ports.len()
    }

    /// CPU-side port `port`.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::InvalidPort` for an out-of-range index.
    pub fn cpu_port(&self, port: usize) -> Result<&CpuSidePort<U>, CacheError> {
        self.cpu_ports.get(port).ok_or(CacheError::InvalidPort {
            port,
            count: self.cpu_ports.len(),
        })
    }

    /// CPU-side port `port`, mutably.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::InvalidPort` for an out-of-range index.
    pub fn cpu_port_mut(&mut self, port: usize) -> Result<&mut CpuSidePort<U>, CacheError> {
        let count = self.cpu_ports.len();
        self.cpu_ports
            .get_mut(port)
            .ok_or(CacheError::InvalidPort { port, count })
    }

    /// Memory-side port.
    pub const fn mem_port(&self) -> &MemSidePort<D> {
        &self.mem_port
    }

    /// Memory-side port, mutably.
    pub fn mem_port_mut(&mut self) -> &mut MemSidePort<D> {
        &mut self.mem_port
    }

    // ── CPU side ────────────────────────────────────────────

    /// Offers a timed request arriving on CPU-side port `port`.
    ///
    /// A port with a buffered response or an owed retry refuses outright. Otherwise
    /// the controller decides; a refusal in either case leaves the port owing the
    /// requestor a retry.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::InvalidPort` for an out-of-range index.
    pub fn recv_timing_req(
        &mut self,
        port: usize,
        pkt: Packet,
        sched: &mut dyn Scheduler,
    ) -> Result<Delivery, CacheError> {
        let cpu_port = self.cpu_port_mut(port)?;
        debug!(port = %cpu_port.name(), %pkt, "got request");

        if cpu_port.refuses_requests() {
            debug!(port = %cpu_port.name(), "request blocked");
            cpu_port.owe_retry();
            return Ok(Delivery::Refused(pkt));
        }

        match self.handle_request(pkt, port, sched) {
            Delivery::Accepted => Ok(Delivery::Accepted),
            Delivery::Refused(pkt) => {
                debug!(port, "request failed, cache blocked");
                self.cpu_ports[port].owe_retry();
                Ok(Delivery::Refused(pkt))
            }
        }
    }

    /// Performs an untimed access arriving on CPU-side port `port`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPort`, `SpansMultipleBlocks`, or `UnknownCommand`.
    pub fn recv_functional(&mut self, port: usize, pkt: &mut Packet) -> Result<(), CacheError> {
        let _ = self.cpu_port(port)?;
        self.handle_functional(pkt)
    }

    /// Handles requestor `port` signalling it can take a response again.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPort`, or `NoBlockedPacket` if that port buffered nothing.
    pub fn recv_resp_retry(&mut self, port: usize) -> Result<(), CacheError> {
        self.cpu_port_mut(port)?.recv_resp_retry()
    }

    /// Address ranges served through every CPU-side port.
    ///
    /// These are whatever the backing store advertises.
    pub fn address_ranges(&self) -> Vec<AddrRange> {
        debug!(cache = %self.name, "sending new ranges");
        self.mem_port.address_ranges()
    }

    // ── Memory side ─────────────────────────────────────────

    /// Consumes the downstream reply for the outstanding miss.
    ///
    /// # Errors
    ///
    /// Returns `UnexpectedResponse` if no miss is outstanding, plus any error from
    /// installing the block or responding upstream.
    pub fn recv_timing_resp(
        &mut self,
        pkt: Packet,
        sched: &mut dyn Scheduler,
    ) -> Result<(), CacheError> {
        self.handle_response(pkt, sched.now())
    }

    /// Handles the backing store signalling it can take a request again.
    ///
    /// # Errors
    ///
    /// Returns `NoBlockedPacket` if nothing was buffered downstream.
    pub fn recv_req_retry(&mut self) -> Result<(), CacheError> {
        self.mem_port.recv_req_retry()
    }

    /// Re-broadcasts a downstream range change to every requestor.
    pub fn recv_range_change(&mut self) {
        for port in &mut self.cpu_ports {
            port.send_range_change();
        }
    }

    /// Delivers a previously scheduled event.
    ///
    /// # Errors
    ///
    /// Propagates any fatal error raised while servicing the access.
    pub fn process_event(
        &mut self,
        event: CacheEvent,
        sched: &mut dyn Scheduler,
    ) -> Result<(), CacheError> {
        match event {
            CacheEvent::Access(pkt) => self.access_timing(pkt, sched.now()),
        }
    }

    // ── State machine ───────────────────────────────────────

    fn handle_request(&mut self, pkt: Packet, port: usize, sched: &mut dyn Scheduler) -> Delivery {
        if self.pending.is_some() {
            return Delivery::Refused(pkt);
        }

        debug!(addr = %pkt.addr(), port, "accepted request");
        self.pending = Some(PendingRequest {
            port,
            original: None,
            miss_tick: None,
        });
        sched.schedule_after(self.access_delay, CacheEvent::Access(pkt));
        Delivery::Accepted
    }

    fn access_timing(&mut self, mut pkt: Packet, now: Tick) -> Result<(), CacheError> {
        if self.pending.is_none() {
            return Err(CacheError::OrphanAccess { addr: pkt.addr() });
        }

        if self.access_functional(&mut pkt)? {
            self.stats.hits += 1;
            debug!(addr = %pkt.addr(), "hit");
            pkt.make_response()?;
            let port = self.take_pending(&pkt)?.port;
            return self.send_response(port, pkt);
        }

        self.stats.misses += 1;
        debug!(addr = %pkt.addr(), "miss");
        if !pkt.needs_response() {
            return Err(CacheError::UnknownCommand {
                cmd: pkt.cmd(),
                addr: pkt.addr(),
            });
        }

        let block_size = self.block_size;
        let forward = if pkt.is_whole_block(block_size) {
            debug!(addr = %pkt.addr(), "forwarding packet");
            pkt
        } else {
            debug!(addr = %pkt.addr(), "upgrading packet to block size");
            let fetch = Packet::read(pkt.id, pkt.block_addr(block_size), block_size);
            let pending = self.pending_mut(&pkt)?;
            pending.original = Some(pkt);
            fetch
        };
        self.pending_mut(&forward)?.miss_tick = Some(now);
        self.mem_port.send_packet(forward)
    }

    fn handle_response(&mut self, pkt: Packet, now: Tick) -> Result<(), CacheError> {
        let pending = match self.pending.take() {
            Some(pending) if pending.miss_tick.is_some() => pending,
            other => {
                self.pending = other;
                return Err(CacheError::UnexpectedResponse { addr: pkt.addr() });
            }
        };
        debug!(addr = %pkt.addr(), "got response");

        self.insert(&pkt)?;
        if let Some(miss_tick) = pending.miss_tick {
            self.stats.miss_latency.sample(now.saturating_sub(miss_tick));
        }

        let response = match pending.original {
            Some(mut original) => {
                let _ = self.access_functional(&mut original)?;
                original.make_response()?;
                original
            }
            None => pkt,
        };
        self.send_response(pending.port, response)
    }

    /// Answers on `port`, then offers retries to every port in index order.
    ///
    /// The pending request must already be cleared.
    fn send_response(&mut self, port: usize, pkt: Packet) -> Result<(), CacheError> {
        debug!(port, %pkt, "sending response");
        self.cpu_port_mut(port)?.send_packet(pkt)?;
        for port in &mut self.cpu_ports {
            port.try_send_retry();
        }
        Ok(())
    }

    fn handle_functional(&mut self, pkt: &mut Packet) -> Result<(), CacheError> {
        if self.access_functional(pkt)? {
            pkt.make_response()
        } else {
            self.mem_port.send_functional(pkt);
            Ok(())
        }
    }

    /// Services `pkt` against the store if its block is resident.
    ///
    /// Returns whether it hit. Never touches statistics or blocking state.
    fn access_functional(&mut self, pkt: &mut Packet) -> Result<bool, CacheError> {
        let block_size = self.block_size;
        if !pkt.fits_in_block(block_size) {
            return Err(CacheError::SpansMultipleBlocks {
                addr: pkt.addr(),
                size: pkt.size(),
                block_size,
            });
        }

        let Some(block) = self.store.lookup_mut(pkt.block_addr(block_size)) else {
            return Ok(false);
        };
        if pkt.is_write() {
            pkt.write_data_to_block(block);
        } else if pkt.is_read() {
            pkt.set_data_from_block(block);
        } else {
            return Err(CacheError::UnknownCommand {
                cmd: pkt.cmd(),
                addr: pkt.addr(),
            });
        }
        Ok(true)
    }

    /// Installs the block carried by a downstream reply, writing back any victim.
    fn insert(&mut self, pkt: &Packet) -> Result<(), CacheError> {
        if !pkt.is_response() {
            return Err(CacheError::UnknownCommand {
                cmd: pkt.cmd(),
                addr: pkt.addr(),
            });
        }

        debug!(addr = %pkt.addr(), "inserting block");
        if let Some(victim) = self.store.insert(pkt.addr(), pkt.data().to_vec())? {
            debug!(addr = %victim.addr, "removing block, writing back");
            self.mem_port
                .send_packet(Packet::writeback(victim.addr, victim.data.into_vec()))?;
        }
        Ok(())
    }

    fn take_pending(&mut self, pkt: &Packet) -> Result<PendingRequest, CacheError> {
        self.pending
            .take()
            .ok_or(CacheError::OrphanAccess { addr: pkt.addr() })
    }

    fn pending_mut(&mut self, pkt: &Packet) -> Result<&mut PendingRequest, CacheError> {
        self.pending
            .as_mut()
            .ok_or(CacheError::OrphanAccess { addr: pkt.addr() })
    }
}
