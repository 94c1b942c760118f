//! CPU-side and memory-side ports with their flow control.
//!
//! Each direction has its own peer trait instead of a shared port hierarchy:
//! 1. **`UpstreamLink`:** the requestor attached to one CPU-side port. It receives
//!    responses, retry notifications, and range changes.
//! 2. **`DownstreamLink`:** the single memory-side peer. It receives requests and
//!    functional accesses, and advertises the address ranges it serves.
//!
//! A refused send hands the packet back through `Delivery::Refused`; the port keeps
//! it as its one blocked packet until the peer signals the link is free again.

use tracing::debug;

use crate::common::{AddrRange, CacheError, Packet};

/// Outcome of offering a packet to a receiver.
#[must_use]
#[derive(Debug, PartialEq, Eq)]
pub enum Delivery {
    /// The receiver took ownership of the packet.
    Accepted,
    /// The receiver cannot take the packet now; ownership returns to the sender,
    /// who must wait for a retry notification before offering it again.
    Refused(Packet),
}

impl Delivery {
    /// Returns `true` if the packet was taken.
    pub const fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

/// Requestor attached to a CPU-side port.
pub trait UpstreamLink {
    /// Offers a response to the requestor.
    fn recv_timing_resp(&mut self, pkt: Packet) -> Delivery;

    /// Tells the requestor a previously refused request may be re-sent.
    fn recv_req_retry(&mut self);

    /// Tells the requestor the served address ranges changed.
    fn recv_range_change(&mut self) {}
}

/// Backing store attached to the memory-side port.
pub trait DownstreamLink {
    /// Offers a timed request to the backing store.
    fn recv_timing_req(&mut self, pkt: Packet) -> Delivery;

    /// Services an untimed access in place, turning it into a response.
    fn recv_functional(&mut self, pkt: &mut Packet);

    /// Address ranges the backing store serves.
    fn address_ranges(&self) -> Vec<AddrRange>;
}

/// Port facing one requestor.
#[derive(Debug)]
pub struct CpuSidePort<U> {
    id: usize,
    name: String,
    link: U,
    need_retry: bool,
    blocked_packet: Option<Packet>,
}

impl<U: UpstreamLink> CpuSidePort<U> {
    /// Creates port `id` attached to `link`.
    pub fn new(id: usize, name: String, link: U) -> Self {
        Self {
            id,
            name,
            link,
            need_retry: false,
            blocked_packet: None,
        }
    }

    /// Port index.
    pub const fn id(&self) -> usize {
        self.id
    }

    /// Port name used in logs and errors.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attached requestor.
    pub const fn link(&self) -> &U {
        &self.link
    }

    /// Attached requestor, mutably.
    pub fn link_mut(&mut self) -> &mut U {
        &mut self.link
    }

    /// Returns `true` if a refused requestor is owed a retry.
    pub const fn needs_retry(&self) -> bool {
        self.need_retry
    }

    /// Response waiting for the requestor's link to free up.
    pub const fn blocked_packet(&self) -> Option<&Packet> {
        self.blocked_packet.as_ref()
    }

    /// A port with a buffered response or an owed retry refuses new requests,
    /// so a requestor cannot overtake one that is already waiting.
    pub(crate) const fn refuses_requests(&self) -> bool {
        self.blocked_packet.is_some() || self.need_retry
    }

    pub(crate) fn owe_retry(&mut self) {
        self.need_retry = true;
    }

    /// Sends a response to the requestor, buffering it if refused.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::LinkBusy` if a response is already buffered.
    pub fn send_packet(&mut self, pkt: Packet) -> Result<(), CacheError> {
        if self.blocked_packet.is_some() {
            return Err(CacheError::LinkBusy {
                link: self.name.clone(),
            });
        }

        debug!(port = %self.name, %pkt, "sending response");
        if let Delivery::Refused(pkt) = self.link.recv_timing_resp(pkt) {
            debug!(port = %self.name, "response refused");
            self.blocked_packet = Some(pkt);
        }
        Ok(())
    }

    /// Sends a retry to the requestor if one is owed and no response is buffered.
    pub fn try_send_retry(&mut self) {
        if self.need_retry && self.blocked_packet.is_none() {
            self.need_retry = false;
            debug!(port = %self.name, "sending retry req");
            self.link.recv_req_retry();
        }
    }

    /// Handles the requestor signalling it can accept a response again.
    ///
    /// Re-sends the buffered response (which may be refused again) and then
    /// offers any owed retry.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::NoBlockedPacket` if nothing was buffered.
    pub fn recv_resp_retry(&mut self) -> Result<(), CacheError> {
        let pkt = self
            .blocked_packet
            .take()
            .ok_or_else(|| CacheError::NoBlockedPacket {
                link: self.name.clone(),
            })?;

        debug!(port = %self.name, %pkt, "retrying response");
        self.send_packet(pkt)?;
        self.try_send_retry();
        Ok(())
    }

    /// Forwards a range-change notification to the requestor.
    pub fn send_range_change(&mut self) {
        self.link.recv_range_change();
    }
}

/// Port facing the backing store.
#[derive(Debug)]
pub struct MemSidePort<D> {
    name: String,
    link: D,
    blocked_packet: Option<Packet>,
}

impl<D: DownstreamLink> MemSidePort<D> {
    /// Creates the memory-side port attached to `link`.
    pub const fn new(name: String, link: D) -> Self {
        Self {
            name,
            link,
            blocked_packet: None,
        }
    }

    /// Port name used in logs and errors.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attached backing store.
    pub const fn link(&self) -> &D {
        &self.link
    }

    /// Attached backing store, mutably.
    pub fn link_mut(&mut self) -> &mut D {
        &mut self.link
    }

    /// Request waiting for the backing store to accept it.
    pub const fn blocked_packet(&self) -> Option<&Packet> {
        self.blocked_packet.as_ref()
    }

    /// Sends a request downstream, buffering it if refused.
    ///
    /// The cache is blocking, so at most one request is ever buffered here.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::LinkBusy` if a request is already buffered.
    pub fn send_packet(&mut self, pkt: Packet) -> Result<(), CacheError> {
        if self.blocked_packet.is_some() {
            return Err(CacheError::LinkBusy {
                link: self.name.clone(),
            });
        }

        debug!(port = %self.name, %pkt, "sending request");
        if let Delivery::Refused(pkt) = self.link.recv_timing_req(pkt) {
            debug!(port = %self.name, "request refused");
            self.blocked_packet = Some(pkt);
        }
        Ok(())
    }

    /// Handles the backing store signalling it can accept a request again.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::NoBlockedPacket` if nothing was buffered.
    pub fn recv_req_retry(&mut self) -> Result<(), CacheError> {
        let pkt = self
            .blocked_packet
            .take()
            .ok_or_else(|| CacheError::NoBlockedPacket {
                link: self.name.clone(),
            })?;
        self.send_packet(pkt)
    }

    /// Performs an untimed access against the backing store.
    pub fn send_functional(&mut self, pkt: &mut Packet) {
        self.link.recv_functional(pkt);
    }

    /// Address ranges advertised by the backing store.
    pub fn address_ranges(&self) -> Vec<AddrRange> {
        self.link.address_ranges()
    }
}
