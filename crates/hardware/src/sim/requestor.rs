//! Upstream traffic source attached to a CPU-side port.
//!
//! A `Requestor` plays the CPU: it issues queued packets in order, holds on to a
//! refused packet until the cache sends a retry, and collects responses. It can also
//! refuse a number of responses to exercise the cache's response buffering, after
//! which it asks the harness to deliver a response retry.

use std::collections::VecDeque;

use tracing::trace;

use crate::cache::{Delivery, UpstreamLink};
use crate::common::Packet;

/// Scripted requestor.
#[derive(Debug, Default)]
pub struct Requestor {
    name: String,
    to_issue: VecDeque<Packet>,
    waiting_for_retry: bool,
    responses: Vec<Packet>,
    refuse_next: usize,
    resp_retry_wanted: bool,
    /// Requests the cache refused.
    pub refused_requests: u64,
    /// Retry notifications received.
    pub retries_received: u64,
    /// Range-change notifications received.
    pub range_changes: u64,
}

impl Requestor {
    /// Creates an idle requestor.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Requestor name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Queues a packet to be issued after those already queued.
    pub fn push(&mut self, pkt: Packet) {
        self.to_issue.push_back(pkt);
    }

    /// Refuses the next `count` responses offered.
    pub fn refuse_responses(&mut self, count: usize) {
        self.refuse_next = count;
    }

    /// Takes the next packet to issue, unless waiting for a retry.
    pub fn next_request(&mut self) -> Option<Packet> {
        if self.waiting_for_retry {
            return None;
        }
        self.to_issue.pop_front()
    }

    /// Takes back a refused packet; nothing more is issued until a retry arrives.
    pub fn request_refused(&mut self, pkt: Packet) {
        trace!(requestor = %self.name, %pkt, "request refused, waiting for retry");
        self.to_issue.push_front(pkt);
        self.waiting_for_retry = true;
        self.refused_requests += 1;
    }

    /// Returns `true`, once, after a response was refused.
    pub fn take_resp_retry(&mut self) -> bool {
        let wanted = self.resp_retry_wanted;
        self.resp_retry_wanted = false;
        wanted
    }

    /// Returns `true` while a refused request waits for a retry.
    pub const fn is_waiting_for_retry(&self) -> bool {
        self.waiting_for_retry
    }

    /// Packets not yet accepted by the cache.
    pub fn queued(&self) -> usize {
        self.to_issue.len()
    }

    /// Responses received, in arrival order.
    pub fn responses(&self) -> &[Packet] {
        &self.responses
    }

    /// Drains the responses received so far.
    pub fn take_responses(&mut self) -> Vec<Packet> {
        std::mem::take(&mut self.responses)
    }
}

impl UpstreamLink for Requestor {
    fn recv_timing_resp(&mut self, pkt: Packet) -> Delivery {
        if self.refuse_next > 0 {
            self.refuse_next -= 1;
            self.resp_retry_wanted = true;
            trace!(requestor = %self.name, %pkt, "refusing response");
            return Delivery::Refused(pkt);
        }
        trace!(requestor = %self.name, %pkt, "got response");
        self.responses.push(pkt);
        Delivery::Accepted
    }

    fn recv_req_retry(&mut self) {
        self.waiting_for_retry = false;
        self.retries_received += 1;
    }

    fn recv_range_change(&mut self) {
        self.range_changes += 1;
    }
}
