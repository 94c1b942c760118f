//! Discrete-event queue and the scheduling interface the cache consumes.
//!
//! The cache never owns a clock. It asks a `Scheduler` for the current tick and
//! hands it owned events to deliver later. `EventQueue` is the stock scheduler: a
//! binary heap keyed on (tick, insertion sequence), so events due on the same tick
//! come out in the order they were scheduled.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;

use crate::cache::CacheEvent;
use crate::common::Tick;

/// Scheduling services the cache controller consumes.
pub trait Scheduler {
    /// Current simulated time.
    fn now(&self) -> Tick;

    /// Requests delivery of `event` after `delay` ticks.
    fn schedule_after(&mut self, delay: Tick, event: CacheEvent);
}

struct Scheduled<E> {
    when: Tick,
    seq: u64,
    event: E,
}

impl<E> PartialEq for Scheduled<E> {
    fn eq(&self, other: &Self) -> bool {
        self.when == other.when && self.seq == other.seq
    }
}

impl<E> Eq for Scheduled<E> {}

// Reversed so the max-heap yields the earliest event first.
impl<E> Ord for Scheduled<E> {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .when
            .cmp(&self.when)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl<E> PartialOrd for Scheduled<E> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Time-ordered queue of pending events.
pub struct EventQueue<E> {
    now: Tick,
    seq: u64,
    heap: BinaryHeap<Scheduled<E>>,
}

impl<E> EventQueue<E> {
    /// Creates an empty queue at tick zero.
    pub fn new() -> Self {
        Self {
            now: 0,
            seq: 0,
            heap: BinaryHeap::new(),
        }
    }

    /// Current simulated time.
    pub const fn now(&self) -> Tick {
        self.now
    }

    /// Schedules `event` at absolute tick `when`; past ticks are clamped to now.
    pub fn schedule_at(&mut self, when: Tick, event: E) {
        let when = when.max(self.now);
        self.heap.push(Scheduled {
            when,
            seq: self.seq,
            event,
        });
        self.seq += 1;
    }

    /// Schedules `event` `delay` ticks from now.
    pub fn schedule_in(&mut self, delay: Tick, event: E) {
        self.schedule_at(self.now.saturating_add(delay), event);
    }

    /// Tick of the earliest pending event.
    pub fn peek_tick(&self) -> Option<Tick> {
        self.heap.peek().map(|s| s.when)
    }

    /// Moves time forward to `tick`; never moves it backwards.
    pub fn advance_to(&mut self, tick: Tick) {
        self.now = self.now.max(tick);
    }

    /// Pops the earliest event if it is due at or before the current tick.
    pub fn pop_due(&mut self) -> Option<E> {
        if self.peek_tick()? > self.now {
            return None;
        }
        self.heap.pop().map(|s| s.event)
    }

    /// Advances time to the earliest event and pops it.
    pub fn pop_next(&mut self) -> Option<(Tick, E)> {
        let next = self.heap.pop()?;
        self.advance_to(next.when);
        Some((next.when, next.event))
    }

    /// Number of pending events.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Returns `true` if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

impl<E> Default for EventQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for EventQueue<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventQueue")
            .field("now", &self.now)
            .field("pending", &self.heap.len())
            .field("next", &self.peek_tick())
            .finish()
    }
}

impl<E: From<CacheEvent>> Scheduler for EventQueue<E> {
    fn now(&self) -> Tick {
        self.now
    }

    fn schedule_after(&mut self, delay: Tick, event: CacheEvent) {
        self.schedule_in(delay, E::from(event));
    }
}
