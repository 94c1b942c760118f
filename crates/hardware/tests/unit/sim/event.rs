//! Event Queue Unit Tests.

use pretty_assertions::assert_eq;
use simcache_core::cache::CacheEvent;
use simcache_core::common::{Addr, Packet};
use simcache_core::sim::{EventQueue, Scheduler, SimEvent};

#[test]
fn same_tick_events_keep_schedule_order() {
    let mut q = EventQueue::new();
    for id in 0..5u32 {
        q.schedule_at(10, id);
    }
    q.schedule_at(3, 99);
    let order: Vec<u32> = std::iter::from_fn(|| q.pop_next().map(|(_, e)| e)).collect();
    assert_eq!(order, vec![99, 0, 1, 2, 3, 4]);
}

#[test]
fn past_ticks_are_clamped_to_now() {
    let mut q = EventQueue::new();
    q.advance_to(50);
    q.schedule_at(10, 'x');
    assert_eq!(q.peek_tick(), Some(50));
    q.advance_to(20);
    assert_eq!(q.now(), 50);
}

#[test]
fn scheduler_wraps_cache_events() {
    let mut q: EventQueue<SimEvent> = EventQueue::new();
    q.advance_to(7);
    let pkt = Packet::read(1, Addr::new(0x40), 8);
    Scheduler::schedule_after(&mut q, 3, CacheEvent::Access(pkt.clone()));

    assert_eq!(Scheduler::now(&q), 7);
    assert_eq!(q.len(), 1);
    assert_eq!(q.pop_due(), None);
    q.advance_to(10);
    assert_eq!(q.pop_due(), Some(SimEvent::Cache(CacheEvent::Access(pkt))));
    assert!(q.is_empty());
}
