//! Builders for small caches and packets.

use simcache_core::cache::SimpleCache;
use simcache_core::common::{Addr, Packet};
use simcache_core::config::CacheConfig;

use super::mocks::{RecordingRequestor, ScriptedMemory};

/// Cache configuration with `blocks` blocks of `block_size` bytes.
pub fn cache_config(block_size: usize, blocks: usize, latency: u64, ports: usize) -> CacheConfig {
    CacheConfig {
        latency,
        size_bytes: block_size * blocks,
        block_size,
        cpu_ports: ports,
        clock_period: 1,
        seed: 7,
    }
}

/// Cache wired to recording requestors and a scripted memory.
pub type TestCache = SimpleCache<RecordingRequestor, ScriptedMemory>;

/// Builds a cache over recording requestors and a scripted memory.
pub fn test_cache(config: &CacheConfig) -> TestCache {
    let requestors = (0..config.cpu_ports)
        .map(|_| RecordingRequestor::default())
        .collect();
    SimpleCache::new("cache", config, requestors, ScriptedMemory::default()).unwrap()
}

/// Read request.
pub fn read(id: u64, addr: u64, size: usize) -> Packet {
    Packet::read(id, Addr::new(addr), size)
}

/// Write request carrying `size` copies of `byte`.
pub fn write(id: u64, addr: u64, size: usize, byte: u8) -> Packet {
    Packet::write(id, Addr::new(addr), vec![byte; size])
}

/// A block whose byte `i` is `seed + i`.
pub fn block_data(seed: u8, block_size: usize) -> Vec<u8> {
    (0..block_size).map(|i| seed.wrapping_add(i as u8)).collect()
}
