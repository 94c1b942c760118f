//! Configuration system for the cache model.
//!
//! This module defines all configuration structures used to parameterize a run. It provides:
//! 1. **Defaults:** Baseline constants for the cache and the backing memory.
//! 2. **Structures:** `CacheConfig`, `MemoryConfig`, and the root `Config`.
//! 3. **Loading:** JSON decoding from a string or a file, plus validation.
//!
//! The core only reads these values; loading them is the caller's business.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::common::CacheError;

/// Default configuration constants.
///
/// These values define the baseline configuration when a field is not
/// explicitly given in the JSON document.
mod defaults {
    /// Cycles taken on a hit or to resolve a miss.
    pub const CACHE_LATENCY: u64 = 1;

    /// Total cache storage (16 KiB).
    pub const CACHE_SIZE: usize = 16 * 1024;

    /// Cache block size in bytes, as supplied by the memory system.
    pub const BLOCK_SIZE: usize = 64;

    /// Number of CPU-side port slots.
    pub const CPU_PORTS: usize = 1;

    /// Ticks per clock cycle.
    pub const CLOCK_PERIOD: u64 = 1;

    /// Seed for the eviction random source.
    pub const SEED: u64 = 123456789;

    /// Base address of the backing memory.
    pub const MEMORY_BASE: u64 = 0;

    /// Backing memory size (1 MiB).
    pub const MEMORY_SIZE: usize = 1024 * 1024;

    /// Backing memory access latency in ticks.
    pub const MEMORY_LATENCY: u64 = 20;

    /// Requests the backing memory holds before refusing new ones.
    pub const MEMORY_QUEUE_DEPTH: usize = 4;
}

/// Root configuration.
///
/// # Examples
///
/// ```
/// use simcache_core::config::Config;
///
/// let json = r#"{
///     "cache": { "latency": 2, "size_bytes": 128, "block_size": 64, "cpu_ports": 2 },
///     "memory": { "latency": 10 }
/// }"#;
///
/// let config = Config::from_json(json).unwrap();
/// assert_eq!(config.cache.capacity(), 2);
/// assert_eq!(config.memory.latency, 10);
/// assert_eq!(config.memory.queue_depth, 4);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Cache parameters.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Backing memory parameters.
    #[serde(default)]
    pub memory: MemoryConfig,
}

impl Config {
    /// Decodes and validates a configuration from JSON text.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Json` for malformed documents and
    /// `CacheError::InvalidConfig` for values that fail validation.
    pub fn from_json(json: &str) -> Result<Self, CacheError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, decodes, and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Io` if the file cannot be read, plus any error
    /// from [`Config::from_json`].
    pub fn from_file(path: &Path) -> Result<Self, CacheError> {
        let text = fs::read_to_string(path).map_err(|source| CacheError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Validates both sections.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::InvalidConfig` describing the first bad value.
    pub fn validate(&self) -> Result<(), CacheError> {
        self.cache.validate()?;
        self.memory.validate(self.cache.block_size)
    }
}

/// Cache parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Cycles taken on a hit or to resolve a miss.
    #[serde(default = "CacheConfig::default_latency")]
    pub latency: u64,

    /// Total storage in bytes.
    #[serde(default = "CacheConfig::default_size")]
    pub size_bytes: usize,

    /// Block size in bytes; must be a power of two.
    #[serde(default = "CacheConfig::default_block_size")]
    pub block_size: usize,

    /// Number of CPU-side port slots.
    #[serde(default = "CacheConfig::default_cpu_ports")]
    pub cpu_ports: usize,

    /// Ticks per clock cycle.
    #[serde(default = "CacheConfig::default_clock_period")]
    pub clock_period: u64,

    /// Seed for the eviction random source.
    #[serde(default = "CacheConfig::default_seed")]
    pub seed: u64,
}

impl CacheConfig {
    fn default_latency() -> u64 {
        defaults::CACHE_LATENCY
    }

    fn default_size() -> usize {
        defaults::CACHE_SIZE
    }

    fn default_block_size() -> usize {
        defaults::BLOCK_SIZE
    }

    fn default_cpu_ports() -> usize {
        defaults::CPU_PORTS
    }

    fn default_clock_period() -> u64 {
        defaults::CLOCK_PERIOD
    }

    fn default_seed() -> u64 {
        defaults::SEED
    }

    /// Number of blocks the cache can hold.
    pub const fn capacity(&self) -> usize {
        if self.block_size == 0 {
            0
        } else {
            self.size_bytes / self.block_size
        }
    }

    /// Ticks between accepting a request and performing its lookup.
    pub const fn access_delay(&self) -> u64 {
        self.latency.saturating_mul(self.clock_period)
    }

    /// Checks that the parameters describe a usable cache.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::InvalidConfig` if the block size is zero or not a
    /// power of two, the storage holds less than one block, there are no
    /// ports, or the clock period is zero.
    pub fn validate(&self) -> Result<(), CacheError> {
        if !self.block_size.is_power_of_two() {
            return Err(CacheError::InvalidConfig(format!(
                "block_size {} is not a power of two",
                self.block_size
            )));
        }
        if self.capacity() == 0 {
            return Err(CacheError::InvalidConfig(format!(
                "size_bytes {} holds no {}-byte blocks",
                self.size_bytes, self.block_size
            )));
        }
        if self.cpu_ports == 0 {
            return Err(CacheError::InvalidConfig(
                "cpu_ports must be at least 1".to_string(),
            ));
        }
        if self.clock_period == 0 {
            return Err(CacheError::InvalidConfig(
                "clock_period must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            latency: defaults::CACHE_LATENCY,
            size_bytes: defaults::CACHE_SIZE,
            block_size: defaults::BLOCK_SIZE,
            cpu_ports: defaults::CPU_PORTS,
            clock_period: defaults::CLOCK_PERIOD,
            seed: defaults::SEED,
        }
    }
}

/// Backing memory parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// First address served.
    #[serde(default = "MemoryConfig::default_base")]
    pub base: u64,

    /// Bytes served starting at `base`.
    #[serde(default = "MemoryConfig::default_size")]
    pub size_bytes: usize,

    /// Ticks from accepting a request to its response being ready.
    #[serde(default = "MemoryConfig::default_latency")]
    pub latency: u64,

    /// Outstanding requests held before new ones are refused.
    #[serde(default = "MemoryConfig::default_queue_depth")]
    pub queue_depth: usize,
}

impl MemoryConfig {
    fn default_base() -> u64 {
        defaults::MEMORY_BASE
    }

    fn default_size() -> usize {
        defaults::MEMORY_SIZE
    }

    fn default_latency() -> u64 {
        defaults::MEMORY_LATENCY
    }

    fn default_queue_depth() -> usize {
        defaults::MEMORY_QUEUE_DEPTH
    }

    /// Checks that the memory can serve whole blocks.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::InvalidConfig` for a zero queue depth, a misaligned
    /// base, or a size that is not a whole number of blocks.
    pub fn validate(&self, block_size: usize) -> Result<(), CacheError> {
        if self.queue_depth == 0 {
            return Err(CacheError::InvalidConfig(
                "memory queue_depth must be at least 1".to_string(),
            ));
        }
        if self.base % block_size as u64 != 0 || self.size_bytes % block_size != 0 {
            return Err(CacheError::InvalidConfig(format!(
                "memory [{:#x}, +{:#x}) is not a whole number of {block_size}-byte blocks",
                self.base, self.size_bytes
            )));
        }
        Ok(())
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            base: defaults::MEMORY_BASE,
            size_bytes: defaults::MEMORY_SIZE,
            latency: defaults::MEMORY_LATENCY,
            queue_depth: defaults::MEMORY_QUEUE_DEPTH,
        }
    }
}
