//! Cache statistics counters.
//!
//! The controller updates these on the timed path only; functional accesses never
//! touch them. They are plain data so an external collector can poll or serialize
//! them; nothing here prints.

use serde::Serialize;

/// Number of buckets in the miss-latency histogram.
pub const MISS_LATENCY_BUCKETS: usize = 16;

/// Fixed-bucket-count histogram whose bucket width grows to fit the samples.
///
/// Width starts at one tick. When a sample lands past the last bucket, the width
/// doubles and adjacent buckets merge pairwise until it fits.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Histogram {
    buckets: Vec<u64>,
    bucket_size: u64,
    samples: u64,
    sum: u64,
    min: Option<u64>,
    max: Option<u64>,
}

impl Histogram {
    /// Creates an empty histogram with `buckets` buckets (at least one).
    pub fn new(buckets: usize) -> Self {
        Self {
            buckets: vec![0; buckets.max(1)],
            bucket_size: 1,
            samples: 0,
            sum: 0,
            min: None,
            max: None,
        }
    }

    /// Records one sample.
    pub fn sample(&mut self, value: u64) {
        let n = self.buckets.len() as u64;
        while self
            .bucket_size
            .checked_mul(n)
            .is_some_and(|top| value >= top)
        {
            self.grow();
        }
        self.buckets[(value / self.bucket_size) as usize] += 1;
        self.samples += 1;
        self.sum = self.sum.saturating_add(value);
        self.min = Some(self.min.map_or(value, |m| m.min(value)));
        self.max = Some(self.max.map_or(value, |m| m.max(value)));
    }

    fn grow(&mut self) {
        let mut merged = vec![0; self.buckets.len()];
        for (i, count) in self.buckets.iter().enumerate() {
            merged[i / 2] += count;
        }
        self.buckets = merged;
        self.bucket_size *= 2;
    }

    /// Per-bucket counts.
    pub fn buckets(&self) -> &[u64] {
        &self.buckets
    }

    /// Current bucket width in ticks.
    pub const fn bucket_size(&self) -> u64 {
        self.bucket_size
    }

    /// Inclusive `(low, high)` bounds of bucket `i`.
    pub const fn bucket_bounds(&self, i: usize) -> (u64, u64) {
        let low = i as u64 * self.bucket_size;
        (low, low + self.bucket_size - 1)
    }

    /// Number of samples recorded.
    pub const fn samples(&self) -> u64 {
        self.samples
    }

    /// Sum of all samples.
    pub const fn sum(&self) -> u64 {
        self.sum
    }

    /// Smallest sample, if any.
    pub const fn min(&self) -> Option<u64> {
        self.min
    }

    /// Largest sample, if any.
    pub const fn max(&self) -> Option<u64> {
        self.max
    }

    /// Arithmetic mean of the samples, if any.
    pub fn mean(&self) -> Option<f64> {
        (self.samples > 0).then(|| self.sum as f64 / self.samples as f64)
    }
}

/// Hit/miss counters and miss latency distribution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Timed accesses that found their block resident.
    pub hits: u64,
    /// Timed accesses that had to fetch their block.
    pub misses: u64,
    /// Ticks from miss detection to the downstream reply being consumed.
    pub miss_latency: Histogram,
}

impl CacheStats {
    /// Total timed accesses serviced.
    pub const fn accesses(&self) -> u64 {
        self.hits + self.misses
    }

    /// `hits / (hits + misses)`, or `None` before the first timed access.
    pub fn hit_ratio(&self) -> Option<f64> {
        let total = self.accesses();
        (total > 0).then(|| self.hits as f64 / total as f64)
    }
}

impl Default for CacheStats {
    fn default() -> Self {
        Self {
            hits: 0,
            misses: 0,
            miss_latency: Histogram::new(MISS_LATENCY_BUCKETS),
        }
    }
}
