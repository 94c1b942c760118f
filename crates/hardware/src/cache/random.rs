//! Seedable random source for victim selection.
//!
//! Eviction picks a uniformly random resident block. The source is injected into the
//! block store at construction so runs are reproducible for a given seed. The default
//! implementation is a xorshift64 generator, which is cheap and good enough for
//! choosing victims.

/// Source of pseudo-random numbers for eviction.
pub trait RandomSource: Send {
    /// Returns the next 64 random bits.
    fn next_u64(&mut self) -> u64;

    /// Returns a value in `0..bound`; `bound` must be non-zero.
    ///
    /// Maps the 64-bit draw onto the range by multiply-shift.
    fn below(&mut self, bound: usize) -> usize {
        ((u128::from(self.next_u64()) * bound as u128) >> 64) as usize
    }
}

/// Xorshift64 generator.
#[derive(Clone, Debug)]
pub struct XorShift64 {
    state: u64,
}

impl XorShift64 {
    /// Creates a generator from a seed; a zero seed is remapped since xorshift
    /// would otherwise be stuck at zero.
    pub const fn new(seed: u64) -> Self {
        Self {
            state: if seed == 0 { 0x9E37_79B9_7F4A_7C15 } else { seed },
        }
    }
}

impl RandomSource for XorShift64 {
    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }
}
