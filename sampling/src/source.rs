use rand_chacha::{ChaCha8Rng, rand_core::SeedableRng};
use rand_core::RngCore;

const MAXF64: f64 = 9007199254740992.0;

/// Seeded ChaCha8 stream. Identical seeds give identical inputs, which keeps
/// the randomized tests reproducible.
pub struct Source {
    source: ChaCha8Rng,
}

impl Source {
    pub fn new(seed: [u8; 32]) -> Source {
        Source {
            source: ChaCha8Rng::from_seed(seed),
        }
    }

    /// Uniform in `[min, max)` with 53 random bits.
    #[inline(always)]
    pub fn next_f64(&mut self, min: f64, max: f64) -> f64 {
        min + ((self.next_u64() >> 11) as f64) / MAXF64 * (max - min)
    }

    /// Uniform in `[min, max]`.
    pub fn next_i64_in(&mut self, min: i64, max: i64) -> i64 {
        assert!(min <= max, "invalid range: min={min} > max={max}");
        let span: u64 = (max - min) as u64 + 1;
        let mask: u64 = span.next_power_of_two().wrapping_sub(1);
        let mut x: u64 = self.next_u64() & mask;
        while x >= span {
            x = self.next_u64() & mask;
        }
        min + x as i64
    }

    /// Random `bits`-bit selector, e.g. a theta characteristic.
    pub fn next_bits(&mut self, bits: usize) -> u64 {
        assert!(bits < 64);
        self.next_u64() & ((1u64 << bits) - 1)
    }
}

impl RngCore for Source {
    #[inline(always)]
    fn next_u32(&mut self) -> u32 {
        self.source.next_u32()
    }

    #[inline(always)]
    fn next_u64(&mut self) -> u64 {
        self.source.next_u64()
    }

    #[inline(always)]
    fn fill_bytes(&mut self, bytes: &mut [u8]) {
        self.source.fill_bytes(bytes)
    }
}
