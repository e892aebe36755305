/// Seeded generator with unbiased range sampling
use crate::config::types::{JtlError, Result};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Seed length accepted by a generator variant
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeedWidth {
    /// 8-byte seed
    Compact,
    /// 32-byte seed
    Full,
}

impl SeedWidth {
    pub fn len(self) -> usize {
        match self {
            SeedWidth::Compact => 8,
            SeedWidth::Full => 32,
        }
    }
}

/// Opaque generator seed, immutable once resolved
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Seed {
    Compact([u8; 8]),
    Full([u8; 32]),
}

impl Seed {
    /// Build a seed of exactly `width` bytes
    pub fn from_bytes(bytes: &[u8], width: SeedWidth) -> Result<Seed> {
        let mismatch = || {
            JtlError::Seed(format!(
                "rand_seed has incorrect length ({} instead of {})",
                bytes.len(),
                width.len()
            ))
        };
        match width {
            SeedWidth::Compact => bytes.try_into().map(Seed::Compact).map_err(|_| mismatch()),
            SeedWidth::Full => bytes.try_into().map(Seed::Full).map_err(|_| mismatch()),
        }
    }

    pub fn width(&self) -> SeedWidth {
        match self {
            Seed::Compact(_) => SeedWidth::Compact,
            Seed::Full(_) => SeedWidth::Full,
        }
    }
}

/// Anything that yields raw 64-bit words.
///
/// Range sampling and selection are derived from `next_u64`, so generator
/// code written against this trait can run on a seeded [`Generator`], the
/// process-wide one, or a scripted source in tests.
pub trait RandomSource {
    /// Next raw pseudo-random word
    fn next_u64(&mut self) -> u64;

    /// Uniform value in `[lo, hi)`. Panics if the range is empty.
    fn next_range(&mut self, lo: u64, hi: u64) -> u64
    where
        Self: Sized,
    {
        assert!(lo < hi, "next_range: empty range [{}, {})", lo, hi);
        lo + uniform_below(self, hi - lo)
    }

    /// Uniformly selected element. Panics on an empty slice.
    fn choose_uniform<'a, T>(&mut self, items: &'a [T]) -> &'a T
    where
        Self: Sized,
    {
        assert!(!items.is_empty(), "choose_uniform: empty sequence");
        let pos = self.next_range(0, items.len() as u64) as usize;
        &items[pos]
    }
}

/// Returns a value in `[0, n)` by masked rejection sampling.
///
/// The mask covers every bit up to the highest set bit of `n - 1`, so it is
/// below `2 * n` and each draw is accepted with probability at least 1/2.
fn uniform_below<S: RandomSource>(source: &mut S, n: u64) -> u64 {
    debug_assert!(n != 0);
    let mut bits = n - 1;
    bits |= bits >> 1;
    bits |= bits >> 2;
    bits |= bits >> 4;
    bits |= bits >> 8;
    bits |= bits >> 16;
    bits |= bits >> 32;
    loop {
        let candidate = source.next_u64() & bits;
        if candidate < n {
            return candidate;
        }
    }
}

/// Deterministic generator.
///
/// `Clone` snapshots the state: the copy and the original produce the same
/// future sequence and then evolve independently.
#[derive(Clone, Debug)]
pub struct Generator {
    rng: ChaCha20Rng,
}

impl Generator {
    pub fn new(seed: &Seed) -> Self {
        let rng = match seed {
            Seed::Compact(bytes) => ChaCha20Rng::seed_from_u64(u64::from_le_bytes(*bytes)),
            Seed::Full(bytes) => ChaCha20Rng::from_seed(*bytes),
        };
        Generator { rng }
    }
}

impl RandomSource for Generator {
    fn next_u64(&mut self) -> u64 {
        self.rng.next_u64()
    }
}
