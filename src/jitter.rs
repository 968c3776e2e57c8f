//! Seeded jitter for retry delays.
//!
//! Jitter desynchronizes contending callers by perturbing computed delays.
//! Every jitter function here is a pure `fn(seed, max) -> value` with the
//! contract `0 <= value < max`: the engine derives a fresh seed per attempt
//! from per-invocation entropy, so identical inputs always produce identical
//! delays while distinct invocations spread out.

use std::fmt;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A pure jitter function: maps a seed and an exclusive upper bound to a
/// delay in `[0, max)`.
///
/// Returning a value at or above `max` is a configuration error, surfaced
/// by the engine at the first delay computation.
pub type JitterFn = fn(seed: u64, max: Duration) -> Duration;

/// Jitter applied to computed backoff delays.
///
/// Wraps a [`JitterFn`]; construct with [`Jitter::full`], [`Jitter::equal`],
/// or [`Jitter::with_fn`] for a custom function.
///
/// # Examples
///
/// ```rust
/// use resurge::Jitter;
/// use std::time::Duration;
///
/// let jitter = Jitter::full();
/// let delay = jitter.apply(7, Duration::from_secs(1));
/// assert!(delay < Duration::from_secs(1));
///
/// // Same seed, same bound: same delay.
/// assert_eq!(delay, jitter.apply(7, Duration::from_secs(1)));
/// ```
#[derive(Clone, Copy)]
pub struct Jitter {
    function: JitterFn,
}

impl Jitter {
    /// Full jitter: uniform in `[0, max)`. The most aggressive spread.
    pub fn full() -> Self {
        Self {
            function: full_jitter,
        }
    }

    /// Equal jitter: `max/2` plus uniform in `[0, max/2)`. Preserves most of
    /// the backoff while still spreading callers.
    pub fn equal() -> Self {
        Self {
            function: equal_jitter,
        }
    }

    /// A custom jitter function. The function must honor the `[0, max)`
    /// contract; violations are reported as configuration errors.
    pub fn with_fn(function: JitterFn) -> Self {
        Self { function }
    }

    /// Apply the jitter function to a bound.
    pub fn apply(&self, seed: u64, max: Duration) -> Duration {
        (self.function)(seed, max)
    }
}

impl fmt::Debug for Jitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Jitter").finish_non_exhaustive()
    }
}

/// Source of the per-invocation random seed.
///
/// Each call to the invoker draws one seed; per-attempt seeds are derived
/// from it deterministically. A fixed seed makes a whole invocation's delays
/// reproducible.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeedSource {
    /// Fresh entropy per invocation (the default).
    Entropy,
    /// A fixed seed, for reproducible delays in tests.
    Fixed(u64),
}

impl Default for SeedSource {
    fn default() -> Self {
        SeedSource::Entropy
    }
}

impl SeedSource {
    /// Draw the seed for one invocation.
    pub fn draw(&self) -> u64 {
        match self {
            SeedSource::Entropy => rand::random(),
            SeedSource::Fixed(seed) => *seed,
        }
    }
}

/// Uniform jitter in `[0, max)`.
///
/// Seeded, so the result is a pure function of `(seed, max)`.
pub fn full_jitter(seed: u64, max: Duration) -> Duration {
    let bound = saturating_nanos(max);
    if bound == 0 {
        return Duration::ZERO;
    }
    let mut rng = StdRng::seed_from_u64(seed);
    Duration::from_nanos(rng.random_range(0..bound))
}

/// `max/2` plus uniform jitter in `[0, max/2)`.
///
/// Keeps at least half of the computed backoff, trading spread for
/// progression.
pub fn equal_jitter(seed: u64, max: Duration) -> Duration {
    let bound = saturating_nanos(max);
    if bound == 0 {
        return Duration::ZERO;
    }
    let half = bound / 2;
    if half == 0 {
        return Duration::ZERO;
    }
    let mut rng = StdRng::seed_from_u64(seed);
    Duration::from_nanos(half + rng.random_range(0..half))
}

/// Derives the jitter seed for one attempt from the invocation seed.
///
/// Splitmix-style mixing: consecutive attempts map to well-separated seeds,
/// and distinct invocation seeds never synchronize.
pub(crate) fn attempt_seed(invocation_seed: u64, attempt: u32) -> u64 {
    let mut z =
        invocation_seed.wrapping_add((attempt as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn saturating_nanos(d: Duration) -> u64 {
    d.as_nanos().min(u64::MAX as u128) as u64
}
