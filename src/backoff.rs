//! Backoff delay computation.
//!
//! The base delay following failed attempt `n` (1-based) is
//! `initial_interval * backoff_coefficient^(n - 1)`, capped at the policy's
//! maximum interval. Exponentiation runs in `f64`; overflow and non-finite
//! results saturate to the cap rather than wrapping or going negative.
//! Jitter applies to the capped base and never feeds back into later
//! attempts, so delays cannot drift downward over time.

use std::time::Duration;

use crate::error::ConfigError;
use crate::jitter;
use crate::policy::RetryPolicy;

impl RetryPolicy {
    /// The base delay following failed attempt `attempt` (1-based), without
    /// jitter.
    ///
    /// Pure and deterministic. Saturates to the maximum interval (or
    /// `Duration::MAX` when unbounded) when exponentiation overflows.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use resurge::RetryPolicy;
    /// use std::time::Duration;
    ///
    /// let policy = RetryPolicy::new(Duration::from_secs(1))
    ///     .with_maximum_interval(Duration::from_secs(6));
    ///
    /// assert_eq!(policy.delay_for_attempt(1), Duration::from_secs(1));
    /// assert_eq!(policy.delay_for_attempt(2), Duration::from_secs(2));
    /// assert_eq!(policy.delay_for_attempt(3), Duration::from_secs(4));
    /// assert_eq!(policy.delay_for_attempt(4), Duration::from_secs(6)); // capped
    /// assert_eq!(policy.delay_for_attempt(100), Duration::from_secs(6));
    /// ```
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let cap = self.maximum_interval().unwrap_or(Duration::MAX);
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let secs =
            self.initial_interval().as_secs_f64() * self.backoff_coefficient().powi(exponent);

        if !secs.is_finite() || secs < 0.0 || secs >= cap.as_secs_f64() {
            cap
        } else {
            Duration::from_secs_f64(secs)
        }
    }

    /// The delay following failed attempt `attempt`, with the policy's
    /// jitter applied.
    ///
    /// The jitter seed is derived from `invocation_seed` and the attempt
    /// number, so the result is a pure function of its inputs. A jitter
    /// function returning a value outside `[0, base)` is reported as
    /// [`ConfigError::JitterOutOfRange`], never clamped.
    pub fn delay_with_jitter(
        &self,
        attempt: u32,
        invocation_seed: u64,
    ) -> Result<Duration, ConfigError> {
        let base = self.delay_for_attempt(attempt);
        let jitter = match self.jitter() {
            Some(jitter) => jitter,
            None => return Ok(base),
        };
        if base.is_zero() {
            // [0, 0) is unsatisfiable; a zero base stays zero.
            return Ok(base);
        }

        let seed = jitter::attempt_seed(invocation_seed, attempt);
        let produced = jitter.apply(seed, base);
        if produced >= base {
            return Err(ConfigError::JitterOutOfRange {
                produced,
                bound: base,
            });
        }
        Ok(produced)
    }
}
