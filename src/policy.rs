//! Retry policy configuration and the retry decision.

use std::time::Duration;

use crate::error::ConfigError;
use crate::jitter::{Jitter, SeedSource};
use crate::kind::{Classify, ErrorKind};

/// A retry policy describing whether and when to re-invoke a failed
/// operation.
///
/// Policies are pure data - they describe retry behavior but don't execute
/// it. A policy is immutable after construction and may be shared across any
/// number of concurrent invocations without locking.
///
/// # Defaults
///
/// [`RetryPolicy::new`] starts from the conventions of exponential activity
/// retry: coefficient `2.0`, full jitter enabled, entropy-backed seeds, and
/// no bounds. Unset bounds mean "unbounded" - a policy with neither
/// `maximum_attempts` nor `expiration_interval` retries until the caller
/// cancels.
///
/// # Examples
///
/// ```rust
/// use resurge::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::new(Duration::from_secs(1))
///     .with_maximum_interval(Duration::from_secs(30))
///     .with_maximum_attempts(5);
///
/// assert_eq!(policy.maximum_attempts(), Some(5));
/// assert!(policy.validate().is_ok());
/// ```
///
/// Restricting retryability by error kind:
///
/// ```rust
/// use resurge::RetryPolicy;
/// use std::time::Duration;
///
/// // Retry anything under "net", but never validation errors.
/// let policy = RetryPolicy::new(Duration::from_millis(100))
///     .retry_on("net")
///     .give_up_on("validation")
///     .with_maximum_attempts(5);
/// ```
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    initial_interval: Duration,
    backoff_coefficient: f64,
    maximum_interval: Option<Duration>,
    maximum_attempts: Option<u32>,
    expiration_interval: Option<Duration>,
    retryable: Vec<ErrorKind>,
    non_retryable: Vec<ErrorKind>,
    jitter: Option<Jitter>,
    seed_source: SeedSource,
}

impl RetryPolicy {
    /// Create a policy with the given initial interval.
    ///
    /// The initial interval is the one required field: it seeds the backoff
    /// progression. Everything else defaults as described on the type.
    pub fn new(initial_interval: Duration) -> Self {
        Self {
            initial_interval,
            backoff_coefficient: 2.0,
            maximum_interval: None,
            maximum_attempts: None,
            expiration_interval: None,
            retryable: Vec::new(),
            non_retryable: Vec::new(),
            jitter: Some(Jitter::full()),
            seed_source: SeedSource::Entropy,
        }
    }

    /// Set the multiplicative growth factor applied after each failure.
    ///
    /// Must be at least 1.0; validation reports smaller values.
    pub fn with_backoff_coefficient(mut self, coefficient: f64) -> Self {
        self.backoff_coefficient = coefficient;
        self
    }

    /// Cap computed delays at `interval`, regardless of backoff growth.
    pub fn with_maximum_interval(mut self, interval: Duration) -> Self {
        self.maximum_interval = Some(interval);
        self
    }

    /// Give up after `attempts` total attempts.
    ///
    /// Exactly `attempts` attempts are made before
    /// [`GiveUpReason::MaxAttemptsExceeded`]; never one more.
    pub fn with_maximum_attempts(mut self, attempts: u32) -> Self {
        self.maximum_attempts = Some(attempts);
        self
    }

    /// Give up once the time since the first attempt reaches `interval`.
    pub fn with_expiration_interval(mut self, interval: Duration) -> Self {
        self.expiration_interval = Some(interval);
        self
    }

    /// Only retry errors matching `kind` (or a descendant of it).
    ///
    /// May be called repeatedly to build up the set. An empty set means
    /// "retry all" - restricting starts with the first call.
    pub fn retry_on(mut self, kind: impl Into<ErrorKind>) -> Self {
        self.retryable.push(kind.into());
        self
    }

    /// Never retry errors matching `kind` (or a descendant of it).
    ///
    /// Exclusions take precedence over [`retry_on`](Self::retry_on) entries.
    pub fn give_up_on(mut self, kind: impl Into<ErrorKind>) -> Self {
        self.non_retryable.push(kind.into());
        self
    }

    /// Replace the jitter applied to computed delays.
    pub fn with_jitter(mut self, jitter: Jitter) -> Self {
        self.jitter = Some(jitter);
        self
    }

    /// Disable jitter; delays become the exact backoff values.
    pub fn no_jitter(mut self) -> Self {
        self.jitter = None;
        self
    }

    /// Set where per-invocation seeds come from.
    ///
    /// [`SeedSource::Fixed`] makes an invocation's delays reproducible.
    pub fn with_seed_source(mut self, source: SeedSource) -> Self {
        self.seed_source = source;
        self
    }

    /// The initial delay interval.
    pub fn initial_interval(&self) -> Duration {
        self.initial_interval
    }

    /// The multiplicative growth factor.
    pub fn backoff_coefficient(&self) -> f64 {
        self.backoff_coefficient
    }

    /// The delay cap, if set.
    pub fn maximum_interval(&self) -> Option<Duration> {
        self.maximum_interval
    }

    /// The attempt bound, if set.
    pub fn maximum_attempts(&self) -> Option<u32> {
        self.maximum_attempts
    }

    /// The overall deadline, if set.
    pub fn expiration_interval(&self) -> Option<Duration> {
        self.expiration_interval
    }

    /// Kinds that are retryable. Empty means "retry all".
    pub fn retryable(&self) -> &[ErrorKind] {
        &self.retryable
    }

    /// Kinds that are never retried.
    pub fn non_retryable(&self) -> &[ErrorKind] {
        &self.non_retryable
    }

    /// The configured jitter, if enabled.
    pub fn jitter(&self) -> Option<&Jitter> {
        self.jitter.as_ref()
    }

    /// The per-invocation seed source.
    pub fn seed_source(&self) -> SeedSource {
        self.seed_source
    }

    /// Check the policy's numeric invariants.
    ///
    /// The invoker runs this before the first attempt; violations fail fast
    /// as [`ConfigError`] and are never silently clamped.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use resurge::{ConfigError, RetryPolicy};
    /// use std::time::Duration;
    ///
    /// let policy = RetryPolicy::new(Duration::ZERO);
    /// assert_eq!(policy.validate(), Err(ConfigError::ZeroInitialInterval));
    ///
    /// let policy = RetryPolicy::new(Duration::from_secs(1)).with_backoff_coefficient(0.5);
    /// assert!(policy.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_interval.is_zero() {
            return Err(ConfigError::ZeroInitialInterval);
        }
        // NaN fails this comparison too.
        if !(self.backoff_coefficient >= 1.0) {
            return Err(ConfigError::CoefficientBelowOne {
                coefficient: self.backoff_coefficient,
            });
        }
        if self.maximum_attempts == Some(0) {
            return Err(ConfigError::ZeroMaximumAttempts);
        }
        Ok(())
    }

    /// Decide whether to retry after a failed attempt.
    ///
    /// A pure function of its inputs: identical records and seeds yield
    /// identical decisions. The checks run in a fixed order -
    /// non-retryable exclusion first, then the retryable set, then the
    /// attempt bound, then the deadline - so an explicitly excluded error
    /// short-circuits on attempt 1 regardless of `maximum_attempts`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use resurge::{AttemptRecord, Classify, ErrorKind, GiveUpReason, RetryDecision, RetryPolicy};
    /// use std::time::Duration;
    ///
    /// #[derive(Debug)]
    /// struct Timeout;
    /// impl Classify for Timeout {
    ///     fn kind(&self) -> ErrorKind {
    ///         ErrorKind::from_static("net.timeout")
    ///     }
    /// }
    ///
    /// let policy = RetryPolicy::new(Duration::from_secs(1))
    ///     .with_maximum_attempts(3)
    ///     .no_jitter();
    ///
    /// let record = AttemptRecord {
    ///     attempt: 1,
    ///     error: &Timeout,
    ///     elapsed: Duration::from_millis(20),
    /// };
    ///
    /// assert_eq!(
    ///     policy.decide(&record, 0).unwrap(),
    ///     RetryDecision::Retry { delay: Duration::from_secs(1) },
    /// );
    ///
    /// let record = AttemptRecord { attempt: 3, ..record };
    /// assert_eq!(
    ///     policy.decide(&record, 0).unwrap(),
    ///     RetryDecision::GiveUp { reason: GiveUpReason::MaxAttemptsExceeded },
    /// );
    /// ```
    pub fn decide<E: Classify>(
        &self,
        record: &AttemptRecord<'_, E>,
        seed: u64,
    ) -> Result<RetryDecision, ConfigError> {
        let kind = record.error.kind();

        if self.non_retryable.iter().any(|entry| kind.is_a(entry)) {
            return Ok(RetryDecision::GiveUp {
                reason: GiveUpReason::NonRetryable,
            });
        }
        if !self.retryable.is_empty() && !self.retryable.iter().any(|entry| kind.is_a(entry)) {
            return Ok(RetryDecision::GiveUp {
                reason: GiveUpReason::NonRetryable,
            });
        }
        if let Some(max) = self.maximum_attempts {
            if record.attempt >= max {
                return Ok(RetryDecision::GiveUp {
                    reason: GiveUpReason::MaxAttemptsExceeded,
                });
            }
        }
        if let Some(expiration) = self.expiration_interval {
            if record.elapsed >= expiration {
                return Ok(RetryDecision::GiveUp {
                    reason: GiveUpReason::ExpirationExceeded,
                });
            }
        }

        let delay = self.delay_with_jitter(record.attempt, seed)?;
        Ok(RetryDecision::Retry { delay })
    }
}

/// A single failed attempt, passed to [`RetryPolicy::decide`].
///
/// Created fresh per attempt and discarded after the decision is made; it is
/// never persisted.
#[derive(Debug, Clone, Copy)]
pub struct AttemptRecord<'a, E> {
    /// Which attempt just failed (1-indexed).
    pub attempt: u32,
    /// The error observed on that attempt.
    pub error: &'a E,
    /// Total elapsed time since the first attempt began.
    pub elapsed: Duration,
}

/// The outcome of a retry decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Re-invoke the operation after waiting `delay`.
    Retry {
        /// How long to wait before the next attempt.
        delay: Duration,
    },
    /// Stop; surface a terminal failure with `reason`.
    GiveUp {
        /// Why no further retry will occur.
        reason: GiveUpReason,
    },
}

/// The terminal cause recorded when no further retry will occur.
///
/// Informational tags on a terminal [`Failure`](crate::Failure), not errors
/// in their own right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GiveUpReason {
    /// The configured attempt bound was reached.
    MaxAttemptsExceeded,
    /// The error's kind was excluded, or matched no retryable entry.
    NonRetryable,
    /// The caller raised the cancellation signal.
    CancelledByCaller,
    /// The time since the first attempt reached the expiration interval.
    ExpirationExceeded,
}

impl std::fmt::Display for GiveUpReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            GiveUpReason::MaxAttemptsExceeded => "maximum attempts exceeded",
            GiveUpReason::NonRetryable => "non-retryable error",
            GiveUpReason::CancelledByCaller => "cancelled by caller",
            GiveUpReason::ExpirationExceeded => "expiration interval exceeded",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct TestError(ErrorKind);

    impl Classify for TestError {
        fn kind(&self) -> ErrorKind {
            self.0.clone()
        }
    }

    fn record(error: &TestError, attempt: u32) -> AttemptRecord<'_, TestError> {
        AttemptRecord {
            attempt,
            error,
            elapsed: Duration::from_millis(10),
        }
    }

    #[test]
    fn test_defaults() {
        let policy = RetryPolicy::new(Duration::from_secs(1));
        assert_eq!(policy.backoff_coefficient(), 2.0);
        assert!(policy.jitter().is_some());
        assert_eq!(policy.seed_source(), SeedSource::Entropy);
        assert!(policy.maximum_attempts().is_none());
        assert!(policy.maximum_interval().is_none());
        assert!(policy.retryable().is_empty());
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let policy = RetryPolicy::new(Duration::ZERO);
        assert_eq!(policy.validate(), Err(ConfigError::ZeroInitialInterval));
    }

    #[test]
    fn test_validate_rejects_small_coefficient() {
        let policy = RetryPolicy::new(Duration::from_secs(1)).with_backoff_coefficient(0.9);
        assert_eq!(
            policy.validate(),
            Err(ConfigError::CoefficientBelowOne { coefficient: 0.9 })
        );
    }

    #[test]
    fn test_validate_rejects_nan_coefficient() {
        let policy = RetryPolicy::new(Duration::from_secs(1)).with_backoff_coefficient(f64::NAN);
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_max_attempts() {
        let policy = RetryPolicy::new(Duration::from_secs(1)).with_maximum_attempts(0);
        assert_eq!(policy.validate(), Err(ConfigError::ZeroMaximumAttempts));
    }

    #[test]
    fn test_validate_accepts_coefficient_one() {
        let policy = RetryPolicy::new(Duration::from_secs(1)).with_backoff_coefficient(1.0);
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn test_empty_retryable_means_retry_all() {
        let policy = RetryPolicy::new(Duration::from_secs(1)).no_jitter();
        let error = TestError(ErrorKind::from_static("anything.at.all"));
        let decision = policy.decide(&record(&error, 1), 0).unwrap();
        assert!(matches!(decision, RetryDecision::Retry { .. }));
    }

    #[test]
    fn test_non_retryable_takes_precedence() {
        // Listed as retryable AND non-retryable: exclusion wins, on attempt 1,
        // regardless of the attempt bound.
        let policy = RetryPolicy::new(Duration::from_secs(1))
            .retry_on("validation")
            .give_up_on("validation")
            .with_maximum_attempts(10)
            .no_jitter();
        let error = TestError(ErrorKind::from_static("validation"));
        assert_eq!(
            policy.decide(&record(&error, 1), 0).unwrap(),
            RetryDecision::GiveUp {
                reason: GiveUpReason::NonRetryable
            }
        );
    }

    #[test]
    fn test_unlisted_kind_is_not_retried() {
        let policy = RetryPolicy::new(Duration::from_secs(1))
            .retry_on("net")
            .no_jitter();
        let error = TestError(ErrorKind::from_static("db.conn"));
        assert_eq!(
            policy.decide(&record(&error, 1), 0).unwrap(),
            RetryDecision::GiveUp {
                reason: GiveUpReason::NonRetryable
            }
        );
    }

    #[test]
    fn test_hierarchical_match_in_retryable_set() {
        let policy = RetryPolicy::new(Duration::from_secs(1))
            .retry_on("net")
            .no_jitter();
        let error = TestError(ErrorKind::from_static("net.timeout"));
        assert!(matches!(
            policy.decide(&record(&error, 1), 0).unwrap(),
            RetryDecision::Retry { .. }
        ));
    }

    #[test]
    fn test_hierarchical_match_in_exclusions() {
        let policy = RetryPolicy::new(Duration::from_secs(1))
            .give_up_on("net")
            .no_jitter();
        let error = TestError(ErrorKind::from_static("net.timeout"));
        assert_eq!(
            policy.decide(&record(&error, 1), 0).unwrap(),
            RetryDecision::GiveUp {
                reason: GiveUpReason::NonRetryable
            }
        );
    }

    #[test]
    fn test_child_entry_does_not_capture_parent_error() {
        // A policy retrying only "net.timeout" must not retry a bare "net".
        let policy = RetryPolicy::new(Duration::from_secs(1))
            .retry_on("net.timeout")
            .no_jitter();
        let error = TestError(ErrorKind::from_static("net"));
        assert_eq!(
            policy.decide(&record(&error, 1), 0).unwrap(),
            RetryDecision::GiveUp {
                reason: GiveUpReason::NonRetryable
            }
        );
    }

    #[test]
    fn test_attempt_bound() {
        let policy = RetryPolicy::new(Duration::from_secs(1))
            .with_maximum_attempts(3)
            .no_jitter();
        let error = TestError(ErrorKind::from_static("net"));

        assert!(matches!(
            policy.decide(&record(&error, 2), 0).unwrap(),
            RetryDecision::Retry { .. }
        ));
        assert_eq!(
            policy.decide(&record(&error, 3), 0).unwrap(),
            RetryDecision::GiveUp {
                reason: GiveUpReason::MaxAttemptsExceeded
            }
        );
        assert_eq!(
            policy.decide(&record(&error, 4), 0).unwrap(),
            RetryDecision::GiveUp {
                reason: GiveUpReason::MaxAttemptsExceeded
            }
        );
    }

    #[test]
    fn test_expiration_bound() {
        let policy = RetryPolicy::new(Duration::from_secs(1))
            .with_expiration_interval(Duration::from_secs(30))
            .no_jitter();
        let error = TestError(ErrorKind::from_static("net"));

        let young = AttemptRecord {
            attempt: 2,
            error: &error,
            elapsed: Duration::from_secs(29),
        };
        assert!(matches!(
            policy.decide(&young, 0).unwrap(),
            RetryDecision::Retry { .. }
        ));

        let expired = AttemptRecord {
            attempt: 2,
            error: &error,
            elapsed: Duration::from_secs(30),
        };
        assert_eq!(
            policy.decide(&expired, 0).unwrap(),
            RetryDecision::GiveUp {
                reason: GiveUpReason::ExpirationExceeded
            }
        );
    }

    #[test]
    fn test_retry_delays_follow_backoff() {
        let policy = RetryPolicy::new(Duration::from_secs(1))
            .with_maximum_attempts(5)
            .no_jitter();
        let error = TestError(ErrorKind::from_static("net"));

        let expected = [1u64, 2, 4, 8];
        for (attempt, secs) in (1u32..=4).zip(expected) {
            assert_eq!(
                policy.decide(&record(&error, attempt), 0).unwrap(),
                RetryDecision::Retry {
                    delay: Duration::from_secs(secs)
                },
                "attempt {}",
                attempt
            );
        }
    }

    #[test]
    fn test_decide_is_idempotent() {
        let policy = RetryPolicy::new(Duration::from_millis(100)).with_maximum_attempts(5);
        let error = TestError(ErrorKind::from_static("net"));
        let rec = record(&error, 2);
        assert_eq!(
            policy.decide(&rec, 777).unwrap(),
            policy.decide(&rec, 777).unwrap()
        );
    }

    #[test]
    fn test_policy_is_clone_and_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RetryPolicy>();

        let policy = RetryPolicy::new(Duration::from_secs(1)).with_maximum_attempts(3);
        let cloned = policy.clone();
        assert_eq!(cloned.maximum_attempts(), Some(3));
    }

    #[test]
    fn test_give_up_reason_display() {
        assert_eq!(
            GiveUpReason::MaxAttemptsExceeded.to_string(),
            "maximum attempts exceeded"
        );
        assert_eq!(
            GiveUpReason::CancelledByCaller.to_string(),
            "cancelled by caller"
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_give_up_reason_serde_round_trip() {
        let json = serde_json::to_string(&GiveUpReason::NonRetryable).unwrap();
        let back: GiveUpReason = serde_json::from_str(&json).unwrap();
        assert_eq!(back, GiveUpReason::NonRetryable);
    }
}
