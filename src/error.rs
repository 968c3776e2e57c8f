//! Error types for policy configuration and terminal failures.

use std::fmt;
use std::time::Duration;

use crate::kind::{Classify, ErrorKind};
use crate::policy::GiveUpReason;

/// Invalid retry policy configuration.
///
/// Configuration errors indicate a programming error, not a transient
/// condition: they fail fast, are never retried, and are never silently
/// clamped. Numeric bounds are checked by [`RetryPolicy::validate`]
/// (which the invoker runs before the first attempt); a misbehaving jitter
/// function is caught at the first delay computation.
///
/// [`RetryPolicy::validate`]: crate::RetryPolicy::validate
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// `initial_interval` must be greater than zero.
    ZeroInitialInterval,
    /// `backoff_coefficient` must be at least 1.0.
    CoefficientBelowOne {
        /// The offending coefficient.
        coefficient: f64,
    },
    /// `maximum_attempts`, when set, must be at least 1.
    ZeroMaximumAttempts,
    /// The jitter function returned a value outside `[0, bound)`.
    JitterOutOfRange {
        /// The value the jitter function returned.
        produced: Duration,
        /// The exclusive upper bound it was given.
        bound: Duration,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroInitialInterval => {
                write!(f, "initial interval must be greater than zero")
            }
            ConfigError::CoefficientBelowOne { coefficient } => {
                write!(f, "backoff coefficient {} is below 1.0", coefficient)
            }
            ConfigError::ZeroMaximumAttempts => {
                write!(f, "maximum attempts must be at least 1")
            }
            ConfigError::JitterOutOfRange { produced, bound } => {
                write!(
                    f,
                    "jitter function returned {:?}, outside [0, {:?})",
                    produced, bound
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Terminal failure returned when the engine gives up on an operation.
///
/// Carries the last observed error, the number of attempts made, the reason
/// no further retry will occur, and the total time spent — enough for the
/// caller to render an audit trail without the engine logging anything.
///
/// # Examples
///
/// ```rust
/// use resurge::{invoke, Classify, ErrorKind, GiveUpReason, RetryPolicy};
/// use std::time::Duration;
/// use tokio_util::sync::CancellationToken;
///
/// #[derive(Debug)]
/// struct Unreachable;
/// impl Classify for Unreachable {
///     fn kind(&self) -> ErrorKind {
///         ErrorKind::from_static("net")
///     }
/// }
///
/// # tokio_test::block_on(async {
/// let policy = RetryPolicy::new(Duration::from_millis(1))
///     .with_maximum_attempts(3)
///     .no_jitter();
///
/// let result: Result<(), _> =
///     invoke(&policy, || async { Err(Unreachable) }, CancellationToken::new()).await;
///
/// let failure = result.unwrap_err().into_failure().unwrap();
/// assert_eq!(failure.attempts, 3);
/// assert_eq!(failure.reason, GiveUpReason::MaxAttemptsExceeded);
/// # });
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure<E> {
    /// The error from the final attempt.
    pub error: E,
    /// Total number of attempts made.
    pub attempts: u32,
    /// Why no further retry will occur.
    pub reason: GiveUpReason,
    /// Total time elapsed since the first attempt began.
    pub elapsed: Duration,
}

impl<E> Failure<E> {
    /// Create a new terminal failure.
    pub fn new(error: E, attempts: u32, reason: GiveUpReason, elapsed: Duration) -> Self {
        Self {
            error,
            attempts,
            reason,
            elapsed,
        }
    }

    /// Extract the final error, discarding metadata.
    pub fn into_error(self) -> E {
        self.error
    }

    /// A reference to the final error.
    pub fn error(&self) -> &E {
        &self.error
    }
}

impl<E: fmt::Display> fmt::Display for Failure<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "gave up after {} attempts in {:?} ({}): {}",
            self.attempts, self.elapsed, self.reason, self.error
        )
    }
}

impl<E: std::error::Error + 'static> std::error::Error for Failure<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Error surface of [`invoke`](crate::invoke()).
///
/// The coordinator sees one of two terminal shapes: a [`Failure`] carrying
/// the audit trail, or a fast-failed [`ConfigError`] raised before the first
/// attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum InvokeError<E> {
    /// The engine gave up after one or more attempts.
    GaveUp(Failure<E>),
    /// The policy was invalid; no attempt was consulted for this result.
    Config(ConfigError),
}

impl<E> InvokeError<E> {
    /// The terminal failure, if the engine gave up.
    pub fn failure(&self) -> Option<&Failure<E>> {
        match self {
            InvokeError::GaveUp(failure) => Some(failure),
            InvokeError::Config(_) => None,
        }
    }

    /// Extract the terminal failure, if the engine gave up.
    pub fn into_failure(self) -> Option<Failure<E>> {
        match self {
            InvokeError::GaveUp(failure) => Some(failure),
            InvokeError::Config(_) => None,
        }
    }

    /// Whether this is a fast-failed configuration error.
    pub fn is_config(&self) -> bool {
        matches!(self, InvokeError::Config(_))
    }
}

impl<E> From<ConfigError> for InvokeError<E> {
    fn from(error: ConfigError) -> Self {
        InvokeError::Config(error)
    }
}

impl<E: fmt::Display> fmt::Display for InvokeError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvokeError::GaveUp(failure) => failure.fmt(f),
            InvokeError::Config(error) => error.fmt(f),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for InvokeError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InvokeError::GaveUp(failure) => Some(&failure.error),
            InvokeError::Config(error) => Some(error),
        }
    }
}

/// Error returned when a single attempt times out.
///
/// Wraps either the elapsed timeout or an inner error from the attempt.
/// Classified as the `"timeout"` kind so policies can opt in or out of
/// retrying timed-out attempts.
///
/// # Examples
///
/// ```rust
/// use resurge::{with_timeout, TimeoutError};
/// use std::time::Duration;
///
/// # tokio_test::block_on(async {
/// let result: Result<u32, TimeoutError<String>> = with_timeout(
///     async {
///         tokio::time::sleep(Duration::from_secs(10)).await;
///         Ok(42)
///     },
///     Duration::from_millis(10),
/// )
/// .await;
///
/// match result {
///     Err(TimeoutError::Timeout { duration }) => {
///         assert_eq!(duration, Duration::from_millis(10));
///     }
///     _ => panic!("expected timeout"),
/// }
/// # });
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeoutError<E> {
    /// The attempt did not settle within the duration.
    Timeout {
        /// The timeout duration that was exceeded.
        duration: Duration,
    },
    /// The attempt failed before the timeout.
    Inner(E),
}

impl<E> TimeoutError<E> {
    /// Whether this is a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, TimeoutError::Timeout { .. })
    }

    /// The inner error, if the attempt failed before the timeout.
    pub fn into_inner(self) -> Option<E> {
        match self {
            TimeoutError::Inner(error) => Some(error),
            TimeoutError::Timeout { .. } => None,
        }
    }
}

impl<E: Classify> Classify for TimeoutError<E> {
    fn kind(&self) -> ErrorKind {
        match self {
            TimeoutError::Timeout { .. } => ErrorKind::from_static("timeout"),
            TimeoutError::Inner(error) => error.kind(),
        }
    }
}

impl<E: fmt::Display> fmt::Display for TimeoutError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeoutError::Timeout { duration } => {
                write!(f, "attempt timed out after {:?}", duration)
            }
            TimeoutError::Inner(error) => error.fmt(f),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for TimeoutError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TimeoutError::Timeout { .. } => None,
            TimeoutError::Inner(error) => Some(error),
        }
    }
}
