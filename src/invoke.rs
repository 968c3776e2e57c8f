//! Driving an operation to completion under a retry policy.
//!
//! The invoker owns one invocation's state - attempt counter, elapsed clock,
//! per-invocation jitter seed - and nothing else. Policies are read-only and
//! shared; concurrent invocations never interact. Waits between attempts are
//! cancellable timers, never busy-sleeps.
//!
//! The operation is a factory: each attempt creates a fresh future. Effects
//! of remote calls should be recreated from scratch (fresh connections, new
//! request ids) rather than cloned, and a consumed future cannot be polled
//! again anyway.

use std::future::Future;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{Failure, InvokeError, TimeoutError};
use crate::kind::Classify;
use crate::policy::{AttemptRecord, GiveUpReason, RetryDecision, RetryPolicy};

/// Outcome of a single invocation: the operation's value, or a terminal
/// failure carrying the last error, the attempt count, and the give-up
/// reason.
pub type InvocationResult<T, E> = Result<T, InvokeError<E>>;

/// Information about a failed attempt, passed to the hook of
/// [`invoke_with_hooks`].
#[derive(Debug)]
pub struct AttemptEvent<'a, E> {
    /// Which attempt just failed (1-indexed).
    pub attempt: u32,
    /// The error from the failed attempt.
    pub error: &'a E,
    /// Delay before the next attempt, or `None` when giving up.
    pub next_delay: Option<Duration>,
    /// Total elapsed time since the first attempt began.
    pub elapsed: Duration,
}

/// Invoke `operation` repeatedly under `policy` until it succeeds, the
/// policy gives up, or `cancel` fires.
///
/// Attempts are strictly sequential: attempt `n + 1` is never issued before
/// attempt `n` has settled and its delay has elapsed. An in-flight attempt
/// is always awaited to settlement - cancellation never abandons it; a
/// success that settles after cancellation is still returned (results are
/// reported exactly once, never discarded). Cancellation during the wait
/// between attempts short-circuits to a terminal failure carrying the last
/// error.
///
/// The policy is validated before the first attempt; an invalid policy
/// fails fast as [`InvokeError::Config`] without invoking the operation.
///
/// # Examples
///
/// ```rust
/// use resurge::{invoke, Classify, ErrorKind, RetryPolicy};
/// use std::cell::Cell;
/// use std::time::Duration;
/// use tokio_util::sync::CancellationToken;
///
/// #[derive(Debug)]
/// struct Flaky;
/// impl Classify for Flaky {
///     fn kind(&self) -> ErrorKind {
///         ErrorKind::from_static("net.timeout")
///     }
/// }
///
/// # tokio_test::block_on(async {
/// let policy = RetryPolicy::new(Duration::from_millis(1))
///     .with_maximum_attempts(5)
///     .no_jitter();
///
/// let calls = Cell::new(0u32);
/// let result = invoke(
///     &policy,
///     || {
///         let n = calls.get();
///         calls.set(n + 1);
///         async move {
///             if n < 2 {
///                 Err(Flaky)
///             } else {
///                 Ok("connected")
///             }
///         }
///     },
///     CancellationToken::new(),
/// )
/// .await;
///
/// assert_eq!(result.unwrap(), "connected");
/// assert_eq!(calls.get(), 3);
/// # });
/// ```
pub async fn invoke<T, E, F, Fut>(
    policy: &RetryPolicy,
    operation: F,
    cancel: CancellationToken,
) -> InvocationResult<T, E>
where
    E: Classify,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    invoke_with_hooks(policy, operation, cancel, |_| {}).await
}

/// Like [`invoke`], with a synchronous hook observing each failed attempt.
///
/// The hook runs after the retry decision and before any wait, receiving
/// the attempt number, the error, the upcoming delay (or `None` when giving
/// up), and the elapsed time. It should not block; use it for logging or
/// metrics.
///
/// # Examples
///
/// ```rust
/// use resurge::{invoke_with_hooks, AttemptEvent, Classify, ErrorKind, RetryPolicy};
/// use std::cell::Cell;
/// use std::time::Duration;
/// use tokio_util::sync::CancellationToken;
///
/// #[derive(Debug)]
/// struct Busy;
/// impl Classify for Busy {
///     fn kind(&self) -> ErrorKind {
///         ErrorKind::from_static("service.busy")
///     }
/// }
///
/// # tokio_test::block_on(async {
/// let policy = RetryPolicy::new(Duration::from_millis(1))
///     .with_maximum_attempts(2)
///     .no_jitter();
///
/// let observed = Cell::new(0u32);
/// let result: Result<(), _> = invoke_with_hooks(
///     &policy,
///     || async { Err(Busy) },
///     CancellationToken::new(),
///     |event: &AttemptEvent<'_, Busy>| {
///         observed.set(observed.get() + 1);
///         assert_eq!(event.attempt, observed.get());
///     },
/// )
/// .await;
///
/// assert!(result.is_err());
/// assert_eq!(observed.get(), 2); // one per failed attempt
/// # });
/// ```
pub async fn invoke_with_hooks<T, E, F, Fut, H>(
    policy: &RetryPolicy,
    mut operation: F,
    cancel: CancellationToken,
    on_attempt: H,
) -> InvocationResult<T, E>
where
    E: Classify,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    H: Fn(&AttemptEvent<'_, E>),
{
    policy.validate()?;
    let invocation_seed = policy.seed_source().draw();
    let start = Instant::now();
    let mut attempt: u32 = 0;

    loop {
        attempt = attempt.saturating_add(1);

        let error = match operation().await {
            Ok(value) => return Ok(value),
            Err(error) => error,
        };
        let elapsed = start.elapsed();

        if cancel.is_cancelled() {
            warn!(attempt, "cancelled while attempt was in flight; giving up");
            return Err(InvokeError::GaveUp(Failure::new(
                error,
                attempt,
                GiveUpReason::CancelledByCaller,
                elapsed,
            )));
        }

        let record = AttemptRecord {
            attempt,
            error: &error,
            elapsed,
        };
        let decision = policy.decide(&record, invocation_seed)?;

        let next_delay = match decision {
            RetryDecision::Retry { delay } => Some(delay),
            RetryDecision::GiveUp { .. } => None,
        };
        on_attempt(&AttemptEvent {
            attempt,
            error: &error,
            next_delay,
            elapsed,
        });

        match decision {
            RetryDecision::GiveUp { reason } => {
                warn!(attempt, %reason, "giving up");
                return Err(InvokeError::GaveUp(Failure::new(
                    error, attempt, reason, elapsed,
                )));
            }
            RetryDecision::Retry { delay } => {
                debug!(attempt, ?delay, "attempt failed; retrying after delay");
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = cancel.cancelled() => {
                        return Err(InvokeError::GaveUp(Failure::new(
                            error,
                            attempt,
                            GiveUpReason::CancelledByCaller,
                            start.elapsed(),
                        )));
                    }
                }
            }
        }
    }
}

/// Bound a single attempt's future to `duration`.
///
/// A future that does not settle in time fails with
/// [`TimeoutError::Timeout`], which classifies as the `"timeout"` kind -
/// compose with [`invoke`] to retry slow attempts under the same policy
/// machinery as failed ones.
///
/// # Examples
///
/// ```rust
/// use resurge::{invoke, with_timeout, Classify, ErrorKind, RetryPolicy, TimeoutError};
/// use std::cell::Cell;
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
///     .with_maximum_attempts(5)
///     .no_jitter();
///
/// let calls = Cell::new(0u32);
/// let result = invoke(
///     &policy,
///     || {
///         let n = calls.get();
///         calls.set(n + 1);
///         with_timeout(
///             async move {
///                 if n < 2 {
///                     // Too slow: trips the per-attempt timeout.
///                     tokio::time::sleep(Duration::from_millis(50)).await;
///                 }
///                 Ok::<_, Unreachable>("reached")
///             },
///             Duration::from_millis(10),
///         )
///     },
///     CancellationToken::new(),
/// )
/// .await;
///
/// assert_eq!(result.unwrap(), "reached");
/// assert_eq!(calls.get(), 3);
/// # });
/// ```
pub async fn with_timeout<T, E, Fut>(
    future: Fut,
    duration: Duration,
) -> Result<T, TimeoutError<E>>
where
    Fut: Future<Output = Result<T, E>>,
{
    match tokio::time::timeout(duration, future).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(error)) => Err(TimeoutError::Inner(error)),
        Err(_) => Err(TimeoutError::Timeout { duration }),
    }
}
