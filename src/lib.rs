//! # Resurge
//!
//! Retry policies, seeded jitter, and a cancellable invoker for fallible
//! remote operations.
//!
//! ## Philosophy
//!
//! **Resurge** keeps the decision and the execution apart:
//!
//! - **Pure core**: [`RetryPolicy`] is just data - delays, decisions, and
//!   jitter are pure functions of the policy, the attempt, and a seed.
//! - **Imperative shell**: [`invoke`] drives the attempts, owns the timers,
//!   and honors cancellation.
//!
//! Because the two roles connect only through the operation and result
//! types, either side can be relocated - the policy consulted remotely, the
//! invoker embedded in a worker - without changing the contract.
//!
//! ## Quick Example
//!
//! ```rust
//! use resurge::{invoke, Classify, ErrorKind, RetryPolicy};
//! use std::cell::Cell;
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//!
//! #[derive(Debug)]
//! struct Unreachable;
//!
//! impl Classify for Unreachable {
//!     fn kind(&self) -> ErrorKind {
//!         ErrorKind::from_static("net.unreachable")
//!     }
//! }
//!
//! # tokio_test::block_on(async {
//! // Exponential backoff from 10ms, at most 4 attempts.
//! let policy = RetryPolicy::new(Duration::from_millis(10))
//!     .with_maximum_attempts(4)
//!     .no_jitter();
//!
//! let calls = Cell::new(0u32);
//! let result = invoke(
//!     &policy,
//!     || {
//!         let n = calls.get();
//!         calls.set(n + 1);
//!         async move {
//!             if n < 2 {
//!                 Err(Unreachable)
//!             } else {
//!                 Ok("reachable after all")
//!             }
//!         }
//!     },
//!     CancellationToken::new(),
//! )
//! .await;
//!
//! assert_eq!(result.unwrap(), "reachable after all");
//! assert_eq!(calls.get(), 3);
//! # });
//! ```
//!
//! ## Deciding what retries
//!
//! Operation errors implement [`Classify`], returning a dot-separated
//! [`ErrorKind`]. Policies match kinds hierarchically - retrying on `"net"`
//! covers `"net.timeout"` - and explicit exclusions always win:
//!
//! ```rust
//! use resurge::RetryPolicy;
//! use std::time::Duration;
//!
//! let policy = RetryPolicy::new(Duration::from_millis(100))
//!     .retry_on("net")
//!     .retry_on("timeout")
//!     .give_up_on("validation")
//!     .with_maximum_interval(Duration::from_secs(30))
//!     .with_maximum_attempts(8);
//! ```
//!
//! ## Jitter
//!
//! Jitter is on by default (full jitter) and is a pure function of a seed
//! and a bound, so delays are reproducible under a fixed seed source:
//!
//! ```rust
//! use resurge::{Jitter, RetryPolicy, SeedSource};
//! use std::time::Duration;
//!
//! let policy = RetryPolicy::new(Duration::from_millis(100))
//!     .with_jitter(Jitter::equal())
//!     .with_seed_source(SeedSource::Fixed(42));
//!
//! // Identical inputs, identical delays.
//! assert_eq!(
//!     policy.delay_with_jitter(3, 42).unwrap(),
//!     policy.delay_with_jitter(3, 42).unwrap(),
//! );
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

mod backoff;
pub mod error;
pub mod invoke;
pub mod jitter;
pub mod kind;
pub mod policy;

// Re-exports
pub use error::{ConfigError, Failure, InvokeError, TimeoutError};
pub use invoke::{invoke, invoke_with_hooks, with_timeout, AttemptEvent, InvocationResult};
pub use jitter::{equal_jitter, full_jitter, Jitter, JitterFn, SeedSource};
pub use kind::{Classify, ErrorKind};
pub use policy::{AttemptRecord, GiveUpReason, RetryDecision, RetryPolicy};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{ConfigError, Failure, InvokeError, TimeoutError};
    pub use crate::invoke::{
        invoke, invoke_with_hooks, with_timeout, AttemptEvent, InvocationResult,
    };
    pub use crate::jitter::{Jitter, SeedSource};
    pub use crate::kind::{Classify, ErrorKind};
    pub use crate::policy::{AttemptRecord, GiveUpReason, RetryDecision, RetryPolicy};
}
