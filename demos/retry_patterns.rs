//! Retry Patterns Demo
//!
//! Walks through the engine's surface:
//! - Exponential backoff with and without jitter
//! - Restricting retryability by error kind
//! - Observing attempts with hooks
//! - Per-attempt timeouts composed with retry

use std::cell::Cell;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use resurge::{
    invoke, invoke_with_hooks, with_timeout, AttemptEvent, Classify, ErrorKind, Jitter,
    RetryPolicy, SeedSource,
};

#[derive(Debug)]
enum ApiError {
    Unavailable,
    BadRequest,
}

impl Classify for ApiError {
    fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Unavailable => ErrorKind::from_static("net.unavailable"),
            ApiError::BadRequest => ErrorKind::from_static("request.invalid"),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Unavailable => write!(f, "service unavailable"),
            ApiError::BadRequest => write!(f, "bad request"),
        }
    }
}

/// Example 1: transient failures retried under exponential backoff.
async fn example_basic_retry() {
    println!("\n=== Example 1: Basic Retry ===");

    let policy = RetryPolicy::new(Duration::from_millis(100))
        .with_maximum_attempts(5)
        .no_jitter();

    let calls = Cell::new(0u32);
    let result = invoke(
        &policy,
        || {
            let n = calls.get();
            calls.set(n + 1);
            println!("  attempt {}", n + 1);
            async move {
                if n < 2 {
                    Err(ApiError::Unavailable)
                } else {
                    Ok("success!")
                }
            }
        },
        CancellationToken::new(),
    )
    .await;

    match result {
        Ok(value) => println!("succeeded after {} attempts: {}", calls.get(), value),
        Err(error) => println!("failed: {}", error),
    }
}

/// Example 2: the delay schedule, with and without jitter.
async fn example_delay_schedule() {
    println!("\n=== Example 2: Delay Schedule ===");

    let plain = RetryPolicy::new(Duration::from_millis(100))
        .with_maximum_interval(Duration::from_secs(2))
        .no_jitter();
    println!("exponential, capped at 2s:");
    for attempt in 1..=6 {
        println!("  after attempt {}: {:?}", attempt, plain.delay_for_attempt(attempt));
    }

    let jittered = RetryPolicy::new(Duration::from_millis(100))
        .with_maximum_interval(Duration::from_secs(2))
        .with_jitter(Jitter::equal())
        .with_seed_source(SeedSource::Fixed(7));
    println!("\nsame policy, equal jitter (fixed seed):");
    for attempt in 1..=6 {
        println!(
            "  after attempt {}: {:?}",
            attempt,
            jittered.delay_with_jitter(attempt, 7).unwrap()
        );
    }
}

/// Example 3: only some error kinds are worth retrying.
async fn example_error_kinds() {
    println!("\n=== Example 3: Retryability by Kind ===");

    // Retry anything under "net"; a bad request is terminal.
    let policy = RetryPolicy::new(Duration::from_millis(50))
        .retry_on("net")
        .with_maximum_attempts(5)
        .no_jitter();

    let result: Result<(), _> = invoke(
        &policy,
        || async { Err(ApiError::BadRequest) },
        CancellationToken::new(),
    )
    .await;

    let failure = result.unwrap_err().into_failure().unwrap();
    println!(
        "bad request gave up immediately: {} attempt(s), reason: {}",
        failure.attempts, failure.reason
    );
}

/// Example 4: hooks observe every failed attempt.
async fn example_hooks() {
    println!("\n=== Example 4: Hooks ===");

    let policy = RetryPolicy::new(Duration::from_millis(50))
        .with_maximum_attempts(4)
        .no_jitter();

    let calls = Cell::new(0u32);
    let result = invoke_with_hooks(
        &policy,
        || {
            let n = calls.get();
            calls.set(n + 1);
            async move {
                if n < 2 {
                    Err(ApiError::Unavailable)
                } else {
                    Ok("recovered")
                }
            }
        },
        CancellationToken::new(),
        |event: &AttemptEvent<'_, ApiError>| {
            match event.next_delay {
                Some(delay) => println!(
                    "  [hook] attempt {} failed ({}); retrying in {:?}",
                    event.attempt, event.error, delay
                ),
                None => println!("  [hook] attempt {} failed; giving up", event.attempt),
            }
        },
    )
    .await;

    println!("result: {:?}", result.map_err(|e| e.to_string()));
}

/// Example 5: per-attempt timeouts compose with retry.
async fn example_timeout() {
    println!("\n=== Example 5: Per-Attempt Timeout ===");

    // Timed-out attempts classify as "timeout" and are retried.
    let policy = RetryPolicy::new(Duration::from_millis(50))
        .retry_on("timeout")
        .retry_on("net")
        .with_maximum_attempts(5)
        .no_jitter();

    let calls = Cell::new(0u32);
    let result = invoke(
        &policy,
        || {
            let n = calls.get();
            calls.set(n + 1);
            with_timeout(
                async move {
                    if n < 2 {
                        println!("  attempt {} hangs...", n + 1);
                        tokio::time::sleep(Duration::from_secs(10)).await;
                    }
                    println!("  attempt {} answers", n + 1);
                    Ok::<_, ApiError>("pong")
                },
                Duration::from_millis(100),
            )
        },
        CancellationToken::new(),
    )
    .await;

    match result {
        Ok(value) => println!("reply: {}", value),
        Err(error) => println!("failed: {}", error),
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    example_basic_retry().await;
    example_delay_schedule().await;
    example_error_kinds().await;
    example_hooks().await;
    example_timeout().await;
}
