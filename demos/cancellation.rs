//! Cancellation Demo
//!
//! Shows the cancellation contract: an in-flight attempt always settles, a
//! wait between attempts is interrupted immediately, and no retry follows
//! cancellation.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use resurge::{invoke, Classify, ErrorKind, InvocationResult, RetryPolicy};

#[derive(Debug)]
struct Flaky;

impl Classify for Flaky {
    fn kind(&self) -> ErrorKind {
        ErrorKind::from_static("net")
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let policy = RetryPolicy::new(Duration::from_secs(5))
        .with_maximum_attempts(10)
        .no_jitter();

    let cancel = CancellationToken::new();
    let attempts = Arc::new(AtomicU32::new(0));

    // Cancel while the engine waits out the delay after the first failure.
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            println!("caller: cancelling");
            cancel.cancel();
        }
    });

    let result: InvocationResult<(), _> = invoke(
        &policy,
        {
            let attempts = attempts.clone();
            move || {
                let n = attempts.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    println!("engine: attempt {} runs and fails", n);
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    Err(Flaky)
                }
            }
        },
        cancel,
    )
    .await;

    let failure = result.unwrap_err().into_failure().unwrap();
    println!(
        "terminal: {} attempt(s), reason: {}, after {:?}",
        failure.attempts, failure.reason, failure.elapsed
    );
    assert_eq!(attempts.load(Ordering::SeqCst), failure.attempts);
}
