//! Generic retry executor with pluggable backoff and give-up handling.
//!
//! [`execute_with_retry`] runs an operation up to `max_tries` times,
//! sleeping between failed attempts according to the policy's [`Backoff`].
//! When the attempts are exhausted it hands the last failure to a
//! give-up handler, which decides what the call returns.
//!
//! # Example
//!
//! ```
//! use rawhttp_core::{Backoff, RetryPolicy};
//!
//! let policy = RetryPolicy::new(3, Backoff::none(), "Retry..");
//! let mut calls = 0;
//! let result: Result<u32, _> = policy.run(|| {
//!     calls += 1;
//!     if calls < 3 { Err("not yet") } else { Ok(calls) }
//! });
//! assert_eq!(result.unwrap(), 3);
//! ```

use std::fmt;
use std::thread;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

use crate::backoff::Backoff;

/// Attempt ceiling used for network round-trips.
pub const DEFAULT_MAX_TRIES: u32 = 5;

/// Message emitted before each network retry.
pub const DEFAULT_RETRY_MESSAGE: &str = "Retry..";

/// Attempt ceiling used for hostname acquisition.
pub const HOSTNAME_MAX_TRIES: u32 = 3;

/// Message emitted before each hostname retry.
pub const HOSTNAME_RETRY_MESSAGE: &str = "Incorrect input. Please, try again";

/// Returned to the give-up handler once every attempt has failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("giving up after {attempts} failed attempts: {last}")]
pub struct RetryExhausted<E> {
    /// Number of attempts made (equals the policy's `max_tries`).
    pub attempts: u32,
    /// The failure observed on the final attempt.
    pub last: E,
}

/// Hooks invoked between attempts.
///
/// The default [`TracingObserver`] logs the retry message and blocks the
/// thread; tests substitute an observer that records calls instead.
pub trait RetryObserver {
    /// Called after a failed attempt when another attempt will follow.
    fn on_retry(&mut self, attempt: u32, message: &str, delay: Duration);

    /// Waits `delay` before the next attempt.
    fn sleep(&mut self, delay: Duration);
}

/// Logs retries through `tracing` and sleeps the current thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl RetryObserver for TracingObserver {
    fn on_retry(&mut self, attempt: u32, message: &str, delay: Duration) {
        warn!(attempt, delay_ms = delay.as_millis(), "{message}");
    }

    fn sleep(&mut self, delay: Duration) {
        if !delay.is_zero() {
            thread::sleep(delay);
        }
    }
}

/// How many times to try, how long to wait, and what to say in between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum attempts including the first one.
    max_tries: u32,

    /// Delay rule; a fresh sequence is started for every execution.
    backoff: Backoff,

    /// Message reported before each retry.
    message: String,
}

impl Default for RetryPolicy {
    /// Fibonacci backoff, 5 attempts, `Retry..` (the transport policy).
    fn default() -> Self {
        Self {
            max_tries: DEFAULT_MAX_TRIES,
            backoff: Backoff::fibonacci(),
            message: DEFAULT_RETRY_MESSAGE.to_string(),
        }
    }
}

impl RetryPolicy {
    /// Creates a policy. `max_tries` below 1 is raised to 1.
    #[must_use]
    pub fn new(max_tries: u32, backoff: Backoff, message: impl Into<String>) -> Self {
        Self {
            max_tries: max_tries.max(1),
            backoff,
            message: message.into(),
        }
    }

    /// Policy used around hostname acquisition: constant 1s, 3 attempts.
    #[must_use]
    pub fn hostname() -> Self {
        Self::new(
            HOSTNAME_MAX_TRIES,
            Backoff::constant(Duration::from_secs(1)),
            HOSTNAME_RETRY_MESSAGE,
        )
    }

    /// Returns a copy with a different attempt ceiling.
    #[must_use]
    pub fn with_max_tries(mut self, max_tries: u32) -> Self {
        self.max_tries = max_tries.max(1);
        self
    }

    /// Returns a copy with a different backoff rule.
    #[must_use]
    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    #[must_use]
    pub fn max_tries(&self) -> u32 {
        self.max_tries
    }

    #[must_use]
    pub fn backoff(&self) -> Backoff {
        self.backoff
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Runs `operation` with the default give-up handler, which returns the
    /// exhaustion as an error.
    ///
    /// # Errors
    ///
    /// Returns [`RetryExhausted`] carrying the last failure when every
    /// attempt failed.
    pub fn run<T, E, F>(&self, mut operation: F) -> Result<T, RetryExhausted<E>>
    where
        F: FnMut() -> Result<T, E>,
        E: fmt::Display,
    {
        execute_with_retry(self, || operation().map(Ok), Err, &mut TracingObserver)
    }

    /// Runs `operation`, handing exhaustion to `on_give_up` whose return
    /// value becomes the result.
    pub fn run_with<T, E, F, G>(&self, operation: F, on_give_up: G) -> T
    where
        F: FnMut() -> Result<T, E>,
        G: FnOnce(RetryExhausted<E>) -> T,
        E: fmt::Display,
    {
        execute_with_retry(self, operation, on_give_up, &mut TracingObserver)
    }

    /// Like [`RetryPolicy::run`], but stops at the first failure for which
    /// `is_retryable` returns false.
    ///
    /// # Errors
    ///
    /// Returns [`RetryExhausted`] with the last failure and the number of
    /// attempts made, which is below `max_tries` when a failure was not
    /// retryable.
    pub fn run_while<T, E, F, P>(&self, mut operation: F, is_retryable: P) -> Result<T, RetryExhausted<E>>
    where
        F: FnMut() -> Result<T, E>,
        P: FnMut(&E) -> bool,
        E: fmt::Display,
    {
        execute_with_retry_if(
            self,
            || operation().map(Ok),
            is_retryable,
            Err,
            &mut TracingObserver,
        )
    }
}

/// Executes `operation` under `policy`.
///
/// - Success returns immediately, with no sleep and no retry message.
/// - A failure with attempts remaining reports the policy message through
///   `observer`, sleeps for the next backoff delay, then tries again.
/// - After `max_tries` failures, `on_give_up` receives the last failure and
///   its return value becomes the result.
///
/// The backoff sequence is started afresh for each call.
pub fn execute_with_retry<T, E, F, G, O>(
    policy: &RetryPolicy,
    operation: F,
    on_give_up: G,
    observer: &mut O,
) -> T
where
    F: FnMut() -> Result<T, E>,
    G: FnOnce(RetryExhausted<E>) -> T,
    E: fmt::Display,
    O: RetryObserver + ?Sized,
{
    execute_with_retry_if(policy, operation, |_| true, on_give_up, observer)
}

/// [`execute_with_retry`] with a filter: a failure for which `is_retryable`
/// returns false goes to `on_give_up` at once, without a retry message or
/// sleep.
pub fn execute_with_retry_if<T, E, F, P, G, O>(
    policy: &RetryPolicy,
    mut operation: F,
    mut is_retryable: P,
    on_give_up: G,
    observer: &mut O,
) -> T
where
    F: FnMut() -> Result<T, E>,
    P: FnMut(&E) -> bool,
    G: FnOnce(RetryExhausted<E>) -> T,
    E: fmt::Display,
    O: RetryObserver + ?Sized,
{
    let mut delays = policy.backoff.sequence();
    let mut attempt = 0;

    loop {
        attempt += 1;
        match operation() {
            Ok(value) => {
                if attempt > 1 {
                    debug!(attempt, "operation succeeded after retry");
                }
                return value;
            }
            Err(error) => {
                if !is_retryable(&error) {
                    debug!(attempt, error = %error, "failure is not retryable");
                    return on_give_up(RetryExhausted {
                        attempts: attempt,
                        last: error,
                    });
                }
                if attempt >= policy.max_tries {
                    debug!(attempts = attempt, error = %error, "retry attempts exhausted");
                    return on_give_up(RetryExhausted {
                        attempts: attempt,
                        last: error,
                    });
                }

                debug!(attempt, error = %error, "attempt failed");
                let delay = delays.next().unwrap_or_default();
                observer.on_retry(attempt, &policy.message, delay);
                observer.sleep(delay);
            }
        }
    }
}
