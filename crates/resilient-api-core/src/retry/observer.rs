//! Retry observation and logging
//!
//! This module provides the `RetryObserver` trait for monitoring retry attempts
//! and a `TracingObserver` implementation that logs using the `tracing` crate.

use std::error::Error;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Observer trait for retry attempt events
///
/// # Example
///
/// ```rust
/// use resilient_api_core::retry::RetryObserver;
/// use std::error::Error;
/// use std::time::Duration;
///
/// struct PrintObserver;
///
/// impl RetryObserver for PrintObserver {
///     fn on_attempt_start(&self, attempt: u32, max_attempts: u32) {
///         println!("attempt {}/{}", attempt, max_attempts);
///     }
///
///     fn on_attempt_failed(&self, attempt: u32, error: &dyn Error, delay: Duration) {
///         println!("attempt {} failed: {} (retry in {:?})", attempt, error, delay);
///     }
///
///     fn on_success(&self, _attempt: u32, _total_duration: Duration) {}
///
///     fn on_exhausted(&self, _attempts: u32, _final_error: &dyn Error) {}
/// }
/// ```
pub trait RetryObserver: Send + Sync {
    /// Called when an attempt is about to start
    fn on_attempt_start(&self, attempt: u32, max_attempts: u32);

    /// Called when an attempt failed with a retryable error
    ///
    /// `delay` is the wait before the next attempt.
    fn on_attempt_failed(&self, attempt: u32, error: &dyn Error, delay: Duration);

    /// Called when the operation succeeds
    ///
    /// An `attempt` above 1 means the operation recovered.
    fn on_success(&self, attempt: u32, total_duration: Duration);

    /// Called when all retry attempts are exhausted
    fn on_exhausted(&self, attempts: u32, final_error: &dyn Error);

    /// Called when an error is not retryable
    fn on_fatal(&self, attempt: u32, error: &dyn Error) {
        let _ = (attempt, error);
    }

    /// Called when the caller cancelled the operation
    fn on_cancelled(&self, attempt: u32, last_error: Option<&dyn Error>) {
        let _ = (attempt, last_error);
    }
}

/// A no-op observer that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpObserver;

impl RetryObserver for NoOpObserver {
    fn on_attempt_start(&self, _attempt: u32, _max_attempts: u32) {}

    fn on_attempt_failed(&self, _attempt: u32, _error: &dyn Error, _delay: Duration) {}

    fn on_success(&self, _attempt: u32, _total_duration: Duration) {}

    fn on_exhausted(&self, _attempts: u32, _final_error: &dyn Error) {}
}

/// An observer that logs retry events using the `tracing` crate
///
/// # Log Levels
///
/// - `on_attempt_start`: DEBUG
/// - `on_attempt_failed`: WARN
/// - `on_success`: INFO when recovered, DEBUG on the first attempt
/// - `on_exhausted`: ERROR
/// - `on_fatal`, `on_cancelled`: WARN
#[derive(Debug, Clone)]
pub struct TracingObserver {
    /// Name of the operation being retried (for log context)
    operation: String,
}

impl TracingObserver {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
        }
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }
}

impl Default for TracingObserver {
    fn default() -> Self {
        Self::new("retry")
    }
}

impl RetryObserver for TracingObserver {
    fn on_attempt_start(&self, attempt: u32, max_attempts: u32) {
        tracing::debug!(
            operation = %self.operation,
            attempt = attempt,
            max_attempts = max_attempts,
            "starting attempt"
        );
    }

    fn on_attempt_failed(&self, attempt: u32, error: &dyn Error, delay: Duration) {
        tracing::warn!(
            operation = %self.operation,
            attempt = attempt,
            error = %error,
            delay_ms = delay.as_millis() as u64,
            "attempt failed, retrying after backoff"
        );
    }

    fn on_success(&self, attempt: u32, total_duration: Duration) {
        if attempt > 1 {
            tracing::info!(
                operation = %self.operation,
                attempt = attempt,
                total_duration_ms = total_duration.as_millis() as u64,
                "recovered after retry"
            );
        } else {
            tracing::debug!(
                operation = %self.operation,
                duration_ms = total_duration.as_millis() as u64,
                "succeeded on first attempt"
            );
        }
    }

    fn on_exhausted(&self, attempts: u32, final_error: &dyn Error) {
        tracing::error!(
            operation = %self.operation,
            attempts = attempts,
            error = %final_error,
            "all retry attempts exhausted"
        );
    }

    fn on_fatal(&self, attempt: u32, error: &dyn Error) {
        tracing::warn!(
            operation = %self.operation,
            attempt = attempt,
            error = %error,
            "non-retryable error"
        );
    }

    fn on_cancelled(&self, attempt: u32, last_error: Option<&dyn Error>) {
        match last_error {
            Some(err) => tracing::warn!(
                operation = %self.operation,
                attempt = attempt,
                error = %err,
                "retry cancelled"
            ),
            None => tracing::warn!(
                operation = %self.operation,
                attempt = attempt,
                "retry cancelled"
            ),
        }
    }
}

/// An observer that collects statistics about retry attempts
///
/// Records every backoff delay it is told about, which makes the schedule
/// observable in tests.
#[derive(Debug, Default)]
pub struct StatsObserver {
    attempt_starts: AtomicU32,
    failures: AtomicU32,
    successes: AtomicU32,
    recoveries: AtomicU32,
    exhaustions: AtomicU32,
    fatals: AtomicU32,
    cancellations: AtomicU32,
    delays: Mutex<Vec<Duration>>,
}

impl StatsObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempt_starts(&self) -> u32 {
        self.attempt_starts.load(Ordering::SeqCst)
    }

    pub fn failures(&self) -> u32 {
        self.failures.load(Ordering::SeqCst)
    }

    pub fn successes(&self) -> u32 {
        self.successes.load(Ordering::SeqCst)
    }

    /// Successes that needed more than one attempt
    pub fn recoveries(&self) -> u32 {
        self.recoveries.load(Ordering::SeqCst)
    }

    pub fn exhaustions(&self) -> u32 {
        self.exhaustions.load(Ordering::SeqCst)
    }

    pub fn fatals(&self) -> u32 {
        self.fatals.load(Ordering::SeqCst)
    }

    pub fn cancellations(&self) -> u32 {
        self.cancellations.load(Ordering::SeqCst)
    }

    /// Backoff delays in the order they were scheduled
    pub fn delays(&self) -> Vec<Duration> {
        self.delays
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl RetryObserver for StatsObserver {
    fn on_attempt_start(&self, _attempt: u32, _max_attempts: u32) {
        self.attempt_starts.fetch_add(1, Ordering::SeqCst);
    }

    fn on_attempt_failed(&self, _attempt: u32, _error: &dyn Error, delay: Duration) {
        self.failures.fetch_add(1, Ordering::SeqCst);
        self.delays
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(delay);
    }

    fn on_success(&self, attempt: u32, _total_duration: Duration) {
        self.successes.fetch_add(1, Ordering::SeqCst);
        if attempt > 1 {
            self.recoveries.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn on_exhausted(&self, _attempts: u32, _final_error: &dyn Error) {
        self.exhaustions.fetch_add(1, Ordering::SeqCst);
    }

    fn on_fatal(&self, _attempt: u32, _error: &dyn Error) {
        self.fatals.fetch_add(1, Ordering::SeqCst);
    }

    fn on_cancelled(&self, _attempt: u32, _last_error: Option<&dyn Error>) {
        self.cancellations.fetch_add(1, Ordering::SeqCst);
    }
}

impl<T: RetryObserver + ?Sized> RetryObserver for std::sync::Arc<T> {
    fn on_attempt_start(&self, attempt: u32, max_attempts: u32) {
        (**self).on_attempt_start(attempt, max_attempts)
    }

    fn on_attempt_failed(&self, attempt: u32, error: &dyn Error, delay: Duration) {
        (**self).on_attempt_failed(attempt, error, delay)
    }

    fn on_success(&self, attempt: u32, total_duration: Duration) {
        (**self).on_success(attempt, total_duration)
    }

    fn on_exhausted(&self, attempts: u32, final_error: &dyn Error) {
        (**self).on_exhausted(attempts, final_error)
    }

    fn on_fatal(&self, attempt: u32, error: &dyn Error) {
        (**self).on_fatal(attempt, error)
    }

    fn on_cancelled(&self, attempt: u32, last_error: Option<&dyn Error>) {
        (**self).on_cancelled(attempt, last_error)
    }
}
