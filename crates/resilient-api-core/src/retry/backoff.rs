//! Backoff schedule and the per-attempt retry decision
//!
//! Both executors (async and blocking) drive their loop through [`decide`],
//! so classification and timing are identical regardless of how the wait
//! itself is performed.

use std::time::Duration;

use crate::types::RetryPolicy;

use super::classify::Outcome;

/// Calculate the delay before the next retry attempt
///
/// # Arguments
///
/// * `policy` - The retry policy containing timing parameters
/// * `attempt` - The attempt that just failed (1-indexed)
///
/// # Example
///
/// ```rust
/// use resilient_api_core::retry::calculate_delay;
/// use resilient_api_core::types::RetryPolicy;
///
/// let policy = RetryPolicy {
///     max_attempts: 6,
///     initial_delay_ms: 2000,
///     max_delay_ms: 10000,
/// };
///
/// assert_eq!(calculate_delay(&policy, 1).as_secs(), 2);
/// assert_eq!(calculate_delay(&policy, 2).as_secs(), 4);
/// assert_eq!(calculate_delay(&policy, 4).as_secs(), 10);
/// ```
pub fn calculate_delay(policy: &RetryPolicy, attempt: u32) -> Duration {
    // Attempt is 1-indexed, the exponent counts prior failures from zero
    let exponent = attempt.saturating_sub(1);

    let factor = 1u64.checked_shl(exponent).unwrap_or(u64::MAX);
    let delay_ms = policy
        .initial_delay_ms
        .saturating_mul(factor)
        .min(policy.max_delay_ms);

    Duration::from_millis(delay_ms)
}

/// What the executor must do after an attempt
#[derive(Debug)]
pub enum Step<T, E> {
    /// Return the value to the caller
    Done(T),

    /// Wait `delay`, then run the next attempt
    Retry { error: E, delay: Duration },

    /// Surface the error immediately, no further attempts
    Fatal(E),

    /// The attempt budget is spent; surface the last error
    Exhausted(E),
}

/// Decide the next step after attempt number `attempt` produced `outcome`
///
/// A policy with `max_attempts == 0` still runs one attempt.
pub fn decide<T, E>(policy: &RetryPolicy, attempt: u32, outcome: Outcome<T, E>) -> Step<T, E> {
    match outcome {
        Outcome::Success(value) => Step::Done(value),
        Outcome::FatalFailure(error) => Step::Fatal(error),
        Outcome::RetryableFailure(error) => {
            if attempt >= policy.max_attempts.max(1) {
                Step::Exhausted(error)
            } else {
                Step::Retry {
                    error,
                    delay: calculate_delay(policy, attempt),
                }
            }
        }
    }
}
