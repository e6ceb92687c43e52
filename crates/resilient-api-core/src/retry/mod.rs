//! Retry execution engine with exponential backoff
//!
//! Wraps any networked operation: transient failures (network errors and
//! HTTP 5xx) are retried with capped exponential backoff, everything else
//! propagates on first occurrence.
//!
//! # Features
//!
//! - Explicit failure classification via the `Classify` trait
//! - One pure decision function shared by the async and blocking executors
//! - Observable retry attempts via the `RetryObserver` trait
//! - Built-in `TracingObserver` for logging
//! - Cancellation that interrupts pending backoff waits
//!
//! # Example
//!
//! ```rust,no_run
//! use resilient_api_core::retry::{retry_with_policy, RetryError};
//! use resilient_api_core::types::RetryPolicy;
//!
//! async fn example() -> Result<String, RetryError<std::io::Error>> {
//!     let policy = RetryPolicy::default();
//!
//!     retry_with_policy(&policy, || async {
//!         Ok("success".to_string())
//!     }).await
//! }
//! ```

mod backoff;
mod blocking;
mod cancel;
mod classify;
mod error;
mod executor;
mod observer;

pub use backoff::{calculate_delay, decide, Step};
pub use blocking::{retry_blocking, BlockingRetryExecutor};
pub use cancel::Cancellation;
pub use classify::{Classify, FailureClass, Outcome};
pub use error::RetryError;
pub use executor::{retry_with_policy, RetryExecutor, RetryExecutorBuilder};
pub use observer::{NoOpObserver, RetryObserver, StatsObserver, TracingObserver};
