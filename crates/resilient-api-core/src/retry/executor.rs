//! Async retry execution engine
//!
//! Backoff waits run on the tokio timer and yield the task, so many retried
//! operations can share one runtime thread.

use std::error::Error;
use std::future::Future;
use std::time::Instant;

use crate::types::RetryPolicy;

use super::backoff::{decide, Step};
use super::blocking::BlockingRetryExecutor;
use super::cancel::Cancellation;
use super::classify::{Classify, Outcome};
use super::error::RetryError;
use super::observer::{NoOpObserver, RetryObserver};

/// Execute an async operation with retry logic based on a policy
///
/// # Example
///
/// ```rust,no_run
/// use resilient_api_core::retry::retry_with_policy;
/// use resilient_api_core::types::RetryPolicy;
///
/// async fn example() {
///     let policy = RetryPolicy::default();
///
///     let result = retry_with_policy(&policy, || async {
///         Ok::<_, std::io::Error>("success")
///     }).await;
/// }
/// ```
pub async fn retry_with_policy<F, Fut, T, E>(policy: &RetryPolicy, op: F) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Classify + Error,
{
    RetryExecutorBuilder::new()
        .with_policy(policy.clone())
        .build()
        .execute(op)
        .await
}

/// Builder for configuring retry executors
///
/// # Example
///
/// ```rust
/// use resilient_api_core::retry::{RetryExecutorBuilder, TracingObserver};
/// use resilient_api_core::types::RetryPolicy;
///
/// let executor = RetryExecutorBuilder::new()
///     .with_policy(RetryPolicy::default())
///     .with_observer(TracingObserver::new("create_user"))
///     .build();
/// ```
pub struct RetryExecutorBuilder<O = NoOpObserver> {
    policy: RetryPolicy,
    observer: O,
}

impl Default for RetryExecutorBuilder<NoOpObserver> {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryExecutorBuilder<NoOpObserver> {
    pub fn new() -> Self {
        Self {
            policy: RetryPolicy::default(),
            observer: NoOpObserver,
        }
    }
}

impl<O> RetryExecutorBuilder<O> {
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the observer that receives callbacks during execution
    pub fn with_observer<O2>(self, observer: O2) -> RetryExecutorBuilder<O2> {
        RetryExecutorBuilder {
            policy: self.policy,
            observer,
        }
    }

    /// Build an executor that waits on the tokio timer
    pub fn build(self) -> RetryExecutor<O> {
        RetryExecutor {
            policy: self.policy,
            observer: self.observer,
        }
    }

    /// Build an executor that blocks the calling thread while waiting
    pub fn build_blocking(self) -> BlockingRetryExecutor<O> {
        BlockingRetryExecutor::new(self.policy, self.observer)
    }
}

/// A retry executor for async operations
///
/// Use `RetryExecutorBuilder` to create an instance.
pub struct RetryExecutor<O> {
    policy: RetryPolicy,
    observer: O,
}

impl<O> RetryExecutor<O>
where
    O: RetryObserver,
{
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Execute an operation with retry logic
    ///
    /// The closure is called once per attempt and must produce a fresh future
    /// each time.
    pub async fn execute<F, Fut, T, E>(&self, op: F) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Classify + Error,
    {
        self.run(op, None).await
    }

    /// Execute an operation, stopping promptly once `cancel` fires
    ///
    /// Cancellation interrupts both an in-flight attempt and a pending
    /// backoff wait, and is reported as `RetryError::Cancelled`.
    pub async fn execute_with_cancel<F, Fut, T, E>(
        &self,
        cancel: &Cancellation,
        op: F,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Classify + Error,
    {
        self.run(op, Some(cancel)).await
    }

    async fn run<F, Fut, T, E>(
        &self,
        mut op: F,
        cancel: Option<&Cancellation>,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Classify + Error,
    {
        let start = Instant::now();
        let max_attempts = self.policy.max_attempts.max(1);
        let mut last_error: Option<E> = None;
        let mut attempt = 1;

        loop {
            if cancel.is_some_and(Cancellation::is_cancelled) {
                self.observer
                    .on_cancelled(attempt - 1, last_error.as_ref().map(|e| e as &dyn Error));
                return Err(RetryError::cancelled(attempt - 1, last_error));
            }

            self.observer.on_attempt_start(attempt, max_attempts);

            let result = match cancel {
                Some(cancel) => {
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => {
                            self.observer.on_cancelled(
                                attempt,
                                last_error.as_ref().map(|e| e as &dyn Error),
                            );
                            return Err(RetryError::cancelled(attempt, last_error));
                        }
                        result = op() => result,
                    }
                }
                None => op().await,
            };

            match decide(&self.policy, attempt, Outcome::from_result(result)) {
                Step::Done(value) => {
                    self.observer.on_success(attempt, start.elapsed());
                    return Ok(value);
                }
                Step::Fatal(err) => {
                    self.observer.on_fatal(attempt, &err);
                    return Err(RetryError::fatal(attempt, err));
                }
                Step::Exhausted(err) => {
                    self.observer.on_exhausted(attempt, &err);
                    return Err(RetryError::exhausted(attempt, err, start.elapsed()));
                }
                Step::Retry { error, delay } => {
                    self.observer.on_attempt_failed(attempt, &error, delay);

                    let completed = match cancel {
                        Some(cancel) => cancel.sleep(delay).await,
                        None => {
                            tokio::time::sleep(delay).await;
                            true
                        }
                    };

                    if !completed {
                        self.observer.on_cancelled(attempt, Some(&error as &dyn Error));
                        return Err(RetryError::cancelled(attempt, Some(error)));
                    }

                    last_error = Some(error);
                    attempt += 1;
                }
            }
        }
    }
}
