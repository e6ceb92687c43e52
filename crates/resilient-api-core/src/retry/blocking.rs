//! Blocking retry execution
//!
//! Same decision logic as the async executor; backoff waits park the calling
//! thread only.

use std::error::Error;
use std::time::Instant;

use crate::types::RetryPolicy;

use super::backoff::{decide, Step};
use super::cancel::Cancellation;
use super::classify::{Classify, Outcome};
use super::error::RetryError;
use super::observer::{NoOpObserver, RetryObserver};

/// Execute a blocking operation with retry logic based on a policy
pub fn retry_blocking<F, T, E>(policy: &RetryPolicy, op: F) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Result<T, E>,
    E: Classify + Error,
{
    BlockingRetryExecutor::new(policy.clone(), NoOpObserver).execute(op)
}

/// A retry executor for blocking operations
///
/// Build one through `RetryExecutorBuilder::build_blocking`.
pub struct BlockingRetryExecutor<O> {
    policy: RetryPolicy,
    observer: O,
}

impl<O> BlockingRetryExecutor<O> {
    pub(crate) fn new(policy: RetryPolicy, observer: O) -> Self {
        Self { policy, observer }
    }
}

impl<O> BlockingRetryExecutor<O>
where
    O: RetryObserver,
{
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Execute an operation with retry logic
    pub fn execute<F, T, E>(&self, op: F) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Result<T, E>,
        E: Classify + Error,
    {
        self.run(op, None)
    }

    /// Execute an operation, abandoning a pending backoff wait once `cancel`
    /// fires
    ///
    /// An attempt already in progress runs to completion; the transport's own
    /// timeout bounds it.
    pub fn execute_with_cancel<F, T, E>(
        &self,
        cancel: &Cancellation,
        op: F,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Result<T, E>,
        E: Classify + Error,
    {
        self.run(op, Some(cancel))
    }

    fn run<F, T, E>(&self, mut op: F, cancel: Option<&Cancellation>) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Result<T, E>,
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

            match decide(&self.policy, attempt, Outcome::from_result(op())) {
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
                        Some(cancel) => cancel.sleep_blocking(delay),
                        None => {
                            std::thread::sleep(delay);
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
