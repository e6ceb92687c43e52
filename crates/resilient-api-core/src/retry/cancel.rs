//! Cancellation handle shared by the async and blocking executors
//!
//! One handle serves both scheduling models: async waits race a
//! `CancellationToken`, blocking waits park on a condition variable that
//! `cancel()` notifies.

use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// A handle that can be used to request cancellation
#[derive(Clone, Debug, Default)]
pub struct Cancellation {
    token: CancellationToken,
    signal: Arc<(Mutex<bool>, Condvar)>,
}

impl Cancellation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation and wake every pending wait
    pub fn cancel(&self) {
        self.token.cancel();

        let (lock, cvar) = &*self.signal;
        *lock.lock().unwrap_or_else(PoisonError::into_inner) = true;
        cvar.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// A future that resolves when cancellation is requested
    pub fn cancelled(&self) -> tokio_util::sync::WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }

    /// Sleep on the tokio timer
    ///
    /// Returns `false` if cancellation cut the wait short.
    pub async fn sleep(&self, duration: Duration) -> bool {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => false,
            _ = tokio::time::sleep(duration) => true,
        }
    }

    /// Block the current thread for `duration`
    ///
    /// Returns `false` if cancellation cut the wait short.
    pub fn sleep_blocking(&self, duration: Duration) -> bool {
        let (lock, cvar) = &*self.signal;
        let guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        let (guard, _timeout) = cvar
            .wait_timeout_while(guard, duration, |cancelled| !*cancelled)
            .unwrap_or_else(PoisonError::into_inner);
        !*guard
    }
}
