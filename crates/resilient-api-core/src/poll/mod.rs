//! Eventual-deletion polling
//!
//! After a delete the backend may keep serving the resource for a while.
//! [`DeletionPoller`] samples existence at a fixed interval until the
//! resource is gone or the poll budget runs out. Each sample is fresh:
//! nothing is cached between polls.
//!
//! What happens on exhaustion is an explicit [`ExhaustionPolicy`]:
//!
//! - `Strict` (default): the deletion is reported as unverified.
//! - `BestEffort`: the resource is assumed deleted so that cleanup can
//!   continue against an unreliable backend. The assumption is logged.

use std::future::Future;
use std::time::Duration;

use crate::retry::Cancellation;
use crate::types::{ExhaustionPolicy, PollPolicy};

/// Result of a single existence probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// The resource is gone (HTTP 404)
    Absent,

    /// The resource still exists
    Present,

    /// The probe failed with a transient or unexpected error
    Inconclusive,
}

/// Final result of a deletion poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// A probe observed the resource as absent
    Confirmed { polls: u32 },

    /// Budget exhausted under `ExhaustionPolicy::Strict`
    Unverified { polls: u32 },

    /// Budget exhausted under `ExhaustionPolicy::BestEffort`
    Assumed { polls: u32 },

    /// The caller cancelled while a wait was pending
    Cancelled { polls: u32 },
}

impl PollOutcome {
    /// Whether the caller may treat the resource as deleted
    pub fn is_success(self) -> bool {
        matches!(self, PollOutcome::Confirmed { .. } | PollOutcome::Assumed { .. })
    }

    /// Number of existence probes that ran
    pub fn polls(self) -> u32 {
        match self {
            PollOutcome::Confirmed { polls }
            | PollOutcome::Unverified { polls }
            | PollOutcome::Assumed { polls }
            | PollOutcome::Cancelled { polls } => polls,
        }
    }
}

/// What the poller does after probe number `poll`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PollStep {
    Finish(PollOutcome),
    Wait(Duration),
}

fn next_step(policy: &PollPolicy, poll: u32, presence: Presence) -> PollStep {
    if presence == Presence::Absent {
        return PollStep::Finish(PollOutcome::Confirmed { polls: poll });
    }

    // No wait after the final probe
    if poll >= policy.retries.max(1) {
        return PollStep::Finish(match policy.exhaustion {
            ExhaustionPolicy::Strict => PollOutcome::Unverified { polls: poll },
            ExhaustionPolicy::BestEffort => PollOutcome::Assumed { polls: poll },
        });
    }

    PollStep::Wait(policy.delay())
}

/// Polls a resource until it is confirmed absent
#[derive(Debug, Clone, Default)]
pub struct DeletionPoller {
    policy: PollPolicy,
}

impl DeletionPoller {
    pub fn new(policy: PollPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    /// Poll on the tokio timer until `resource_id` is absent
    pub async fn wait<F, Fut>(&self, resource_id: &str, check: F) -> PollOutcome
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Presence>,
    {
        self.run(resource_id, check, None).await
    }

    /// Like [`wait`](Self::wait), but a pending wait or in-flight check
    /// ends once `cancel` fires
    pub async fn wait_with_cancel<F, Fut>(
        &self,
        cancel: &Cancellation,
        resource_id: &str,
        check: F,
    ) -> PollOutcome
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Presence>,
    {
        self.run(resource_id, check, Some(cancel)).await
    }

    /// Poll from the calling thread until `resource_id` is absent
    pub fn wait_blocking<F>(&self, resource_id: &str, check: F) -> PollOutcome
    where
        F: FnMut() -> Presence,
    {
        self.run_blocking(resource_id, check, None)
    }

    pub fn wait_blocking_with_cancel<F>(
        &self,
        cancel: &Cancellation,
        resource_id: &str,
        check: F,
    ) -> PollOutcome
    where
        F: FnMut() -> Presence,
    {
        self.run_blocking(resource_id, check, Some(cancel))
    }

    async fn run<F, Fut>(
        &self,
        resource_id: &str,
        mut check: F,
        cancel: Option<&Cancellation>,
    ) -> PollOutcome
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Presence>,
    {
        let mut poll = 1;
        loop {
            if cancel.is_some_and(Cancellation::is_cancelled) {
                return self.cancelled(resource_id, poll - 1);
            }

            let presence = match cancel {
                Some(cancel) => tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return self.cancelled(resource_id, poll),
                    presence = check() => presence,
                },
                None => check().await,
            };
            self.log_probe(resource_id, poll, presence);

            match next_step(&self.policy, poll, presence) {
                PollStep::Finish(outcome) => return self.finish(resource_id, outcome),
                PollStep::Wait(delay) => {
                    let completed = match cancel {
                        Some(cancel) => cancel.sleep(delay).await,
                        None => {
                            tokio::time::sleep(delay).await;
                            true
                        }
                    };
                    if !completed {
                        return self.cancelled(resource_id, poll);
                    }
                }
            }
            poll += 1;
        }
    }

    fn run_blocking<F>(
        &self,
        resource_id: &str,
        mut check: F,
        cancel: Option<&Cancellation>,
    ) -> PollOutcome
    where
        F: FnMut() -> Presence,
    {
        let mut poll = 1;
        loop {
            if cancel.is_some_and(Cancellation::is_cancelled) {
                return self.cancelled(resource_id, poll - 1);
            }

            let presence = check();
            self.log_probe(resource_id, poll, presence);

            match next_step(&self.policy, poll, presence) {
                PollStep::Finish(outcome) => return self.finish(resource_id, outcome),
                PollStep::Wait(delay) => {
                    let completed = match cancel {
                        Some(cancel) => cancel.sleep_blocking(delay),
                        None => {
                            std::thread::sleep(delay);
                            true
                        }
                    };
                    if !completed {
                        return self.cancelled(resource_id, poll);
                    }
                }
            }
            poll += 1;
        }
    }

    fn log_probe(&self, resource_id: &str, poll: u32, presence: Presence) {
        match presence {
            Presence::Absent => tracing::debug!(
                resource_id = %resource_id,
                poll = poll,
                "deletion confirmed"
            ),
            Presence::Present => tracing::debug!(
                resource_id = %resource_id,
                poll = poll,
                retries = self.policy.retries,
                "waiting for deletion"
            ),
            Presence::Inconclusive => tracing::warn!(
                resource_id = %resource_id,
                poll = poll,
                retries = self.policy.retries,
                "existence check inconclusive, polling again"
            ),
        }
    }

    fn finish(&self, resource_id: &str, outcome: PollOutcome) -> PollOutcome {
        match outcome {
            PollOutcome::Unverified { polls } => tracing::error!(
                resource_id = %resource_id,
                polls = polls,
                "resource still present after polling budget"
            ),
            PollOutcome::Assumed { polls } => tracing::warn!(
                resource_id = %resource_id,
                polls = polls,
                "resource may still exist, assuming deleted"
            ),
            PollOutcome::Confirmed { .. } | PollOutcome::Cancelled { .. } => {}
        }
        outcome
    }

    fn cancelled(&self, resource_id: &str, polls: u32) -> PollOutcome {
        tracing::warn!(resource_id = %resource_id, polls = polls, "deletion poll cancelled");
        PollOutcome::Cancelled { polls }
    }
}

/// Poll until `resource_id` is absent; `true` if the policy counts it deleted
pub async fn wait_until_absent<F, Fut>(resource_id: &str, check: F, policy: &PollPolicy) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Presence>,
{
    DeletionPoller::new(policy.clone())
        .wait(resource_id, check)
        .await
        .is_success()
}

/// Blocking counterpart of [`wait_until_absent`]
pub fn wait_until_absent_blocking<F>(resource_id: &str, check: F, policy: &PollPolicy) -> bool
where
    F: FnMut() -> Presence,
{
    DeletionPoller::new(policy.clone())
        .wait_blocking(resource_id, check)
        .is_success()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn policy(retries: u32, delay_ms: u64) -> PollPolicy {
        PollPolicy::new(retries, Duration::from_millis(delay_ms))
    }

    /// Replays probe results, then repeats the last one
    struct Probe {
        results: RefCell<VecDeque<Presence>>,
        calls: RefCell<u32>,
    }

    impl Probe {
        fn new(results: &[Presence]) -> Self {
            Self {
                results: RefCell::new(results.iter().copied().collect()),
                calls: RefCell::new(0),
            }
        }

        fn check(&self) -> Presence {
            *self.calls.borrow_mut() += 1;
            let mut results = self.results.borrow_mut();
            if results.len() > 1 {
                results.pop_front().unwrap()
            } else {
                *results.front().unwrap()
            }
        }

        fn calls(&self) -> u32 {
            *self.calls.borrow()
        }
    }

    #[test]
    fn test_next_step_absent_finishes() {
        let step = next_step(&policy(5, 1000), 1, Presence::Absent);
        assert_eq!(step, PollStep::Finish(PollOutcome::Confirmed { polls: 1 }));
    }

    #[test]
    fn test_next_step_waits_until_budget() {
        let policy = policy(3, 1000);
        assert_eq!(
            next_step(&policy, 1, Presence::Present),
            PollStep::Wait(Duration::from_secs(1))
        );
        assert_eq!(
            next_step(&policy, 2, Presence::Inconclusive),
            PollStep::Wait(Duration::from_secs(1))
        );
        assert_eq!(
            next_step(&policy, 3, Presence::Present),
            PollStep::Finish(PollOutcome::Unverified { polls: 3 })
        );
    }

    #[test]
    fn test_next_step_best_effort_assumes() {
        let policy = policy(2, 10).best_effort();
        assert_eq!(
            next_step(&policy, 2, Presence::Inconclusive),
            PollStep::Finish(PollOutcome::Assumed { polls: 2 })
        );
    }

    #[test]
    fn test_blocking_absent_on_first_poll() {
        let probe = Probe::new(&[Presence::Absent]);
        let outcome = DeletionPoller::new(policy(5, 1)).wait_blocking("42", || probe.check());

        assert_eq!(outcome, PollOutcome::Confirmed { polls: 1 });
        assert_eq!(probe.calls(), 1);
    }

    #[test]
    fn test_blocking_always_present_strict() {
        let probe = Probe::new(&[Presence::Present]);
        let confirmed = wait_until_absent_blocking("42", || probe.check(), &policy(3, 1));

        assert!(!confirmed);
        assert_eq!(probe.calls(), 3);
    }

    #[test]
    fn test_blocking_always_present_best_effort() {
        let probe = Probe::new(&[Presence::Present]);
        let outcome =
            DeletionPoller::new(policy(3, 1).best_effort()).wait_blocking("42", || probe.check());

        assert_eq!(outcome, PollOutcome::Assumed { polls: 3 });
        assert!(outcome.is_success());
        assert_eq!(probe.calls(), 3);
    }

    #[test]
    fn test_blocking_inconclusive_is_not_fatal() {
        let probe = Probe::new(&[Presence::Inconclusive, Presence::Inconclusive, Presence::Absent]);
        let outcome = DeletionPoller::new(policy(5, 1)).wait_blocking("42", || probe.check());

        assert_eq!(outcome, PollOutcome::Confirmed { polls: 3 });
    }

    #[test]
    fn test_blocking_cancelled_before_first_poll() {
        let cancel = Cancellation::new();
        cancel.cancel();
        let probe = Probe::new(&[Presence::Present]);

        let outcome = DeletionPoller::new(policy(5, 1000)).wait_blocking_with_cancel(
            &cancel,
            "42",
            || probe.check(),
        );

        assert_eq!(outcome, PollOutcome::Cancelled { polls: 0 });
        assert!(!outcome.is_success());
        assert_eq!(probe.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_present_then_absent_waits_once() {
        let probe = Probe::new(&[Presence::Present, Presence::Absent]);

        let probe = &probe;

        let start = tokio::time::Instant::now();
        let outcome = DeletionPoller::new(policy(5, 1000))
            .wait("42", move || async move { probe.check() })
            .await;
        let elapsed = start.elapsed();

        assert_eq!(outcome, PollOutcome::Confirmed { polls: 2 });
        assert_eq!(probe.calls(), 2);
        assert!(elapsed >= Duration::from_secs(1) && elapsed < Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_does_not_sleep_after_last_poll() {
        let probe = Probe::new(&[Presence::Present]);

        let probe = &probe;

        let start = tokio::time::Instant::now();
        let confirmed =
            wait_until_absent("42", move || async move { probe.check() }, &policy(3, 1000)).await;
        let elapsed = start.elapsed();

        assert!(!confirmed);
        assert_eq!(probe.calls(), 3);
        assert!(elapsed >= Duration::from_secs(2) && elapsed < Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_async_cancel_during_wait() {
        let probe = Probe::new(&[Presence::Present]);
        let probe = &probe;
        let cancel = Cancellation::new();
        let remote = cancel.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(1500)).await;
            remote.cancel();
        });

        let outcome = DeletionPoller::new(policy(10, 1000))
            .wait_with_cancel(&cancel, "42", move || async move { probe.check() })
            .await;

        assert_eq!(outcome, PollOutcome::Cancelled { polls: 2 });
        assert_eq!(probe.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_async_cancel_abandons_in_flight_check() {
        let cancel = Cancellation::new();
        let remote = cancel.clone();
        let calls = AtomicU32::new(0);
        let calls = &calls;

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            remote.cancel();
        });

        let start = tokio::time::Instant::now();
        let outcome = DeletionPoller::new(policy(5, 1000))
            .wait_with_cancel(&cancel, "42", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_secs(30)).await;
                Presence::Absent
            })
            .await;

        assert_eq!(outcome, PollOutcome::Cancelled { polls: 1 });
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
