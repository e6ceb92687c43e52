//! Registry of created users and their end-of-run purge

use std::collections::BTreeSet;
use std::sync::{Mutex, PoisonError};

use futures::future::join_all;
use resilient_api_core::poll::PollOutcome;

use crate::async_client::AsyncUsersApiClient;
use crate::blocking::UsersApiClient;

/// What happened to each registered id during a purge
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// Deleted, and the deletion was confirmed (or assumed under best effort)
    pub deleted: Vec<String>,

    /// Deleted, but still visible when the poll budget ran out
    pub unverified: Vec<String>,

    /// The delete call itself failed, with the error message
    pub failed: Vec<(String, String)>,
}

impl CleanupReport {
    /// True when every id was removed and confirmed
    pub fn is_clean(&self) -> bool {
        self.unverified.is_empty() && self.failed.is_empty()
    }

    fn record(&mut self, user_id: String, result: Result<PollOutcome, String>) {
        match result {
            Ok(outcome) if outcome.is_success() => self.deleted.push(user_id),
            Ok(outcome) => {
                tracing::warn!(user_id = %user_id, outcome = ?outcome, "deletion not verified");
                self.unverified.push(user_id);
            }
            Err(message) => {
                tracing::error!(user_id = %user_id, error = %message, "cleanup delete failed");
                self.failed.push((user_id, message));
            }
        }
    }
}

/// Thread-safe set of user ids created during a run
#[derive(Debug, Default)]
pub struct CleanupRegistry {
    ids: Mutex<BTreeSet<String>>,
}

impl CleanupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track `user_id`; returns `false` if it was already tracked
    pub fn register(&self, user_id: impl Into<String>) -> bool {
        self.lock().insert(user_id.into())
    }

    /// Stop tracking `user_id`, e.g. after a test deleted it itself
    pub fn unregister(&self, user_id: &str) -> bool {
        self.lock().remove(user_id)
    }

    pub fn ids(&self) -> Vec<String> {
        self.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeSet<String>> {
        self.ids.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.lock()).into_iter().collect()
    }

    /// Delete every tracked user one by one and confirm each deletion
    pub fn purge_blocking(&self, client: &UsersApiClient) -> CleanupReport {
        let mut report = CleanupReport::default();
        for user_id in self.take() {
            let result = client
                .delete_user(&user_id)
                .map(|_| client.wait_until_deleted(&user_id))
                .map_err(|e| e.to_string());
            report.record(user_id, result);
        }
        report
    }

    /// Delete every tracked user concurrently and confirm each deletion
    pub async fn purge(&self, client: &AsyncUsersApiClient) -> CleanupReport {
        let ids = self.take();
        let results = join_all(ids.iter().map(|user_id| async move {
            match client.delete_user(user_id).await {
                Ok(_) => Ok(client.wait_until_deleted(user_id).await),
                Err(e) => Err(e.to_string()),
            }
        }))
        .await;

        let mut report = CleanupReport::default();
        for (user_id, result) in ids.into_iter().zip(results) {
            report.record(user_id, result);
        }
        report
    }
}
