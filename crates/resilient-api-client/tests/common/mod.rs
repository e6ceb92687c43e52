//! Common test infrastructure for resilient-api-client tests
//!
//! # Usage
//!
//! In your test file, add:
//! ```ignore
//! mod common;
//! use common::*;
//! ```
//!
//! # Modules
//!
//! - `backend`: in-memory Users API served through wiremock
//! - `mock_server`: single-endpoint wiremock helpers for scripted responses

// Each test binary uses a different subset of these helpers
#![allow(dead_code)]
#![allow(unused_imports)]

pub mod backend;
pub mod mock_server;

pub use backend::*;
pub use mock_server::*;

use std::time::Duration;

use resilient_api_core::types::{ApiConfig, PollPolicy, RetryPolicy, RuntimeConfig};

/// Collection path served by the mock backend
pub const USERS_PATH: &str = "/users";

/// Retry policy with millisecond delays: 4 attempts, 1ms doubling to 5ms
pub fn fast_retry_policy() -> RetryPolicy {
    RetryPolicy::new(4, Duration::from_millis(1), Duration::from_millis(5))
}

/// Strict poll policy with millisecond delays
pub fn fast_poll_policy(retries: u32) -> PollPolicy {
    PollPolicy::new(retries, Duration::from_millis(2))
}

/// Runtime config pointing at `base_url` with fast retry and polling
pub fn test_config(base_url: &str) -> RuntimeConfig {
    RuntimeConfig {
        api: ApiConfig {
            base_url: base_url.to_string(),
            timeout_secs: 5,
            ..ApiConfig::default()
        },
        retry: fast_retry_policy(),
        polling: fast_poll_policy(5),
    }
}

/// Users collection URL on a mock server
pub fn users_url(server_uri: &str) -> String {
    format!("{}{}", server_uri, USERS_PATH)
}

/// Run blocking-client code off the async runtime
///
/// `reqwest::blocking` must not be created, used or dropped on a runtime
/// worker thread.
pub async fn run_blocking<T, F>(f: F) -> T
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .expect("blocking task panicked")
}
