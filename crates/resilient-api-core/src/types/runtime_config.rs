//! Runtime configuration types for operational parameters
//!
//! These types control the Users API endpoint, the retry policy applied to
//! every HTTP operation, and the deletion polling behaviour.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Error, Result};

/// Complete runtime configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RuntimeConfig {
    /// Users API endpoint settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Retry policy applied to API operations
    #[serde(default)]
    pub retry: RetryPolicy,

    /// Deletion polling policy
    #[serde(default)]
    pub polling: PollPolicy,
}

impl RuntimeConfig {
    /// Check the invariants every policy must hold before use
    pub fn validate(&self) -> Result<()> {
        self.api.validate()?;
        self.retry.validate()?;
        self.polling.validate()?;
        Ok(())
    }
}

/// Users API endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ApiConfig {
    /// Users collection URL, e.g. `https://host/api/v1/users`
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer token sent with every request, if set
    #[serde(default)]
    pub token: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// User agent string for HTTP requests
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: None,
            timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl ApiConfig {
    /// Request timeout as a `Duration`
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(Error::invalid_policy("api.base-url", "must not be empty"));
        }
        if self.timeout_secs == 0 {
            return Err(Error::invalid_policy("api.timeout-secs", "must be at least 1"));
        }
        Ok(())
    }
}

fn default_base_url() -> String {
    "http://localhost:3000/api/v1/users".to_string()
}
fn default_timeout() -> u64 {
    5
}
fn default_user_agent() -> String {
    format!(
        "resilient-api/{} ({}; {})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}

/// Retry policy for API operations
///
/// The delay before attempt `k + 1` is `min(initial_delay * 2^k, max_delay)`
/// where `k` counts the failed attempts so far.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RetryPolicy {
    /// Total number of tries, including the first one
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry, in milliseconds
    #[serde(default = "default_initial_delay")]
    pub initial_delay_ms: u64,

    /// Upper bound for any single delay, in milliseconds
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay(),
            max_delay_ms: default_max_delay(),
        }
    }
}

impl RetryPolicy {
    /// Build a policy from durations
    pub fn new(max_attempts: u32, initial_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay_ms: initial_delay.as_millis() as u64,
            max_delay_ms: max_delay.as_millis() as u64,
        }
    }

    /// Set the total number of attempts
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    /// Reject policies that could never run an attempt
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(Error::invalid_policy("retry.max-attempts", "must be at least 1"));
        }
        Ok(())
    }
}

fn default_max_attempts() -> u32 {
    4
}
fn default_initial_delay() -> u64 {
    2000
}
fn default_max_delay() -> u64 {
    10000
}

/// What the deletion poller reports once its poll budget is spent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExhaustionPolicy {
    /// Report failure: deletion could not be verified
    #[default]
    Strict,

    /// Assume the resource is gone and report success
    BestEffort,
}

impl FromStr for ExhaustionPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "best-effort" | "best_effort" => Ok(Self::BestEffort),
            other => Err(Error::invalid_policy(
                "polling.exhaustion",
                format!("'{}' is neither 'strict' nor 'best-effort'", other),
            )),
        }
    }
}

impl fmt::Display for ExhaustionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Strict => write!(f, "strict"),
            Self::BestEffort => write!(f, "best-effort"),
        }
    }
}

/// Deletion polling policy
///
/// Polls are spaced by a fixed delay, never exponential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PollPolicy {
    /// Maximum number of existence checks
    #[serde(default = "default_poll_retries")]
    pub retries: u32,

    /// Fixed delay between checks, in milliseconds
    #[serde(default = "default_poll_delay")]
    pub delay_ms: u64,

    /// Result reported when every check was inconclusive
    #[serde(default)]
    pub exhaustion: ExhaustionPolicy,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            retries: default_poll_retries(),
            delay_ms: default_poll_delay(),
            exhaustion: ExhaustionPolicy::default(),
        }
    }
}

impl PollPolicy {
    /// Build a strict policy from a retry bound and a delay
    pub fn new(retries: u32, delay: Duration) -> Self {
        Self {
            retries,
            delay_ms: delay.as_millis() as u64,
            exhaustion: ExhaustionPolicy::Strict,
        }
    }

    /// Switch to optimistic success on exhaustion
    pub fn best_effort(mut self) -> Self {
        self.exhaustion = ExhaustionPolicy::BestEffort;
        self
    }

    pub fn with_exhaustion(mut self, exhaustion: ExhaustionPolicy) -> Self {
        self.exhaustion = exhaustion;
        self
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.retries == 0 {
            return Err(Error::invalid_policy("polling.retries", "must be at least 1"));
        }
        Ok(())
    }
}

fn default_poll_retries() -> u32 {
    5
}
fn default_poll_delay() -> u64 {
    1000
}
