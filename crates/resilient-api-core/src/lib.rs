//! # resilient-api-core
//!
//! Core library for the resilient Users API harness providing:
//! - Retry execution engine with exponential backoff (async and blocking)
//! - Eventual-deletion poller with explicit exhaustion modes
//! - Contract layer: user payload normalization and validation
//! - Runtime configuration with hierarchical loading

pub mod config;
pub mod contract;
pub mod error;
pub mod poll;
pub mod retry;
pub mod types;

pub use config::HierarchicalConfigLoader;
pub use error::{Error, Result};
pub use poll::{DeletionPoller, PollOutcome, Presence};
pub use retry::Cancellation;
pub use types::{ExhaustionPolicy, PollPolicy, RetryPolicy, RuntimeConfig};
