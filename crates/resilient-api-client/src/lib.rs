//! # resilient-api-client
//!
//! Thin clients for the Users REST API. Every CRUD call runs through the
//! retry engine from `resilient-api-core`; deletions can be confirmed with
//! the eventual-deletion poller.
//!
//! - [`UsersApiClient`]: blocking, built on `reqwest::blocking`
//! - [`AsyncUsersApiClient`]: async, built on `reqwest::Client`
//! - [`UserFactory`]: unique user payloads for tests and scenarios
//! - [`CleanupRegistry`]: tracks created users and purges them

mod async_client;
mod blocking;
mod cleanup;
mod error;
mod factory;
mod response;

pub use async_client::AsyncUsersApiClient;
pub use blocking::UsersApiClient;
pub use cleanup::{CleanupRegistry, CleanupReport};
pub use error::{ApiError, ApiResult};
pub use factory::UserFactory;
