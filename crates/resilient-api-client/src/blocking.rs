//! Blocking Users API client
//!
//! Waits (retry backoff, deletion polling) park the calling thread. Do not
//! construct or use this client from inside an async task; move it to a
//! blocking thread instead.

use reqwest::blocking::Client;
use reqwest::Method;
use resilient_api_core::poll::{DeletionPoller, PollOutcome, Presence};
use resilient_api_core::retry::{Cancellation, RetryExecutorBuilder, TracingObserver};
use resilient_api_core::types::{PollPolicy, RetryPolicy, RuntimeConfig};
use serde_json::Value;

use crate::error::{ApiError, ApiResult};
use crate::response::{
    collection_url, default_headers, into_users, not_found_as_none, parse_body,
    presence_from_status,
};

/// Blocking client for the Users collection
#[derive(Debug, Clone)]
pub struct UsersApiClient {
    http: Client,
    base_url: String,
    retry: RetryPolicy,
    poll: PollPolicy,
    cancel: Option<Cancellation>,
}

impl UsersApiClient {
    /// Build a client from runtime configuration
    pub fn new(config: &RuntimeConfig) -> Result<Self, ApiError> {
        let http = Client::builder()
            .user_agent(&config.api.user_agent)
            .timeout(config.api.timeout())
            .default_headers(default_headers(&config.api)?)
            .build()
            .map_err(|e| ApiError::invalid_request(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: collection_url(&config.api),
            retry: config.retry.clone(),
            poll: config.polling.clone(),
            cancel: None,
        })
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    pub fn with_poll_policy(mut self, policy: PollPolicy) -> Self {
        self.poll = policy;
        self
    }

    /// Make retry backoff and deletion polling interruptible by `cancel`
    pub fn with_cancellation(mut self, cancel: Cancellation) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn poll_policy(&self) -> &PollPolicy {
        &self.poll
    }

    fn user_url(&self, user_id: &str) -> String {
        format!("{}/{}", self.base_url, user_id)
    }

    fn send(&self, method: Method, url: &str, body: Option<&Value>) -> Result<Option<Value>, ApiError> {
        tracing::debug!(method = %method, url = %url, "sending request");

        let mut request = self.http.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().map_err(ApiError::from_transport)?;
        let status = response.status().as_u16();
        let body = response.text().map_err(ApiError::from_transport)?;
        parse_body(status, body)
    }

    fn retried<T, F>(&self, operation: &str, op: F) -> ApiResult<T>
    where
        F: FnMut() -> Result<T, ApiError>,
    {
        let executor = RetryExecutorBuilder::new()
            .with_policy(self.retry.clone())
            .with_observer(TracingObserver::new(operation))
            .build_blocking();

        match &self.cancel {
            Some(cancel) => executor.execute_with_cancel(cancel, op),
            None => executor.execute(op),
        }
    }

    /// POST a new user; returns the created user as echoed by the server
    pub fn create_user(&self, payload: &Value) -> ApiResult<Option<Value>> {
        let created = self.retried("create_user", || {
            self.send(Method::POST, &self.base_url, Some(payload))
        })?;

        if let Some(id) = created.as_ref().and_then(|user| user.get("id")) {
            tracing::info!(user_id = %id, "created user");
        }
        Ok(created)
    }

    /// Fetch one user; `None` if the server answers 404
    pub fn get_user(&self, user_id: &str) -> ApiResult<Option<Value>> {
        let url = self.user_url(user_id);
        self.retried("get_user", || {
            not_found_as_none(self.send(Method::GET, &url, None))
        })
    }

    pub fn patch_user(&self, user_id: &str, payload: &Value) -> ApiResult<Option<Value>> {
        let url = self.user_url(user_id);
        self.retried("patch_user", || {
            self.send(Method::PATCH, &url, Some(payload))
        })
    }

    /// Delete one user
    ///
    /// Returns `false` when the user was already gone (404).
    pub fn delete_user(&self, user_id: &str) -> ApiResult<bool> {
        let url = self.user_url(user_id);
        let deleted = self.retried("delete_user", || {
            match self.send(Method::DELETE, &url, None) {
                Ok(_) => Ok(true),
                Err(err) if err.is_not_found() => Ok(false),
                Err(err) => Err(err),
            }
        })?;

        tracing::info!(user_id = %user_id, already_gone = !deleted, "deleted user");
        Ok(deleted)
    }

    /// List every user; a 404 on the collection is an empty list
    pub fn list_users(&self) -> ApiResult<Vec<Value>> {
        self.retried("list_users", || {
            not_found_as_none(self.send(Method::GET, &self.base_url, None)).and_then(into_users)
        })
    }

    /// Probe existence once, without retry
    pub fn user_presence(&self, user_id: &str) -> Presence {
        let status = self
            .http
            .get(self.user_url(user_id))
            .send()
            .map(|response| response.status().as_u16())
            .map_err(ApiError::from_transport);
        presence_from_status(status)
    }

    /// Poll until the user is gone, using the client's poll policy
    pub fn wait_until_deleted(&self, user_id: &str) -> PollOutcome {
        self.wait_until_deleted_with(user_id, &self.poll)
    }

    pub fn wait_until_deleted_with(&self, user_id: &str, policy: &PollPolicy) -> PollOutcome {
        let poller = DeletionPoller::new(policy.clone());
        let check = || self.user_presence(user_id);

        match &self.cancel {
            Some(cancel) => poller.wait_blocking_with_cancel(cancel, user_id, check),
            None => poller.wait_blocking(user_id, check),
        }
    }
}
