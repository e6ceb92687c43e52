//! Async Users API client
//!
//! Backoff and poll waits run on the tokio timer. With a cancellation
//! handle attached, an in-flight request is abandoned as soon as the handle
//! fires.

use std::future::Future;

use reqwest::{Client, Method};
use resilient_api_core::poll::{DeletionPoller, PollOutcome, Presence};
use resilient_api_core::retry::{Cancellation, RetryExecutorBuilder, TracingObserver};
use resilient_api_core::types::{PollPolicy, RetryPolicy, RuntimeConfig};
use serde_json::Value;

use crate::error::{ApiError, ApiResult};
use crate::response::{
    collection_url, default_headers, into_users, not_found_as_none, parse_body,
    presence_from_status,
};

/// Async client for the Users collection
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct AsyncUsersApiClient {
    http: Client,
    base_url: String,
    retry: RetryPolicy,
    poll: PollPolicy,
    cancel: Option<Cancellation>,
}

impl AsyncUsersApiClient {
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

    /// Make every operation and wait of this client cancellable
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

    async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
    ) -> Result<Option<Value>, ApiError> {
        tracing::debug!(method = %method, url = %url, "sending request");

        let mut request = self.http.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(ApiError::from_transport)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(ApiError::from_transport)?;
        parse_body(status, body)
    }

    async fn fetch_optional(&self, url: &str) -> Result<Option<Value>, ApiError> {
        not_found_as_none(self.send(Method::GET, url, None).await)
    }

    async fn send_delete(&self, url: &str) -> Result<bool, ApiError> {
        match self.send(Method::DELETE, url, None).await {
            Ok(_) => Ok(true),
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(err),
        }
    }

    async fn fetch_users(&self) -> Result<Vec<Value>, ApiError> {
        self.fetch_optional(&self.base_url).await.and_then(into_users)
    }

    async fn retried<T, F, Fut>(&self, operation: &str, op: F) -> ApiResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let executor = RetryExecutorBuilder::new()
            .with_policy(self.retry.clone())
            .with_observer(TracingObserver::new(operation))
            .build();

        match &self.cancel {
            Some(cancel) => executor.execute_with_cancel(cancel, op).await,
            None => executor.execute(op).await,
        }
    }

    /// POST a new user; returns the created user as echoed by the server
    pub async fn create_user(&self, payload: &Value) -> ApiResult<Option<Value>> {
        let created = self
            .retried("create_user", || {
                self.send(Method::POST, &self.base_url, Some(payload))
            })
            .await?;

        if let Some(id) = created.as_ref().and_then(|user| user.get("id")) {
            tracing::info!(user_id = %id, "created user");
        }
        Ok(created)
    }

    /// Fetch one user; `None` if the server answers 404
    pub async fn get_user(&self, user_id: &str) -> ApiResult<Option<Value>> {
        let url = self.user_url(user_id);
        self.retried("get_user", || self.fetch_optional(&url)).await
    }

    pub async fn patch_user(&self, user_id: &str, payload: &Value) -> ApiResult<Option<Value>> {
        let url = self.user_url(user_id);
        self.retried("patch_user", || {
            self.send(Method::PATCH, &url, Some(payload))
        })
        .await
    }

    /// Delete one user
    ///
    /// Returns `false` when the user was already gone (404).
    pub async fn delete_user(&self, user_id: &str) -> ApiResult<bool> {
        let url = self.user_url(user_id);
        let deleted = self
            .retried("delete_user", || self.send_delete(&url))
            .await?;

        tracing::info!(user_id = %user_id, already_gone = !deleted, "deleted user");
        Ok(deleted)
    }

    /// List every user; a 404 on the collection is an empty list
    pub async fn list_users(&self) -> ApiResult<Vec<Value>> {
        self.retried("list_users", || self.fetch_users()).await
    }

    /// Probe existence once, without retry
    pub async fn user_presence(&self, user_id: &str) -> Presence {
        let status = self
            .http
            .get(self.user_url(user_id))
            .send()
            .await
            .map(|response| response.status().as_u16())
            .map_err(ApiError::from_transport);
        presence_from_status(status)
    }

    /// Poll until the user is gone, using the client's poll policy
    pub async fn wait_until_deleted(&self, user_id: &str) -> PollOutcome {
        self.wait_until_deleted_with(user_id, &self.poll).await
    }

    pub async fn wait_until_deleted_with(&self, user_id: &str, policy: &PollPolicy) -> PollOutcome {
        let poller = DeletionPoller::new(policy.clone());
        let check = || self.user_presence(user_id);

        match &self.cancel {
            Some(cancel) => poller.wait_with_cancel(cancel, user_id, check).await,
            None => poller.wait(user_id, check).await,
        }
    }
}
