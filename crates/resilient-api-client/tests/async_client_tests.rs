//! Async client tests against wiremock and the in-memory backend

mod common;

use common::*;
use resilient_api_client::{ApiError, AsyncUsersApiClient};
use resilient_api_core::poll::PollOutcome;
use resilient_api_core::retry::Cancellation;
use resilient_api_core::types::RetryPolicy;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(base_url: &str) -> AsyncUsersApiClient {
    AsyncUsersApiClient::new(&test_config(base_url)).expect("client builds")
}

async fn backend_server() -> (MockServer, UsersBackend, AsyncUsersApiClient) {
    let server = MockServer::start().await;
    let backend = UsersBackend::new();
    backend.mount(&server).await;
    let client = client_for(&users_url(&server.uri()));
    (server, backend, client)
}

#[tokio::test]
async fn test_create_fetch_patch_delete() {
    let (_server, backend, client) = backend_server().await;

    let created = client
        .create_user(&json!({"name": "bob", "email": "bob@example.com"}))
        .await
        .unwrap()
        .expect("created user echoed");
    let id = created["id"].as_str().unwrap().to_string();
    assert!(backend.contains(&id));

    let fetched = client.get_user(&id).await.unwrap();
    assert_eq!(fetched, Some(created));

    let patched = client
        .patch_user(&id, &json!({"name": "renamed_user"}))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(patched["name"], "renamed_user");
    assert_eq!(backend.user(&id).unwrap()["name"], "renamed_user");

    assert!(client.delete_user(&id).await.unwrap());
    assert_eq!(
        client.wait_until_deleted(&id).await,
        PollOutcome::Confirmed { polls: 1 }
    );
    assert_eq!(client.get_user(&id).await.unwrap(), None);
}

#[tokio::test]
async fn test_scripted_server_errors_are_absorbed() {
    let (server, backend, client) = backend_server().await;
    backend.fail_next(&[502, 503, 500]);

    let created = client.create_user(&json!({"name": "flaky"})).await.unwrap();

    assert!(created.is_some());
    assert_eq!(backend.user_count(), 1);
    assert_eq!(request_count(&server, "POST", USERS_PATH).await, 4);
}

#[tokio::test]
async fn test_exhaustion_keeps_last_error() {
    let (_server, backend, client) = backend_server().await;
    backend.fail_next(&[500, 502, 503, 504]);

    let err = client.list_users().await.unwrap_err();

    assert!(err.is_exhausted());
    assert_eq!(err.attempts(), 4);
    assert_eq!(err.source_ref().and_then(ApiError::status), Some(504));
}

#[tokio::test]
async fn test_not_found_on_patch_is_fatal() {
    let (server, _backend, client) = backend_server().await;

    let err = client
        .patch_user("missing", &json!({"name": "x"}))
        .await
        .unwrap_err();

    assert!(err.is_fatal());
    assert_eq!(err.source_ref().and_then(ApiError::status), Some(404));
    assert_eq!(request_count(&server, "PATCH", "/users/missing").await, 1);
}

#[tokio::test]
async fn test_deletion_lag_is_polled_through() {
    let server = MockServer::start().await;
    let backend = UsersBackend::new().with_deletion_lag(3);
    backend.mount(&server).await;
    let client = client_for(&users_url(&server.uri()));
    let id = backend.insert(json!({"name": "slow"}));

    client.delete_user(&id).await.unwrap();
    let outcome = client.wait_until_deleted(&id).await;

    assert_eq!(outcome, PollOutcome::Confirmed { polls: 4 });
}

#[tokio::test]
async fn test_strict_and_best_effort_exhaustion() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/1"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let client = client_for(&users_url(&server.uri()));

    let strict = client
        .wait_until_deleted_with("1", &fast_poll_policy(3))
        .await;
    let best_effort = client
        .wait_until_deleted_with("1", &fast_poll_policy(3).best_effort())
        .await;

    assert_eq!(strict, PollOutcome::Unverified { polls: 3 });
    assert_eq!(best_effort, PollOutcome::Assumed { polls: 3 });
    assert!(best_effort.is_success());
}

#[tokio::test]
async fn test_cancel_interrupts_in_flight_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"id": "1"}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let cancel = Cancellation::new();
    let client = client_for(&users_url(&server.uri())).with_cancellation(cancel.clone());

    let remote = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        remote.cancel();
    });

    let started = std::time::Instant::now();
    let err = client.get_user("1").await.unwrap_err();

    assert!(err.is_cancelled());
    assert_eq!(err.attempts(), 1);
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[tokio::test]
async fn test_cancel_interrupts_backoff() {
    let (_server, backend, client) = backend_server().await;
    backend.fail_next(&[503]);

    let cancel = Cancellation::new();
    let client = client
        .with_retry_policy(RetryPolicy::new(
            3,
            Duration::from_secs(60),
            Duration::from_secs(60),
        ))
        .with_cancellation(cancel.clone());

    let remote = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        remote.cancel();
    });

    let err = client.list_users().await.unwrap_err();

    assert!(err.is_cancelled());
    assert_eq!(err.source_ref().and_then(ApiError::status), Some(503));
}

#[tokio::test]
async fn test_list_users_returns_all() {
    let (_server, backend, client) = backend_server().await;
    backend.insert(json!({"name": "a", "email": "a@example.com"}));
    backend.insert(json!({"name": "b", "email": "b@example.com"}));

    let users = client.list_users().await.unwrap();

    let names: Vec<_> = users.iter().map(|u| u["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["a", "b"]);
}

#[tokio::test]
async fn test_cancel_interrupts_in_flight_deletion_check() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"id": "1"}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let cancel = Cancellation::new();
    let client = client_for(&users_url(&server.uri())).with_cancellation(cancel.clone());

    let remote = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        remote.cancel();
    });

    let started = std::time::Instant::now();
    let outcome = client.wait_until_deleted("1").await;

    assert_eq!(outcome, PollOutcome::Cancelled { polls: 1 });
    assert!(started.elapsed() < Duration::from_secs(3));
}
