//! Concurrent use of both clients
//!
//! Each call owns its attempt counter and backoff; these tests check that
//! parallel callers do not interfere and that the backend sees every user.

mod common;

use common::*;
use futures::future::join_all;
use resilient_api_client::{AsyncUsersApiClient, UserFactory, UsersApiClient};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use wiremock::MockServer;

fn ids_of(users: &[Value]) -> HashSet<String> {
    users
        .iter()
        .map(|u| u["id"].as_str().expect("id is a string").to_string())
        .collect()
}

#[tokio::test(flavor = "multi_thread")]
async fn test_threaded_creation_yields_unique_ids() {
    let server = MockServer::start().await;
    let backend = UsersBackend::new();
    backend.mount(&server).await;
    let url = users_url(&server.uri());

    let created = run_blocking(move || {
        let client = UsersApiClient::new(&test_config(&url)).unwrap();
        let factory = UserFactory::new();

        thread::scope(|s| {
            let handles: Vec<_> = (0..10)
                .map(|_| {
                    s.spawn(|| {
                        client
                            .create_user(&factory.create_user_payload())
                            .unwrap()
                            .unwrap()
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap())
                .collect::<Vec<_>>()
        })
    })
    .await;

    assert_eq!(ids_of(&created).len(), 10);
    assert_eq!(backend.user_count(), 10);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_threaded_creation_survives_server_errors() {
    let server = MockServer::start().await;
    let backend = UsersBackend::new();
    backend.mount(&server).await;
    backend.fail_next(&[503, 500, 502]);
    let url = users_url(&server.uri());

    let created = run_blocking(move || {
        let client = UsersApiClient::new(&test_config(&url)).unwrap();
        let factory = UserFactory::new();

        thread::scope(|s| {
            let handles: Vec<_> = (0..5)
                .map(|_| s.spawn(|| client.create_user(&factory.create_user_payload())))
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap())
                .collect::<Vec<_>>()
        })
    })
    .await;

    // Three failures cannot exhaust any caller's four attempts
    assert!(created.iter().all(|r| r.is_ok()));
    assert_eq!(backend.user_count(), 5);
}

#[tokio::test]
async fn test_async_burst_creation() {
    let server = MockServer::start().await;
    let backend = UsersBackend::new();
    backend.mount(&server).await;
    let client = AsyncUsersApiClient::new(&test_config(&users_url(&server.uri()))).unwrap();
    let factory = UserFactory::new();

    let payloads: Vec<Value> = (0..20).map(|_| factory.create_user_payload()).collect();
    let results = join_all(payloads.iter().map(|p| client.create_user(p))).await;

    let created: Vec<Value> = results
        .into_iter()
        .map(|r| r.unwrap().unwrap())
        .collect();
    assert_eq!(ids_of(&created).len(), 20);

    let listed = client.list_users().await.unwrap();
    assert_eq!(ids_of(&listed), ids_of(&created));
}

#[tokio::test]
async fn test_concurrent_patches_on_one_user() {
    let server = MockServer::start().await;
    let backend = UsersBackend::new();
    backend.mount(&server).await;
    let client = AsyncUsersApiClient::new(&test_config(&users_url(&server.uri()))).unwrap();
    let id = backend.insert(json!({"name": "contended", "email": "c@example.com"}));

    let names: Vec<String> = (0..8).map(|i| format!("name_{}", i)).collect();
    let payloads: Vec<Value> = names.iter().map(|name| json!({ "name": name })).collect();
    let results = join_all(payloads.iter().map(|p| client.patch_user(&id, p))).await;

    assert!(results.iter().all(|r| r.is_ok()));

    let final_name = backend.user(&id).unwrap()["name"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(names.contains(&final_name));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_spawned_tasks_share_cloned_client() {
    let server = MockServer::start().await;
    let backend = UsersBackend::new();
    backend.mount(&server).await;
    let client = AsyncUsersApiClient::new(&test_config(&users_url(&server.uri()))).unwrap();
    let factory = Arc::new(UserFactory::new());

    let handles: Vec<_> = (0..6)
        .map(|_| {
            let client = client.clone();
            let factory = Arc::clone(&factory);
            tokio::spawn(async move {
                let created = client
                    .create_user(&factory.create_user_payload())
                    .await
                    .unwrap()
                    .unwrap();
                let id = created["id"].as_str().unwrap().to_string();
                client.delete_user(&id).await.unwrap();
                client.wait_until_deleted(&id).await
            })
        })
        .collect();

    for outcome in join_all(handles).await {
        assert!(outcome.unwrap().is_success());
    }
    assert_eq!(backend.user_count(), 0);
}
