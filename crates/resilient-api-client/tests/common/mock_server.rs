//! Mock server helpers for scripted single-endpoint responses
//!
//! Use these when a test needs exact control over status codes; use
//! `UsersBackend` for stateful CRUD flows.

use serde_json::Value;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Respond to `verb path` with `status` at most `times` times
///
/// Mount a fallback afterwards to control what follows.
pub async fn mock_status_n_times(
    server: &MockServer,
    verb: &str,
    request_path: &str,
    status: u16,
    times: u64,
) {
    Mock::given(method(verb))
        .and(path(request_path))
        .respond_with(ResponseTemplate::new(status).set_body_string("scripted failure"))
        .up_to_n_times(times)
        .mount(server)
        .await;
}

/// Always respond to `verb path` with `status` and an empty body
pub async fn mock_status(server: &MockServer, verb: &str, request_path: &str, status: u16) {
    Mock::given(method(verb))
        .and(path(request_path))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Always respond to `verb path` with `status` and a JSON body
pub async fn mock_json(
    server: &MockServer,
    verb: &str,
    request_path: &str,
    status: u16,
    body: Value,
) {
    Mock::given(method(verb))
        .and(path(request_path))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}

/// A request path flaky with `fail_count` responses of `fail_status`, then `body`
pub async fn mock_flaky_json(
    server: &MockServer,
    verb: &str,
    request_path: &str,
    fail_status: u16,
    fail_count: u64,
    body: Value,
) {
    mock_status_n_times(server, verb, request_path, fail_status, fail_count).await;
    mock_json(server, verb, request_path, 200, body).await;
}

/// Number of requests the server has seen for `verb path`
pub async fn request_count(server: &MockServer, verb: &str, request_path: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.method.as_str() == verb && r.url.path() == request_path)
        .count()
}
