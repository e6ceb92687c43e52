//! Response interpretation shared by the blocking and async clients

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use resilient_api_core::poll::Presence;
use resilient_api_core::types::ApiConfig;
use serde_json::Value;

use crate::error::ApiError;

/// Headers sent with every request
pub(crate) fn default_headers(api: &ApiConfig) -> Result<HeaderMap, ApiError> {
    let mut headers = HeaderMap::new();
    if let Some(token) = &api.token {
        let value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| ApiError::invalid_request("API token is not a valid header value"))?;
        headers.insert(AUTHORIZATION, value);
    }
    Ok(headers)
}

/// Collection URL without a trailing slash
pub(crate) fn collection_url(api: &ApiConfig) -> String {
    api.base_url.trim_end_matches('/').to_string()
}

/// Turn a status and body into JSON, or an `ApiError` for non-2xx
///
/// An empty success body yields `None`.
pub(crate) fn parse_body(status: u16, body: String) -> Result<Option<Value>, ApiError> {
    if !(200..300).contains(&status) {
        return Err(ApiError::Status { status, body });
    }
    if body.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(&body)
        .map(Some)
        .map_err(|e| ApiError::decode(format!("expected JSON: {}", e)))
}

/// Map a 404 to `None`, leave every other result untouched
pub(crate) fn not_found_as_none(
    result: Result<Option<Value>, ApiError>,
) -> Result<Option<Value>, ApiError> {
    match result {
        Err(err) if err.is_not_found() => Ok(None),
        other => other,
    }
}

/// Extract the user list from a collection response
pub(crate) fn into_users(body: Option<Value>) -> Result<Vec<Value>, ApiError> {
    match body {
        None => Ok(Vec::new()),
        Some(Value::Array(users)) => Ok(users),
        Some(other) => Err(ApiError::decode(format!(
            "expected a JSON array of users, got {}",
            json_kind(&other)
        ))),
    }
}

/// Tri-state existence from a single probe
pub(crate) fn presence_from_status(status: Result<u16, ApiError>) -> Presence {
    match status {
        Ok(404) => Presence::Absent,
        Ok(status) if (200..300).contains(&status) => Presence::Present,
        Ok(status) => {
            tracing::warn!(status = status, "unexpected status while probing existence");
            Presence::Inconclusive
        }
        Err(err) => {
            tracing::debug!(error = %err, "existence probe failed");
            Presence::Inconclusive
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
