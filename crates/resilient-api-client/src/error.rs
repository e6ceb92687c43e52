//! Transport boundary errors
//!
//! Every failure leaving the HTTP layer is an [`ApiError`], and each
//! variant maps to exactly one [`FailureClass`]. The retry engine never
//! looks at anything else.

use resilient_api_core::retry::{Classify, FailureClass, RetryError};
use thiserror::Error;

/// Result of a retried API operation
///
/// Exhaustion keeps the last `ApiError` and the attempt count; cancellation
/// is reported as its own variant.
pub type ApiResult<T> = std::result::Result<T, RetryError<ApiError>>;

#[derive(Error, Debug)]
pub enum ApiError {
    /// Connect failure, timeout, or a connection dropped mid-request
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    /// The server answered with a non-success status
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// A success response whose body is not the expected JSON
    #[error("invalid response body: {message}")]
    Decode { message: String },

    /// The request could not be built or the client is misconfigured
    #[error("invalid request: {message}")]
    InvalidRequest { message: String },
}

impl ApiError {
    /// Classify a `reqwest` error raised while sending or reading
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() || err.is_request() || err.is_body() {
            ApiError::Network(err)
        } else if err.is_decode() {
            ApiError::Decode {
                message: err.to_string(),
            }
        } else {
            ApiError::InvalidRequest {
                message: err.to_string(),
            }
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        ApiError::Decode {
            message: message.into(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        ApiError::InvalidRequest {
            message: message.into(),
        }
    }

    /// HTTP status of the response, if the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

impl Classify for ApiError {
    fn failure_class(&self) -> FailureClass {
        match self {
            ApiError::Network(_) => FailureClass::Network,
            ApiError::Status { status, .. } => FailureClass::from_status(*status),
            ApiError::Decode { .. } | ApiError::InvalidRequest { .. } => FailureClass::Permanent,
        }
    }
}
