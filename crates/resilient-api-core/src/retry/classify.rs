//! Failure classification
//!
//! The transport boundary tags every error with a [`FailureClass`]. The retry
//! engine only ever looks at that tag: network failures and server errors are
//! retried, everything else is fatal.

use std::io;

/// Where a failure came from, as seen by the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Connection refused or reset, timeout, DNS failure
    Network,

    /// HTTP response with a status of 500 or above
    Server(u16),

    /// HTTP response with a status below 500
    Client(u16),

    /// Anything else, such as an undecodable body or a malformed request
    Permanent,
}

impl FailureClass {
    /// Classify an HTTP error status
    pub fn from_status(status: u16) -> Self {
        if status >= 500 {
            FailureClass::Server(status)
        } else {
            FailureClass::Client(status)
        }
    }

    /// Whether another attempt may succeed without caller intervention
    pub fn is_retryable(self) -> bool {
        matches!(self, FailureClass::Network | FailureClass::Server(_))
    }

    /// HTTP status carried by the failure, if any
    pub fn status(self) -> Option<u16> {
        match self {
            FailureClass::Server(status) | FailureClass::Client(status) => Some(status),
            FailureClass::Network | FailureClass::Permanent => None,
        }
    }
}

/// Errors that know their own [`FailureClass`]
pub trait Classify {
    fn failure_class(&self) -> FailureClass;

    fn is_retryable(&self) -> bool {
        self.failure_class().is_retryable()
    }
}

impl Classify for FailureClass {
    fn failure_class(&self) -> FailureClass {
        *self
    }
}

impl Classify for io::Error {
    fn failure_class(&self) -> FailureClass {
        match self.kind() {
            io::ErrorKind::TimedOut
            | io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::NotConnected
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::AddrNotAvailable
            | io::ErrorKind::Interrupted
            | io::ErrorKind::UnexpectedEof => FailureClass::Network,
            _ => FailureClass::Permanent,
        }
    }
}

/// Result of a single attempt after classification
#[derive(Debug)]
pub enum Outcome<T, E> {
    Success(T),
    RetryableFailure(E),
    FatalFailure(E),
}

impl<T, E: Classify> Outcome<T, E> {
    /// Classify the raw result of one attempt
    pub fn from_result(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Outcome::Success(value),
            Err(err) if err.is_retryable() => Outcome::RetryableFailure(err),
            Err(err) => Outcome::FatalFailure(err),
        }
    }
}
