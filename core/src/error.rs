//! Error types for the API client.
//!
//! # Design
//! `ApiError` is the failure half of the envelope. Its `Display` output is the
//! human-readable string the hooks store in `RequestState::error`, so every
//! variant renders a message fit for a UI. Server-provided messages are passed
//! through verbatim; transport failures collapse to a generic message while
//! keeping the underlying cause as the error source for logging.

use thiserror::Error;

/// Generic message surfaced when no response was received.
pub const NETWORK_ERROR_MESSAGE: &str = "Network error occurred";

/// Failure of the transport itself: connection refused, DNS, TLS, reset.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("transport failure: {0}")]
pub struct TransportError(pub String);

/// Errors carried by the failure side of an `ApiResult`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No response was received.
    #[error("{}", NETWORK_ERROR_MESSAGE)]
    Network(#[from] TransportError),

    /// The server answered with a non-2xx status. `message` is the server's
    /// own message when the body carried one, otherwise a generic one.
    #[error("{message}")]
    Http { status: u16, message: String },

    /// A 2xx response whose body was not the expected JSON.
    #[error("Invalid JSON response: {0}")]
    InvalidJson(String),

    /// The request payload could not be serialized to JSON.
    #[error("Failed to serialize request body: {0}")]
    Serialization(String),

    /// A mutation was requested with a verb other than POST, PUT or DELETE.
    #[error("Unsupported method: {0}")]
    UnsupportedMethod(String),

    /// The background task running the request panicked or was cancelled.
    #[error("Request task failed: {0}")]
    TaskFailed(String),
}

impl ApiError {
    /// The string a UI renders for this failure.
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// HTTP status when the server answered, `None` otherwise.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}
