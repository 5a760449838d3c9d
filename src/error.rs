//! Error types for request objects and transports

use std::fmt;
use thiserror::Error;

/// Result type for this crate
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned synchronously from caller-facing operations.
///
/// These always describe local misuse or invalid input. Network failures are
/// never returned this way; they travel through the event channel as an
/// [`HttpFailure`].
#[derive(Debug, Error)]
pub enum Error {
    /// The request object is in the wrong state for the operation
    #[error("Failed to execute '{operation}' on 'XMLHttpRequest': The object's state must be OPENED.")]
    InvalidState {
        /// Name of the rejected operation
        operation: &'static str,
    },

    /// The response type is not one of the supported values
    #[error("Response type of '{0}' not supported.")]
    UnsupportedResponseType(String),

    /// The method is not a valid HTTP token
    #[error("Invalid HTTP method: {0}")]
    InvalidMethod(String),

    /// The URL could not be parsed
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// A header name or value cannot be sent on the wire
    #[error("Invalid header: {name}")]
    InvalidHeader {
        /// Offending header name
        name: String,
    },

    /// JSON serialization error while preparing a request body
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub(crate) fn invalid_state(operation: &'static str) -> Self {
        Error::InvalidState { operation }
    }
}

/// Discriminates the ways a transport can fail a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Network or protocol failure
    Error,
    /// The transport's time budget was exceeded
    Timeout,
    /// The request was cancelled
    Cancelled,
}

/// Typed rejection of a transport future.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpFailure {
    /// What went wrong
    pub kind: FailureKind,
    /// Human readable detail, when the transport supplied one
    pub message: Option<String>,
}

impl HttpFailure {
    /// Generic failure with a message
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Error,
            message: Some(message.into()),
        }
    }

    /// Timeout failure
    pub fn timeout() -> Self {
        Self {
            kind: FailureKind::Timeout,
            message: None,
        }
    }

    /// Cancellation failure
    pub fn cancelled() -> Self {
        Self {
            kind: FailureKind::Cancelled,
            message: None,
        }
    }

    /// Attach a message to the failure
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl fmt::Display for HttpFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.kind {
            FailureKind::Error => "Request failed",
            FailureKind::Timeout => "Request timed out",
            FailureKind::Cancelled => "Request was cancelled",
        };
        match &self.message {
            Some(message) => write!(f, "{}: {}", label, message),
            None => f.write_str(label),
        }
    }
}

impl std::error::Error for HttpFailure {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_state_message() {
        let err = Error::invalid_state("send");
        assert_eq!(
            err.to_string(),
            "Failed to execute 'send' on 'XMLHttpRequest': The object's state must be OPENED."
        );
    }

    #[test]
    fn test_failure_display() {
        assert_eq!(HttpFailure::timeout().to_string(), "Request timed out");
        assert_eq!(
            HttpFailure::error("connection reset").to_string(),
            "Request failed: connection reset"
        );
        assert_eq!(
            HttpFailure::cancelled().with_message("user").kind,
            FailureKind::Cancelled
        );
    }
}
