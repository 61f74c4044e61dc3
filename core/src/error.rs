//! Error types for the task API client.
//!
//! # Design
//! `NotFound` gets a dedicated variant so callers can tell "the task is
//! already gone" apart from other failures without matching on message
//! text. Every other non-2xx response lands in `Http` with its status code.
//! `Display` yields only the human-readable message so it can be shown to
//! a user as-is.

use thiserror::Error;

/// Errors surfaced by the client, the transport, and the controller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The request never produced an HTTP response.
    #[error("network failure: {0}")]
    Network(String),

    /// The server returned 404.
    #[error("{message}")]
    NotFound { message: String },

    /// The server returned a non-2xx status other than 404.
    #[error("{message}")]
    Http { status: u16, message: String },

    /// Input rejected locally before any request was issued.
    #[error("{0}")]
    Validation(String),

    /// The response body could not be decoded into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl ApiError {
    /// HTTP status behind this error, if the server produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::NotFound { .. } => Some(404),
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_the_bare_message() {
        let err = ApiError::Http {
            status: 500,
            message: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "boom");
        assert_eq!(err.status(), Some(500));
    }

    #[test]
    fn not_found_reports_404() {
        let err = ApiError::NotFound {
            message: "gone".to_string(),
        };
        assert!(err.is_not_found());
        assert_eq!(err.status(), Some(404));
        assert_eq!(ApiError::Validation("x".to_string()).status(), None);
    }
}
