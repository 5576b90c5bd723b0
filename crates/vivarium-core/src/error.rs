//! Error types for vivarium-core.
//!
//! Protocol outcomes such as an expired session or an unchanged poll are
//! *not* errors; they are values of [`crate::session::Classified`]. This
//! enum covers the failures underneath that classification: the transport
//! could not complete a request, a body could not be decoded, or the engine
//! was configured with values it cannot run with.
//!
//! | Error Type | Where it surfaces |
//! |------------|-------------------|
//! | [`Error::Transport`] | Folded into `Classified::Unclassified` by the session guard |
//! | [`Error::Timeout`] | A request outlived the HTTP transport's timeout; unclassified |
//! | [`Error::Decode`] | Folded into `Classified::Unclassified` by the session guard |
//! | [`Error::Parse`] | A poll reading had an unreadable timestamp; unclassified |
//! | [`Error::InvalidUrl`] | Returned when constructing an HTTP transport |
//! | [`Error::InvalidConfig`] | Returned by [`crate::SyncOptions::validate`] |

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur inside the sync engine.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The request could not be delivered or the response could not be read.
    #[error("Request to {path} failed: {reason}")]
    Transport {
        /// Endpoint path the request was sent to.
        path: String,
        /// Description of the failure.
        reason: String,
    },

    /// HTTP client error.
    #[cfg(feature = "http")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A response body was not the JSON the endpoint promises.
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// A value delivered by the backend failed validation.
    #[error(transparent)]
    Parse(#[from] vivarium_types::ParseError),

    /// Backend URL is malformed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Operation timed out.
    #[error("Operation '{operation}' timed out after {duration:?}")]
    Timeout {
        /// The operation that timed out.
        operation: String,
        /// The timeout duration.
        duration: Duration,
    },
}

impl Error {
    /// Create a transport failure for an endpoint path.
    pub fn transport(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Transport {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    /// Create a timeout error with operation context.
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }
}

/// Result type alias using vivarium-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::transport("/reload", "connection refused");
        assert_eq!(err.to_string(), "Request to /reload failed: connection refused");

        let err = Error::invalid_config("poll_interval must be > 0");
        assert_eq!(
            err.to_string(),
            "Invalid configuration: poll_interval must be > 0"
        );

        let err = Error::timeout("poll", Duration::from_secs(10));
        assert!(err.to_string().contains("poll"));
        assert!(err.to_string().contains("10s"));
    }

    #[test]
    fn test_decode_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn test_parse_error_conversion() {
        let err: Error = vivarium_types::ParseError::EmptyDeviceId.into();
        assert!(matches!(err, Error::Parse(_)));
        assert_eq!(err.to_string(), "Device identifier cannot be empty");
    }
}
