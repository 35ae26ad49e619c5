//! Error types for the client library.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur when calling the BoldChat API.
///
/// Token derivation and URL construction cannot fail, so every variant
/// originates in the request layer: transport, protocol, or application.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ClientError {
    /// Network or HTTP request failure.
    ///
    /// Indicates issues like DNS resolution, connection failures, or socket errors.
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// Middleware layer error.
    ///
    /// Errors from the retry middleware wrapping the transport.
    #[error("Middleware error: {0}")]
    MiddlewareError(#[from] reqwest_middleware::Error),

    /// Request timeout.
    #[error("Timeout error")]
    TimeoutError,

    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    HttpStatus {
        /// Status code of the response.
        status: StatusCode,
        /// Response body, possibly empty.
        body: String,
    },

    /// The API reported a `Status` other than `success`.
    ///
    /// Carries the vendor's `Message` text.
    #[error("API error: {0}")]
    ApiError(String),

    /// JSON deserialization error.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// The API reported success but the payload is unusable.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Client configuration issue.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Malformed request, rejected before it was sent.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// No record matched a lookup.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl ClientError {
    /// Check if this error is potentially retryable.
    ///
    /// Returns `true` for network errors, timeouts, and 5xx or 429 responses.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::NetworkError(_) | Self::MiddlewareError(_) | Self::TimeoutError => true,
            Self::HttpStatus { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            _ => false,
        }
    }

    /// Check if the vendor rejected the call with an error status.
    pub const fn is_api_error(&self) -> bool {
        matches!(self, Self::ApiError(_))
    }

    /// HTTP status of the response, if the server answered.
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Builds the error for a failed request, separating timeouts from other
    /// transport failures.
    pub(crate) fn from_transport(err: reqwest_middleware::Error) -> Self {
        match err {
            reqwest_middleware::Error::Reqwest(e) if e.is_timeout() => Self::TimeoutError,
            reqwest_middleware::Error::Reqwest(e) => Self::NetworkError(e),
            other => Self::MiddlewareError(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(ClientError::TimeoutError.is_retryable());
        assert!(
            ClientError::HttpStatus {
                status: StatusCode::BAD_GATEWAY,
                body: String::new(),
            }
            .is_retryable()
        );
        assert!(
            ClientError::HttpStatus {
                status: StatusCode::TOO_MANY_REQUESTS,
                body: String::new(),
            }
            .is_retryable()
        );
        assert!(
            !ClientError::HttpStatus {
                status: StatusCode::FORBIDDEN,
                body: String::new(),
            }
            .is_retryable()
        );
        assert!(!ClientError::ApiError("Invalid auth".to_string()).is_retryable());
        assert!(!ClientError::InvalidRequest("x".to_string()).is_retryable());
    }

    #[test]
    fn test_api_error_display() {
        let err = ClientError::ApiError("Invalid account".to_string());
        assert!(err.is_api_error());
        assert_eq!(err.to_string(), "API error: Invalid account");
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_http_status_accessor() {
        let err = ClientError::HttpStatus {
            status: StatusCode::NOT_FOUND,
            body: "missing".to_string(),
        };
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
        assert_eq!(err.to_string(), "HTTP 404 Not Found: missing");
    }
}
