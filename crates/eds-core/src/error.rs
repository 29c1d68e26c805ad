//! Error types for EDS operations.
//!
//! Structural failures (configuration, transport, malformed documents) are
//! errors. A directory attribute missing from a response is not: lookups
//! report it as `None` or an empty list instead.

use serde::Serialize;
use thiserror::Error;

/// Main error type for EDS operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Credentials or settings are missing or invalid
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The HTTP exchange with the directory service failed
    #[error("Transport error: {message}")]
    TransportError {
        /// HTTP status, when the service answered at all
        status: Option<u16>,
        /// Error message
        message: String,
    },

    /// The response body is not well-formed DSML/XML
    #[error("Failed to parse DSML response: {0}")]
    ParseError(String),

    /// The caller supplied an unusable argument
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Specialized result type for EDS operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Structured error response for serialization.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ErrorResponse {
    /// Error details
    pub error: ErrorDetail,
}

/// Error detail structure.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ErrorDetail {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// HTTP status reported by the directory service
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl Error {
    /// Builds a transport error without an HTTP status.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::TransportError {
            status: None,
            message: message.into(),
        }
    }

    /// Builds a transport error for a non-success HTTP status.
    pub fn http_status(status: u16, message: impl Into<String>) -> Self {
        Self::TransportError {
            status: Some(status),
            message: message.into(),
        }
    }

    /// Returns the error code for this error type.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::TransportError { .. } => "TRANSPORT_ERROR",
            Self::ParseError(_) => "PARSE_ERROR",
            Self::InvalidRequest(_) => "INVALID_REQUEST",
        }
    }

    /// Returns the HTTP status attached to a transport error.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::TransportError { status, .. } => *status,
            _ => None,
        }
    }

    /// Converts the error into an `ErrorResponse`.
    #[must_use]
    pub fn into_error_response(self) -> ErrorResponse {
        ErrorResponse {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                status: self.status(),
                message: self.to_string(),
            },
        }
    }

    /// Returns true if this error should be logged as a serious error.
    ///
    /// Client-side HTTP statuses (unknown user, rejected credentials) are
    /// expected outcomes of a lookup and are not.
    #[must_use]
    pub const fn should_log(&self) -> bool {
        match self {
            Self::ConfigError(_) => true,
            Self::TransportError { status, .. } => match status {
                Some(code) => *code >= 500,
                None => true,
            },
            Self::ParseError(_) | Self::InvalidRequest(_) => false,
        }
    }
}

// Conversions from external error types
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        let status = err.status().map(|s| s.as_u16());
        let message = if err.is_timeout() {
            format!("request timed out: {err}")
        } else if err.is_connect() {
            format!("connection failed: {err}")
        } else {
            err.to_string()
        };
        Self::TransportError { status, message }
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::ConfigError(format!("Invalid EDS URL: {err}"))
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::ConfigError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            Error::ConfigError("test".to_string()).error_code(),
            "CONFIG_ERROR"
        );
        assert_eq!(Error::transport("test").error_code(), "TRANSPORT_ERROR");
        assert_eq!(
            Error::ParseError("test".to_string()).error_code(),
            "PARSE_ERROR"
        );
        assert_eq!(
            Error::InvalidRequest("test".to_string()).error_code(),
            "INVALID_REQUEST"
        );
    }

    #[test]
    fn test_error_display() {
        let err = Error::ConfigError("EDS_URL is not set".to_string());
        assert_eq!(err.to_string(), "Configuration error: EDS_URL is not set");

        let err = Error::http_status(404, "no such person");
        assert_eq!(err.to_string(), "Transport error: no such person");
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn test_into_error_response() {
        let err = Error::http_status(401, "authentication rejected");
        let response = err.into_error_response();

        assert_eq!(response.error.code, "TRANSPORT_ERROR");
        assert_eq!(
            response.error.message,
            "Transport error: authentication rejected"
        );
        assert_eq!(response.error.status, Some(401));
    }

    #[test]
    fn test_should_log() {
        assert!(Error::ConfigError("test".to_string()).should_log());
        assert!(Error::transport("connection refused").should_log());
        assert!(Error::http_status(503, "down").should_log());

        assert!(!Error::http_status(404, "missing").should_log());
        assert!(!Error::ParseError("test".to_string()).should_log());
        assert!(!Error::InvalidRequest("test".to_string()).should_log());
    }

    #[test]
    fn test_from_url_parse_error() {
        let err = url::Url::parse("not a url").unwrap_err();
        let eds_err: Error = err.into();
        assert!(matches!(eds_err, Error::ConfigError(_)));
    }

    #[test]
    fn test_error_response_serialization() {
        let response = Error::ParseError("unexpected end of input".to_string())
            .into_error_response();

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("PARSE_ERROR"));
        assert!(json.contains("unexpected end of input"));
        assert!(!json.contains("status"));
    }

    #[test]
    fn test_error_response_shape() {
        let response = Error::http_status(404, "no entry").into_error_response();
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "error": {
                    "code": "TRANSPORT_ERROR",
                    "message": "Transport error: no entry",
                    "status": 404
                }
            })
        );
    }

    #[test]
    fn test_error_partial_eq() {
        let err1 = Error::ParseError("test".to_string());
        let err2 = Error::ParseError("test".to_string());
        let err3 = Error::ParseError("other".to_string());

        assert_eq!(err1, err2);
        assert_ne!(err1, err3);
    }
}
