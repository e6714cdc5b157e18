//! Error types for GTM operations.
//!
//! Every fallible step of the provisioning client (configuration, transport,
//! request construction, response decoding and authentication) reports one of
//! these variants.

use thiserror::Error;

/// Main error type for GTM operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// The device could not be reached
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Operation timed out
    #[error("Timeout waiting for device: {0}")]
    Timeout(String),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// Response body was not the expected JSON
    #[error("Failed to decode response: {0}")]
    DecodeError(String),

    /// Request body could not be serialized
    #[error("Failed to serialize request: {0}")]
    SerializationError(String),

    /// Login succeeded at the transport level but returned no token
    #[error("Parsing token failed, token is empty")]
    EmptyToken,

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Invalid endpoint
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

/// Specialized result type for GTM operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns the error code for this error type.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            Self::Timeout(_) => "TIMEOUT",
            Self::HttpError(_) => "HTTP_ERROR",
            Self::DecodeError(_) => "DECODE_ERROR",
            Self::SerializationError(_) => "SERIALIZATION_ERROR",
            Self::EmptyToken => "EMPTY_TOKEN",
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::InvalidEndpoint(_) => "INVALID_ENDPOINT",
        }
    }

    /// Returns true for failures raised by the HTTP transport itself.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::ServiceUnavailable(_) | Self::Timeout(_) | Self::HttpError(_)
        )
    }
}

// Conversions from external error types
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() {
            Self::ServiceUnavailable(err.to_string())
        } else if err.is_decode() {
            Self::DecodeError(err.to_string())
        } else {
            Self::HttpError(err.to_string())
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidEndpoint(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::DecodeError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::ConfigError(format!("Invalid configuration: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            Error::ServiceUnavailable("test".to_string()).error_code(),
            "SERVICE_UNAVAILABLE"
        );
        assert_eq!(Error::Timeout("test".to_string()).error_code(), "TIMEOUT");
        assert_eq!(
            Error::HttpError("test".to_string()).error_code(),
            "HTTP_ERROR"
        );
        assert_eq!(
            Error::DecodeError("test".to_string()).error_code(),
            "DECODE_ERROR"
        );
        assert_eq!(
            Error::SerializationError("test".to_string()).error_code(),
            "SERIALIZATION_ERROR"
        );
        assert_eq!(Error::EmptyToken.error_code(), "EMPTY_TOKEN");
        assert_eq!(
            Error::ConfigError("test".to_string()).error_code(),
            "CONFIG_ERROR"
        );
        assert_eq!(
            Error::InvalidEndpoint("test".to_string()).error_code(),
            "INVALID_ENDPOINT"
        );
    }

    #[test]
    fn test_error_display() {
        let err = Error::ServiceUnavailable("connection refused".to_string());
        assert_eq!(err.to_string(), "Service unavailable: connection refused");

        assert_eq!(
            Error::EmptyToken.to_string(),
            "Parsing token failed, token is empty"
        );
    }

    #[test]
    fn test_is_transport() {
        assert!(Error::ServiceUnavailable("x".to_string()).is_transport());
        assert!(Error::Timeout("x".to_string()).is_transport());
        assert!(Error::HttpError("x".to_string()).is_transport());

        assert!(!Error::EmptyToken.is_transport());
        assert!(!Error::DecodeError("x".to_string()).is_transport());
        assert!(!Error::ConfigError("x".to_string()).is_transport());
    }

    // reqwest::Error conversion is exercised by the wiremock tests in client.rs

    #[test]
    fn test_from_url_parse_error() {
        let err = url::Url::parse("not a url").unwrap_err();
        let gtm_err: Error = err.into();
        assert!(matches!(gtm_err, Error::InvalidEndpoint(_)));
    }

    #[test]
    fn test_from_serde_json_error() {
        let err = serde_json::from_str::<serde_json::Value>("{invalid json}").unwrap_err();
        let gtm_err: Error = err.into();
        assert!(matches!(gtm_err, Error::DecodeError(_)));
        assert_eq!(gtm_err.error_code(), "DECODE_ERROR");
    }

    #[test]
    fn test_error_partial_eq() {
        let err1 = Error::DecodeError("test".to_string());
        let err2 = err1.clone();
        let err3 = Error::DecodeError("other".to_string());

        assert_eq!(err1, err2);
        assert_ne!(err1, err3);
    }
}
