//! Error types for the ERCx API client.
//!
//! # Design
//! Every failure the client can produce lands in a single `ApiError` so that
//! callers match on one enum. Caller mistakes (`InvalidArgument`,
//! `UnsupportedMethod`, `Config`) are caught before anything touches the
//! network. Server-side outcomes keep the detail needed to diagnose them: the
//! status code for `HttpError`, the underlying cause for `Transport`, the
//! parser message for `DecodeError`.

use thiserror::Error;

use crate::http::TransportError;

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors returned by the dispatcher, the domain parsers and the endpoint
/// wrappers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A string could not be parsed into one of the closed domain values.
    #[error("invalid {kind}: {value}")]
    InvalidArgument {
        /// Which domain value was being parsed (`network`, `test level`, ...).
        kind: &'static str,
        /// The rejected input, verbatim.
        value: String,
    },

    /// A record decoder did not find a required key.
    #[error("missing field: {0}")]
    MissingField(String),

    /// The request method is not one the dispatcher sends.
    #[error("unsupported method: {0}")]
    UnsupportedMethod(String),

    /// The request never produced a response (connection, DNS, TLS, timeout).
    #[error("transport error: {0}")]
    Transport(#[source] TransportError),

    /// The server answered with a status other than 200 or 201.
    #[error("request failed with status code {status}")]
    HttpError { status: u16 },

    /// A success response whose body is not JSON, or not the expected shape.
    #[error("decode failed: {0}")]
    DecodeError(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),

    /// The client configuration is missing or malformed.
    #[error("configuration error: {message}")]
    Config { message: String },
}

impl ApiError {
    pub(crate) fn invalid_argument(kind: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidArgument {
            kind,
            value: value.into(),
        }
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Returns `true` if the error was raised before any request left the
    /// process, i.e. the caller has to fix its input.
    #[must_use]
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidArgument { .. }
                | Self::UnsupportedMethod(_)
                | Self::SerializationError(_)
                | Self::Config { .. }
        )
    }

    /// Returns `true` if the server answered with a 5xx status.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::HttpError { status } if (500..600).contains(status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_argument_display_names_input() {
        let err = ApiError::invalid_argument("network", "7");
        assert_eq!(err.to_string(), "invalid network: 7");
    }

    #[test]
    fn http_error_display_carries_status() {
        let err = ApiError::HttpError { status: 404 };
        assert_eq!(err.to_string(), "request failed with status code 404");
    }

    #[test]
    fn transport_error_keeps_source() {
        let cause = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = ApiError::Transport(Box::new(cause));
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "refused");
    }

    #[test]
    fn classifies_caller_errors() {
        assert!(ApiError::invalid_argument("permission", "read").is_caller_error());
        assert!(ApiError::UnsupportedMethod("PUT".to_string()).is_caller_error());
        assert!(ApiError::config("missing key").is_caller_error());
        assert!(!ApiError::HttpError { status: 400 }.is_caller_error());
        assert!(!ApiError::MissingField("id".to_string()).is_caller_error());
    }

    #[test]
    fn classifies_server_errors() {
        assert!(ApiError::HttpError { status: 500 }.is_server_error());
        assert!(ApiError::HttpError { status: 503 }.is_server_error());
        assert!(!ApiError::HttpError { status: 404 }.is_server_error());
        assert!(!ApiError::DecodeError("eof".to_string()).is_server_error());
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ApiError>();
    }
}
