//! Error types for the SkyHub client.
//!
//! # Design
//! Neither error escapes `Service::request`: `TransportError` is classified
//! into a `ResponseHandler` at the dispatch boundary, and `ConfigError` can
//! only surface while building a `Service`. `Http` gets its own variant
//! because it is the one failure that carries a structured payload from the
//! API; everything else is a plain message.

use thiserror::Error;

/// Failures reported by a `Transport`.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The API answered with a status >= 400.
    #[error("HTTP error: status={status}")]
    Http { status: u16, body: String },

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Anything else, including a transport that panicked mid-dispatch.
    #[error("Transport failure: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for TransportError {
    fn from(err: serde_json::Error) -> Self {
        TransportError::Serialization(err.to_string())
    }
}

impl From<ureq::Error> for TransportError {
    fn from(err: ureq::Error) -> Self {
        match &err {
            ureq::Error::StatusCode(status) => TransportError::Http {
                status: *status,
                body: String::new(),
            },
            ureq::Error::Timeout(_) => TransportError::Timeout(err.to_string()),
            ureq::Error::Io(_) => TransportError::Connection(err.to_string()),
            _ => TransportError::Internal(err.to_string()),
        }
    }
}

/// Invalid `ServiceConfig`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid base URI {uri:?}: {reason}")]
    InvalidBaseUri { uri: String, reason: String },

    #[error("timeout must be a positive number of seconds")]
    InvalidTimeout,

    #[error("environment variable {0} is not set")]
    MissingEnv(&'static str),

    #[error("environment variable {name} has invalid value {value:?}")]
    InvalidEnv { name: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_message_carries_status() {
        let err = TransportError::Http {
            status: 404,
            body: r#"{"error":"not_found"}"#.to_string(),
        };
        assert_eq!(err.to_string(), "HTTP error: status=404");
    }

    #[test]
    fn serde_errors_become_serialization_failures() {
        let err: TransportError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, TransportError::Serialization(_)));
    }

    #[test]
    fn config_error_names_the_variable() {
        let err = ConfigError::MissingEnv("SKYHUB_API_KEY");
        assert_eq!(err.to_string(), "environment variable SKYHUB_API_KEY is not set");
    }
}
