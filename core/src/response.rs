//! The value every call returns.
//!
//! # Design
//! `ResponseHandler` is built once per call from the transport result and
//! never mutated afterwards. Callers branch on the variant instead of
//! catching errors: a 4xx/5xx answer from the API and a dead socket are both
//! ordinary values here.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::audit::Outcome;
use crate::error::TransportError;
use crate::http::HttpResponse;

/// Failure classification of a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExceptionKind {
    ClientError,
    TransportError,
}

impl ExceptionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExceptionKind::ClientError => "client-error",
            ExceptionKind::TransportError => "transport-error",
        }
    }
}

impl fmt::Display for ExceptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResponseHandler {
    /// The transport completed with a response.
    Success {
        status: u16,
        body: Option<Value>,
        raw: HttpResponse,
    },
    /// The API answered with an error status.
    ClientError {
        status: u16,
        payload: Option<Value>,
        message: String,
    },
    /// The call never produced a usable response.
    TransportError { message: String },
}

impl ResponseHandler {
    pub fn from_response(raw: HttpResponse) -> Self {
        ResponseHandler::Success {
            status: raw.status,
            body: parse_body(&raw.body),
            raw,
        }
    }

    pub fn from_error(err: TransportError) -> Self {
        let message = err.to_string();
        match err {
            TransportError::Http { status, body } => ResponseHandler::ClientError {
                status,
                payload: parse_payload(&body),
                message,
            },
            _ => ResponseHandler::TransportError { message },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ResponseHandler::Success { .. })
    }

    pub fn is_exception(&self) -> bool {
        !self.is_success()
    }

    pub fn kind(&self) -> Option<ExceptionKind> {
        match self {
            ResponseHandler::Success { .. } => None,
            ResponseHandler::ClientError { .. } => Some(ExceptionKind::ClientError),
            ResponseHandler::TransportError { .. } => Some(ExceptionKind::TransportError),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ResponseHandler::Success { status, .. } | ResponseHandler::ClientError { status, .. } => {
                Some(*status)
            }
            ResponseHandler::TransportError { .. } => None,
        }
    }

    /// Parsed success body, or the error payload for a client error.
    pub fn body(&self) -> Option<&Value> {
        match self {
            ResponseHandler::Success { body, .. } => body.as_ref(),
            ResponseHandler::ClientError { payload, .. } => payload.as_ref(),
            ResponseHandler::TransportError { .. } => None,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            ResponseHandler::Success { .. } => None,
            ResponseHandler::ClientError { message, .. }
            | ResponseHandler::TransportError { message } => Some(message),
        }
    }

    pub fn raw(&self) -> Option<&HttpResponse> {
        match self {
            ResponseHandler::Success { raw, .. } => Some(raw),
            _ => None,
        }
    }

    /// Decode a successful JSON body into `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Option<Result<T, serde_json::Error>> {
        match self {
            ResponseHandler::Success { raw, .. } => Some(serde_json::from_str(&raw.body)),
            _ => None,
        }
    }

    pub fn outcome(&self) -> Outcome {
        match self {
            ResponseHandler::Success { status, body, .. } => Outcome::Success {
                status: *status,
                payload: body.clone(),
            },
            ResponseHandler::ClientError {
                status,
                payload,
                message,
            } => Outcome::Failure {
                kind: ExceptionKind::ClientError,
                status: Some(*status),
                message: message.clone(),
                payload: payload.clone(),
            },
            ResponseHandler::TransportError { message } => Outcome::Failure {
                kind: ExceptionKind::TransportError,
                status: None,
                message: message.clone(),
                payload: None,
            },
        }
    }
}

fn parse_body(body: &str) -> Option<Value> {
    if body.trim().is_empty() {
        return None;
    }
    serde_json::from_str(body).ok()
}

/// Error payloads that are not JSON are kept as a string value.
fn parse_payload(body: &str) -> Option<Value> {
    if body.trim().is_empty() {
        return None;
    }
    Some(serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string())))
}
