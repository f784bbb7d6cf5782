//! Audit records for outbound requests and inbound outcomes.
//!
//! # Design
//! Every call produces exactly two records sharing one `RequestId`: a
//! `RequestRecord` emitted before dispatch and a `ResponseRecord` emitted
//! after classification. Records are immutable once built and only ever carry
//! masked headers.
//!
//! Logging is a collaborator behind the `AuditLogger` trait. Loggers are
//! fire-and-forget: they return nothing and must not interrupt the call.

use std::fmt;
use std::sync::{Mutex, PoisonError};

use rand::Rng;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::http::HttpMethod;
use crate::options::Headers;
use crate::response::ExceptionKind;

const REQUEST_ID_MIN: u64 = 1_000_000_000_000;
const REQUEST_ID_MAX: u64 = 9_999_999_999_999;

/// Correlation id linking the pre-call and post-call records of one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RequestId(u64);

impl RequestId {
    pub fn generate() -> Self {
        Self(rand::thread_rng().gen_range(REQUEST_ID_MIN..=REQUEST_ID_MAX))
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl From<u64> for RequestId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestRecord {
    request_id: RequestId,
    method: HttpMethod,
    uri: String,
    body: Option<Value>,
    headers: Headers,
    options: Map<String, Value>,
}

impl RequestRecord {
    /// `headers` must already be masked.
    pub fn new(
        request_id: RequestId,
        method: HttpMethod,
        uri: impl Into<String>,
        body: Option<Value>,
        headers: Headers,
        options: Map<String, Value>,
    ) -> Self {
        Self {
            request_id,
            method,
            uri: uri.into(),
            body,
            headers,
            options,
        }
    }

    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn options(&self) -> &Map<String, Value> {
        &self.options
    }
}

/// Classified result of a call as it appears in the audit trail.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Success {
        status: u16,
        payload: Option<Value>,
    },
    Failure {
        kind: ExceptionKind,
        status: Option<u16>,
        message: String,
        payload: Option<Value>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseRecord {
    request_id: RequestId,
    #[serde(flatten)]
    outcome: Outcome,
}

impl ResponseRecord {
    pub fn new(request_id: RequestId, outcome: Outcome) -> Self {
        Self {
            request_id,
            outcome,
        }
    }

    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }
}

/// Sink for audit records.
pub trait AuditLogger: Send + Sync {
    fn log_request(&self, record: &RequestRecord);
    fn log_response(&self, record: &ResponseRecord);
}

/// Writes each record as a `tracing` event under the `skyhub::audit` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditLogger;

impl AuditLogger for TracingAuditLogger {
    fn log_request(&self, record: &RequestRecord) {
        match serde_json::to_string(record) {
            Ok(json) => tracing::info!(
                target: "skyhub::audit",
                request_id = %record.request_id,
                method = %record.method,
                uri = %record.uri,
                record = %json,
                "request"
            ),
            Err(e) => tracing::warn!(
                target: "skyhub::audit",
                request_id = %record.request_id,
                error = %e,
                "Failed to serialize request record"
            ),
        }
    }

    fn log_response(&self, record: &ResponseRecord) {
        match serde_json::to_string(record) {
            Ok(json) => tracing::info!(
                target: "skyhub::audit",
                request_id = %record.request_id,
                record = %json,
                "response"
            ),
            Err(e) => tracing::warn!(
                target: "skyhub::audit",
                request_id = %record.request_id,
                error = %e,
                "Failed to serialize response record"
            ),
        }
    }
}

/// A single entry captured by `RecordingAuditLogger`.
#[derive(Debug, Clone, PartialEq)]
pub enum AuditEntry {
    Request(RequestRecord),
    Response(ResponseRecord),
}

impl AuditEntry {
    pub fn request_id(&self) -> RequestId {
        match self {
            AuditEntry::Request(r) => r.request_id(),
            AuditEntry::Response(r) => r.request_id(),
        }
    }
}

/// Keeps every record in memory, in emission order.
#[derive(Debug, Default)]
pub struct RecordingAuditLogger {
    entries: Mutex<Vec<AuditEntry>>,
}

impl RecordingAuditLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn push(&self, entry: AuditEntry) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
    }
}

impl AuditLogger for RecordingAuditLogger {
    fn log_request(&self, record: &RequestRecord) {
        self.push(AuditEntry::Request(record.clone()));
    }

    fn log_response(&self, record: &ResponseRecord) {
        self.push(AuditEntry::Response(record.clone()));
    }
}
