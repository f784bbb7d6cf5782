//! Client SDK for the SkyHub order-management API.
//!
//! # Overview
//! Resource handlers (`OrderHandler`, `QueueHandler`) turn typed arguments
//! into a path and a JSON body. Every call then runs through
//! `Service::request`, which assembles options, writes a redacted audit
//! record, dispatches through a `Transport`, classifies the outcome and
//! writes the matching response record.
//!
//! # Design
//! - `Service::request` never fails; callers branch on the returned
//!   `ResponseHandler` variant.
//! - Protected credentials (`X-User-Email`, `X-Api-Key`,
//!   `X-Accountmanager-Key`) reach the transport but never an audit record.
//! - Transport and audit logger are injected trait objects, so tests swap in
//!   closures and `RecordingAuditLogger` while production uses `ureq` and
//!   `tracing`.

pub mod audit;
pub mod config;
pub mod error;
pub mod handlers;
pub mod http;
pub mod options;
pub mod redact;
pub mod response;
pub mod service;
pub mod transform;
pub mod transport;

pub use audit::{
    AuditEntry, AuditLogger, Outcome, RecordingAuditLogger, RequestId, RequestRecord,
    ResponseRecord, TracingAuditLogger,
};
pub use config::{ServiceConfig, DEFAULT_BASE_URI};
pub use error::{ConfigError, TransportError};
pub use handlers::{OrderHandler, OrderQuery, QueueHandler};
pub use http::{HttpMethod, HttpResponse};
pub use options::{Headers, OptionSet, OptionsBuilder, RequestOptions};
pub use redact::{protect, Redaction, PROTECTED_HEADERS};
pub use response::{ExceptionKind, ResponseHandler};
pub use service::{CallState, Service};
pub use transform::{ShipmentItem, Track};
pub use transport::{Transport, UreqTransport};
