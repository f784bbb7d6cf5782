//! The request pipeline.
//!
//! # Design
//! `Service::request` runs one call through a fixed sequence:
//!
//! 1. prepare: derive a per-call `OptionsBuilder` from the persistent one and
//!    apply the service timeout, debug flag, per-call options and body; make
//!    sure a `RequestId` exists.
//! 2. pre-log: mask protected headers and emit the `RequestRecord` before any
//!    I/O, so a failed dispatch still leaves a trace of the attempt.
//! 3. dispatch: hand the unredacted `OptionSet` to the `Transport`.
//! 4. classify: success, client error or transport error.
//! 5. post-log: emit the `ResponseRecord` under the same `RequestId`.
//! 6. clear: drop the `RequestId` so the next call gets a fresh one.
//!
//! `request` never fails. Transport errors, a panicking transport and a
//! panicking logger are all absorbed at their boundary. It takes `&mut self`,
//! so one instance can only have one call in flight; concurrent callers need
//! their own `Service`.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use serde_json::Value;

use crate::audit::{AuditLogger, RequestId, RequestRecord, ResponseRecord, TracingAuditLogger};
use crate::config::{ServiceConfig, DEFAULT_HEADERS};
use crate::error::{ConfigError, TransportError};
use crate::handlers::{OrderHandler, QueueHandler};
use crate::http::{HttpMethod, HttpResponse};
use crate::options::{Headers, OptionSet, OptionsBuilder, RequestOptions};
use crate::redact::{protect, PROTECTED_HEADERS};
use crate::response::ResponseHandler;
use crate::transport::{Transport, UreqTransport};

/// Where the current (or last) call is in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    Idle,
    Prepared,
    Dispatched,
    Succeeded,
    Failed,
    Cleared,
}

pub struct Service {
    base_uri: String,
    timeout: u64,
    options: OptionsBuilder,
    transport: Box<dyn Transport>,
    logger: Arc<dyn AuditLogger>,
    request_id: Option<RequestId>,
    state: CallState,
}

impl Service {
    /// Validate `config` and talk to its base URI over `UreqTransport`.
    pub fn new(config: ServiceConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let transport = UreqTransport::new(config.resolved_base_uri());
        Ok(Self::with_transport(config, transport))
    }

    pub fn with_transport(config: ServiceConfig, transport: impl Transport + 'static) -> Self {
        let mut options = OptionsBuilder::new();
        options.headers_mut().add_headers(DEFAULT_HEADERS);
        options
            .set_timeout(config.timeout)
            .add_options(config.options.clone())
            .headers_mut()
            .add_headers(config.headers.iter());
        let timeout = options.timeout();

        Self {
            base_uri: config.resolved_base_uri().to_string(),
            timeout,
            options,
            transport: Box::new(transport),
            logger: Arc::new(TracingAuditLogger),
            request_id: None,
            state: CallState::Idle,
        }
    }

    pub fn with_logger(mut self, logger: Arc<dyn AuditLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    pub fn timeout(&self) -> u64 {
        self.timeout
    }

    pub fn state(&self) -> CallState {
        self.state
    }

    /// Headers sent with every call.
    pub fn headers(&self) -> &Headers {
        self.options.headers().headers()
    }

    pub fn set_headers<I, K, V>(&mut self, headers: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.options.headers_mut().add_headers(headers);
        self
    }

    /// The persistent assembler every call starts from.
    pub fn options_mut(&mut self) -> &mut OptionsBuilder {
        &mut self.options
    }

    /// Current correlation id, generating one if absent or if `renew` is set.
    pub fn request_id(&mut self, renew: bool) -> RequestId {
        match self.request_id {
            Some(id) if !renew => id,
            _ => {
                let id = RequestId::generate();
                self.request_id = Some(id);
                id
            }
        }
    }

    pub fn current_request_id(&self) -> Option<RequestId> {
        self.request_id
    }

    /// Reset per-call state; the service rests in `Idle` afterwards.
    pub fn clear(&mut self) {
        self.request_id = None;
        self.transition(CallState::Cleared);
        self.transition(CallState::Idle);
    }

    pub fn get(&mut self, uri: &str) -> ResponseHandler {
        self.request(HttpMethod::Get, uri, None, RequestOptions::new(), false)
    }

    pub fn post(&mut self, uri: &str, body: Value) -> ResponseHandler {
        self.request(HttpMethod::Post, uri, Some(body), RequestOptions::new(), false)
    }

    pub fn put(&mut self, uri: &str, body: Value) -> ResponseHandler {
        self.request(HttpMethod::Put, uri, Some(body), RequestOptions::new(), false)
    }

    pub fn delete(&mut self, uri: &str) -> ResponseHandler {
        self.request(HttpMethod::Delete, uri, None, RequestOptions::new(), false)
    }

    pub fn request(
        &mut self,
        method: HttpMethod,
        uri: &str,
        body: Option<Value>,
        options: RequestOptions,
        debug: bool,
    ) -> ResponseHandler {
        let (request_id, call_options) = self.prepare(method, uri, body, options, debug);

        self.transition(CallState::Dispatched);
        let handler = match self.dispatch(method, uri, &call_options) {
            Ok(response) => {
                self.transition(CallState::Succeeded);
                ResponseHandler::from_response(response)
            }
            Err(err) => {
                self.transition(CallState::Failed);
                ResponseHandler::from_error(err)
            }
        };

        let record = ResponseRecord::new(request_id, handler.outcome());
        self.notify(|logger| logger.log_response(&record));

        self.clear();
        handler
    }

    pub fn order(&mut self) -> OrderHandler<'_> {
        OrderHandler::new(self)
    }

    pub fn queue(&mut self) -> QueueHandler<'_> {
        QueueHandler::new(self)
    }

    fn prepare(
        &mut self,
        method: HttpMethod,
        uri: &str,
        body: Option<Value>,
        mut options: RequestOptions,
        debug: bool,
    ) -> (RequestId, OptionSet) {
        let body = body.or(options.body.take());
        let mut call = self.options.clone();
        call.set_timeout(self.timeout)
            .set_debug(debug)
            .add_options(options)
            .set_body(body);
        let call_options = call.build();
        let request_id = self.request_id(false);
        self.transition(CallState::Prepared);

        let redaction = protect(&call_options.headers, &PROTECTED_HEADERS);
        let record = RequestRecord::new(
            request_id,
            method,
            uri,
            call_options.body.clone(),
            redaction.masked,
            call_options.without_headers(),
        );
        self.notify(|logger| logger.log_request(&record));

        (request_id, call_options)
    }

    fn dispatch(
        &self,
        method: HttpMethod,
        uri: &str,
        options: &OptionSet,
    ) -> Result<HttpResponse, TransportError> {
        panic::catch_unwind(AssertUnwindSafe(|| {
            self.transport.dispatch(method, uri, options)
        }))
        .unwrap_or_else(|payload| Err(TransportError::Internal(panic_message(payload.as_ref()))))
    }

    fn notify(&self, emit: impl FnOnce(&dyn AuditLogger)) {
        let logger = self.logger.as_ref();
        if panic::catch_unwind(AssertUnwindSafe(|| emit(logger))).is_err() {
            tracing::warn!(request_id = ?self.request_id, "Audit logger panicked; record dropped");
        }
    }

    fn transition(&mut self, next: CallState) {
        tracing::trace!(
            request_id = ?self.request_id,
            from = ?self.state,
            to = ?next,
            "pipeline state"
        );
        self.state = next;
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("transport panicked: {msg}")
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("transport panicked: {msg}")
    } else {
        "transport panicked".to_string()
    }
}
