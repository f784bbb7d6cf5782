//! The network boundary of the pipeline.
//!
//! # Design
//! `Transport::dispatch` is the only blocking step of a call. It receives the
//! unredacted `OptionSet` because it is the one place that needs the real
//! credentials. A status >= 400 is reported as `TransportError::Http` with the
//! body attached, so the pipeline can tell an API error from a network fault.
//!
//! `UreqTransport` builds a fresh agent per dispatch with the call's timeout.
//! There is no pooling and no retry.

use std::time::Duration;

use crate::error::TransportError;
use crate::http::{HttpMethod, HttpResponse};
use crate::options::{Headers, OptionSet};

pub trait Transport: Send + Sync {
    fn dispatch(
        &self,
        method: HttpMethod,
        uri: &str,
        options: &OptionSet,
    ) -> Result<HttpResponse, TransportError>;
}

impl<F> Transport for F
where
    F: Fn(HttpMethod, &str, &OptionSet) -> Result<HttpResponse, TransportError> + Send + Sync,
{
    fn dispatch(
        &self,
        method: HttpMethod,
        uri: &str,
        options: &OptionSet,
    ) -> Result<HttpResponse, TransportError> {
        self(method, uri, options)
    }
}

/// Blocking HTTP transport backed by `ureq`.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    base_uri: String,
}

impl UreqTransport {
    pub fn new(base_uri: &str) -> Self {
        Self {
            base_uri: base_uri.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    /// Resolve a request path against the base URI. Absolute URLs pass through.
    pub fn resolve(&self, uri: &str) -> String {
        if uri.starts_with("http://") || uri.starts_with("https://") {
            return uri.to_string();
        }
        if uri.starts_with('/') {
            format!("{}{uri}", self.base_uri)
        } else {
            format!("{}/{uri}", self.base_uri)
        }
    }
}

impl Transport for UreqTransport {
    fn dispatch(
        &self,
        method: HttpMethod,
        uri: &str,
        options: &OptionSet,
    ) -> Result<HttpResponse, TransportError> {
        let url = encode_query_brackets(&self.resolve(uri));

        // Status codes are read as data; the >= 400 split happens below so the
        // error body is not lost.
        let mut config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(Duration::from_secs(options.timeout)));
        if let Some(limit) = redirect_limit(options) {
            config = config.max_redirects(limit);
        }
        let agent = config.build().new_agent();

        let body = options.body.as_ref().map(serde_json::to_vec).transpose()?;

        let result = match (method, body) {
            (HttpMethod::Get, _) => with_headers(agent.get(&url), &options.headers).call(),
            (HttpMethod::Delete, _) => with_headers(agent.delete(&url), &options.headers).call(),
            (HttpMethod::Post, Some(body)) => {
                with_headers(agent.post(&url), &options.headers).send(&body[..])
            }
            (HttpMethod::Post, None) => {
                with_headers(agent.post(&url), &options.headers).send_empty()
            }
            (HttpMethod::Put, Some(body)) => {
                with_headers(agent.put(&url), &options.headers).send(&body[..])
            }
            (HttpMethod::Put, None) => with_headers(agent.put(&url), &options.headers).send_empty(),
        };
        let mut response = result?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    value.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect();
        let body = response.body_mut().read_to_string()?;

        if options.debug {
            tracing::debug!(
                method = %method,
                url = %url,
                status,
                bytes = body.len(),
                "SkyHub exchange"
            );
        }

        if status >= 400 {
            return Err(TransportError::Http { status, body });
        }

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

/// `allow_redirects: false` disables redirect following; anything else keeps
/// the agent default.
fn redirect_limit(options: &OptionSet) -> Option<u32> {
    match options.extra.get("allow_redirects") {
        Some(serde_json::Value::Bool(false)) => Some(0),
        _ => None,
    }
}

/// Percent-encode `[` and `]` after the `?`, leaving IPv6 hosts alone.
fn encode_query_brackets(url: &str) -> String {
    match url.split_once('?') {
        Some((base, query)) => {
            format!("{base}?{}", query.replace('[', "%5B").replace(']', "%5D"))
        }
        None => url.to_string(),
    }
}

fn with_headers<B>(
    mut request: ureq::RequestBuilder<B>,
    headers: &Headers,
) -> ureq::RequestBuilder<B> {
    for (name, value) in headers.iter() {
        request = request.header(name, value);
    }
    request
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{OptionsBuilder, RequestOptions};
    use serde_json::json;

    #[test]
    fn resolve_joins_relative_paths() {
        let transport = UreqTransport::new("https://api.skyhub.com.br/");
        assert_eq!(transport.base_uri(), "https://api.skyhub.com.br");
        assert_eq!(
            transport.resolve("/orders/1"),
            "https://api.skyhub.com.br/orders/1"
        );
        assert_eq!(
            transport.resolve("queues/orders"),
            "https://api.skyhub.com.br/queues/orders"
        );
    }

    #[test]
    fn resolve_keeps_absolute_urls() {
        let transport = UreqTransport::new("https://api.skyhub.com.br");
        assert_eq!(
            transport.resolve("http://localhost:3000/orders"),
            "http://localhost:3000/orders"
        );
    }

    #[test]
    fn query_brackets_are_encoded() {
        assert_eq!(
            encode_query_brackets("http://[::1]:3000/orders?filters[statuses][]=order_paid"),
            "http://[::1]:3000/orders?filters%5Bstatuses%5D%5B%5D=order_paid"
        );
        assert_eq!(
            encode_query_brackets("http://localhost/orders/1"),
            "http://localhost/orders/1"
        );
    }

    #[test]
    fn allow_redirects_false_disables_redirects() {
        let mut builder = OptionsBuilder::new();
        assert_eq!(redirect_limit(&builder.build()), None);

        builder.add_options(RequestOptions::new().option("allow_redirects", json!(true)));
        assert_eq!(redirect_limit(&builder.build()), None);

        builder.add_options(RequestOptions::new().option("allow_redirects", json!(false)));
        assert_eq!(redirect_limit(&builder.build()), Some(0));
    }

    #[test]
    fn closures_are_transports() {
        let transport = |_: HttpMethod, uri: &str, _: &OptionSet| {
            Ok::<_, TransportError>(HttpResponse {
                status: 200,
                headers: Vec::new(),
                body: uri.to_string(),
            })
        };
        let response = transport
            .dispatch(HttpMethod::Get, "/orders", &OptionsBuilder::new().build())
            .unwrap();
        assert_eq!(response.body, "/orders");
    }

    #[test]
    fn unreachable_host_is_a_transport_failure() {
        let transport = UreqTransport::new("http://127.0.0.1:1");
        let mut builder = OptionsBuilder::new();
        builder.set_timeout(2);
        let err = transport
            .dispatch(HttpMethod::Get, "/orders", &builder.build())
            .unwrap_err();
        assert!(!matches!(err, TransportError::Http { .. }));
    }
}
