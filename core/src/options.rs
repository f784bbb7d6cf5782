//! Option assembly for a single dispatch.
//!
//! # Design
//! `OptionsBuilder` accumulates headers, body, timeout and debug flag from the
//! persistent defaults, the constructor-supplied options and finally the
//! per-call overrides. Every merge is last-writer-wins per key, and header
//! names compare case-insensitively. `build()` always materializes a fresh
//! `OptionSet` from the current state, so it can be called repeatedly.
//!
//! The builder is `Clone`: the service keeps one persistent builder and
//! derives a per-call copy from it, which is what keeps one-off options from
//! leaking into later calls.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// Default dispatch timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Option keys owned by the typed fields of `OptionSet`.
pub const RESERVED_OPTIONS: [&str; 4] = ["headers", "body", "timeout", "debug"];

fn is_reserved(key: &str) -> bool {
    RESERVED_OPTIONS.contains(&key)
}

/// Ordered header map with case-insensitive names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a header. An existing entry whose name matches
    /// ignoring ASCII case is replaced in place and takes the new spelling.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.position(&name) {
            Some(idx) => self.entries[idx] = (name, value),
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.position(name).map(|idx| self.entries[idx].1.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.position(name).map(|idx| self.entries.remove(idx).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(k, _)| k.eq_ignore_ascii_case(name))
    }
}

impl<K, V> Extend<(K, V)> for Headers
where
    K: Into<String>,
    V: Into<String>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (name, value) in iter {
            self.insert(name, value);
        }
    }
}

impl<K, V> FromIterator<(K, V)> for Headers
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        headers.extend(iter);
        headers
    }
}

impl Serialize for Headers {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Option overrides supplied at construction time or for a single call.
///
/// Unset fields leave the assembler untouched when merged.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub headers: Headers,
    pub body: Option<Value>,
    pub timeout: Option<u64>,
    pub debug: Option<bool>,
    pub extra: Map<String, Value>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn timeout(mut self, seconds: u64) -> Self {
        self.timeout = Some(seconds);
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = Some(debug);
        self
    }

    /// Free-form option. `allow_redirects: false` is honored by
    /// `UreqTransport`; other keys only travel into the audit record. Keys in
    /// `RESERVED_OPTIONS` are ignored, use the typed setters instead.
    pub fn option(mut self, key: impl Into<String>, value: Value) -> Self {
        let key = key.into();
        if !is_reserved(&key) {
            self.extra.insert(key, value);
        }
        self
    }
}

/// Header sub-builder owned by `OptionsBuilder`.
#[derive(Debug, Clone, Default)]
pub struct HeadersBuilder {
    headers: Headers,
}

impl HeadersBuilder {
    pub fn add_headers<I, K, V>(&mut self, headers: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.headers.extend(headers);
        self
    }

    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.headers.insert(name, value);
        self
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }
}

/// Stateful assembler for the options handed to the transport.
#[derive(Debug, Clone)]
pub struct OptionsBuilder {
    headers: HeadersBuilder,
    body: Option<Value>,
    timeout: u64,
    debug: bool,
    extra: Map<String, Value>,
}

impl Default for OptionsBuilder {
    fn default() -> Self {
        Self {
            headers: HeadersBuilder::default(),
            body: None,
            timeout: DEFAULT_TIMEOUT_SECS,
            debug: false,
            extra: Map::new(),
        }
    }
}

impl OptionsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_options(&mut self, options: RequestOptions) -> &mut Self {
        let RequestOptions {
            headers,
            body,
            timeout,
            debug,
            extra,
        } = options;

        self.headers.add_headers(headers.entries);
        if let Some(body) = body {
            self.body = Some(body);
        }
        if let Some(timeout) = timeout {
            self.set_timeout(timeout);
        }
        if let Some(debug) = debug {
            self.debug = debug;
        }
        self.extra
            .extend(extra.into_iter().filter(|(key, _)| !is_reserved(key)));
        self
    }

    /// Zero is not a usable timeout and leaves the current value in place.
    pub fn set_timeout(&mut self, seconds: u64) -> &mut Self {
        if seconds > 0 {
            self.timeout = seconds;
        }
        self
    }

    pub fn set_debug(&mut self, debug: bool) -> &mut Self {
        self.debug = debug;
        self
    }

    pub fn set_body(&mut self, body: Option<Value>) -> &mut Self {
        self.body = body;
        self
    }

    pub fn timeout(&self) -> u64 {
        self.timeout
    }

    pub fn headers(&self) -> &HeadersBuilder {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeadersBuilder {
        &mut self.headers
    }

    pub fn build(&self) -> OptionSet {
        OptionSet {
            headers: self.headers.headers().clone(),
            body: self.body.clone(),
            timeout: self.timeout,
            debug: self.debug,
            extra: self.extra.clone(),
        }
    }
}

/// The final merged options for one dispatch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionSet {
    pub headers: Headers,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    pub timeout: u64,
    pub debug: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl OptionSet {
    /// JSON view of the options with the `headers` key stripped, for audit
    /// records that carry their own masked header export.
    pub fn without_headers(&self) -> Map<String, Value> {
        let mut map: Map<String, Value> = self
            .extra
            .iter()
            .filter(|(key, _)| !is_reserved(key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        if let Some(body) = &self.body {
            map.insert("body".to_string(), body.clone());
        }
        map.insert("timeout".to_string(), Value::from(self.timeout));
        map.insert("debug".to_string(), Value::from(self.debug));
        map
    }
}
