//! Service configuration.
//!
//! # Design
//! The base URI, constructor headers, constructor options and default timeout
//! are plain data injected into `Service`. An unset base URI falls back to
//! `DEFAULT_BASE_URI`. Credentials travel as ordinary headers and are only
//! masked on their way into audit records.

use url::Url;

use crate::error::ConfigError;
use crate::options::{Headers, RequestOptions, DEFAULT_TIMEOUT_SECS};
use crate::redact::{HEADER_ACCOUNT_MANAGER_KEY, HEADER_API_KEY, HEADER_USER_EMAIL};

pub const DEFAULT_BASE_URI: &str = "https://api.skyhub.com.br";

/// Headers every service starts with, before constructor headers apply.
pub const DEFAULT_HEADERS: [(&str, &str); 2] = [
    ("Accept", "application/json"),
    ("Content-Type", "application/json"),
];

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub base_uri: Option<String>,
    pub headers: Headers,
    pub options: RequestOptions,
    pub timeout: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_uri: None,
            headers: Headers::new(),
            options: RequestOptions::new(),
            timeout: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ServiceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn base_uri(mut self, uri: impl Into<String>) -> Self {
        self.base_uri = Some(uri.into());
        self
    }

    pub fn credentials(mut self, email: impl Into<String>, api_key: impl Into<String>) -> Self {
        self.headers.insert(HEADER_USER_EMAIL, email);
        self.headers.insert(HEADER_API_KEY, api_key);
        self
    }

    pub fn account_manager_key(mut self, key: impl Into<String>) -> Self {
        self.headers.insert(HEADER_ACCOUNT_MANAGER_KEY, key);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }

    pub fn timeout(mut self, seconds: u64) -> Self {
        self.timeout = seconds;
        self
    }

    /// The configured base URI, or `DEFAULT_BASE_URI`.
    pub fn resolved_base_uri(&self) -> &str {
        match self.base_uri.as_deref() {
            Some(uri) if !uri.trim().is_empty() => uri,
            _ => DEFAULT_BASE_URI,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout == 0 {
            return Err(ConfigError::InvalidTimeout);
        }
        let uri = self.resolved_base_uri();
        Url::parse(uri).map_err(|e| ConfigError::InvalidBaseUri {
            uri: uri.to_string(),
            reason: e.to_string(),
        })?;
        Ok(())
    }

    /// Build configuration from environment variables.
    ///
    /// Expects:
    /// - `SKYHUB_USER_EMAIL`, `SKYHUB_API_KEY`: credentials (required)
    /// - `SKYHUB_BASE_URI`: base URI (default: `DEFAULT_BASE_URI`)
    /// - `SKYHUB_ACCOUNT_MANAGER_KEY`: account manager key (optional)
    /// - `SKYHUB_TIMEOUT`: timeout in seconds (default: 15)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let email =
            lookup("SKYHUB_USER_EMAIL").ok_or(ConfigError::MissingEnv("SKYHUB_USER_EMAIL"))?;
        let api_key = lookup("SKYHUB_API_KEY").ok_or(ConfigError::MissingEnv("SKYHUB_API_KEY"))?;

        let mut config = Self::new().credentials(email, api_key);
        if let Some(uri) = lookup("SKYHUB_BASE_URI") {
            config = config.base_uri(uri);
        }
        if let Some(key) = lookup("SKYHUB_ACCOUNT_MANAGER_KEY") {
            config = config.account_manager_key(key);
        }
        if let Some(raw) = lookup("SKYHUB_TIMEOUT") {
            let timeout = raw.parse().map_err(|_| ConfigError::InvalidEnv {
                name: "SKYHUB_TIMEOUT",
                value: raw.clone(),
            })?;
            config = config.timeout(timeout);
        }

        config.validate()?;
        Ok(config)
    }
}
