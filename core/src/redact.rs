//! Header redaction for audit records.
//!
//! `protect` splits a header map into a masked copy that is safe to persist
//! and an export of the true protected values. Only the masked copy is ever
//! handed to the audit logger.

use crate::options::Headers;

/// Placeholder written over protected header values.
pub const MASK: &str = "***";

pub const HEADER_USER_EMAIL: &str = "X-User-Email";
pub const HEADER_API_KEY: &str = "X-Api-Key";
pub const HEADER_ACCOUNT_MANAGER_KEY: &str = "X-Accountmanager-Key";

/// Headers whose values never appear in plaintext in a log record.
pub const PROTECTED_HEADERS: [&str; 3] =
    [HEADER_USER_EMAIL, HEADER_API_KEY, HEADER_ACCOUNT_MANAGER_KEY];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redaction {
    /// All headers, protected values replaced with `MASK`.
    pub masked: Headers,
    /// Protected headers only, with their original values.
    pub exported: Headers,
}

pub fn protect(headers: &Headers, protected: &[&str]) -> Redaction {
    let mut masked = Headers::new();
    let mut exported = Headers::new();

    for (name, value) in headers.iter() {
        if protected.iter().any(|p| p.eq_ignore_ascii_case(name)) {
            masked.insert(name, MASK);
            exported.insert(name, value);
        } else {
            masked.insert(name, value);
        }
    }

    Redaction { masked, exported }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers() -> Headers {
        [
            ("x-user-email", "seller@example.com"),
            ("X-API-KEY", "key-123"),
            ("Accept", "application/json"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn protected_values_are_masked_regardless_of_case() {
        let redaction = protect(&headers(), &PROTECTED_HEADERS);

        assert_eq!(redaction.masked.get("X-User-Email"), Some(MASK));
        assert_eq!(redaction.masked.get("x-api-key"), Some(MASK));
        let rendered = serde_json::to_string(&redaction.masked).unwrap();
        assert!(!rendered.contains("seller@example.com"));
        assert!(!rendered.contains("key-123"));
    }

    #[test]
    fn exported_keeps_original_values() {
        let redaction = protect(&headers(), &PROTECTED_HEADERS);

        assert_eq!(redaction.exported.len(), 2);
        assert_eq!(redaction.exported.get("X-User-Email"), Some("seller@example.com"));
        assert_eq!(redaction.exported.get("X-Api-Key"), Some("key-123"));
        assert!(!redaction.exported.contains("Accept"));
    }

    #[test]
    fn unprotected_headers_pass_through() {
        let redaction = protect(&headers(), &PROTECTED_HEADERS);
        assert_eq!(redaction.masked.get("accept"), Some("application/json"));
        assert_eq!(redaction.masked.len(), 3);
    }

    #[test]
    fn empty_protected_list_masks_nothing() {
        let redaction = protect(&headers(), &[]);
        assert_eq!(redaction.masked, headers());
        assert!(redaction.exported.is_empty());
    }
}
