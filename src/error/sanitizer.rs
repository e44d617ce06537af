//! Error message sanitization to prevent credential and PII leakage.
//!
//! Transport errors are logged by the SDK instead of being returned to the
//! host, so their messages are scrubbed first. This module removes:
//!
//! - Bearer tokens
//! - Credentials embedded in URLs
//! - File paths (Unix and Windows)
//! - IP addresses
//! - Email addresses

use lazy_static::lazy_static;
use regex::Regex;

/// Configuration for error message sanitization.
#[derive(Debug, Clone)]
pub struct ErrorSanitizationConfig {
    /// Whether sanitization is enabled. Defaults to true.
    pub enabled: bool,
    /// Whether to keep the unsanitized message on the error value.
    /// Defaults to false.
    pub preserve_original: bool,
}

impl Default for ErrorSanitizationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            preserve_original: false,
        }
    }
}

impl ErrorSanitizationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a config with sanitization disabled.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            preserve_original: false,
        }
    }

    /// Create a config that keeps original messages on the error.
    pub fn with_preservation() -> Self {
        Self {
            enabled: true,
            preserve_original: true,
        }
    }
}

lazy_static! {
    static ref PATTERNS: Vec<(Regex, &'static str)> = vec![
        // Authorization header values
        (Regex::new(r"(?i)bearer\s+[A-Za-z0-9._~+/=-]+").unwrap(), "Bearer [REDACTED]"),
        // user:password@ inside URLs
        (Regex::new(r"(?i)(https?://)[^\s/@:]+:[^\s/@]+@").unwrap(), "${1}[CREDENTIALS]@"),
        // Unix-style file paths
        (Regex::new(r"/(?:[\w.-]+/)+[\w.-]+").unwrap(), "[PATH]"),
        // Windows-style file paths
        (Regex::new(r"[A-Za-z]:\\(?:[\w.-]+\\)+[\w.-]*").unwrap(), "[PATH]"),
        // IPv4 addresses
        (Regex::new(r"\b\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}\b").unwrap(), "[IP]"),
        // Email addresses (including + for plus addressing)
        (Regex::new(r"[\w.+-]+@[\w.-]+\.\w+").unwrap(), "[EMAIL]"),
    ];
}

/// Sanitize a message by replacing sensitive fragments with placeholders.
///
/// ```
/// use campaignkit::error::sanitizer::sanitize_message;
///
/// let sanitized = sanitize_message("401 for Bearer eyJhbGciOi.abc from 10.1.2.3");
/// assert!(!sanitized.contains("eyJhbGciOi"));
/// assert!(!sanitized.contains("10.1.2.3"));
/// ```
pub fn sanitize_message(message: &str) -> String {
    let mut result = message.to_string();

    for (pattern, replacement) in PATTERNS.iter() {
        result = pattern.replace_all(&result, *replacement).to_string();
    }

    result
}

/// A sanitized message plus, optionally, the original it came from.
#[derive(Debug, Clone)]
pub struct SanitizedMessage {
    pub sanitized: String,
    pub original: Option<String>,
}

impl SanitizedMessage {
    pub fn new(message: &str, config: &ErrorSanitizationConfig) -> Self {
        if config.enabled {
            Self {
                sanitized: sanitize_message(message),
                original: if config.preserve_original {
                    Some(message.to_string())
                } else {
                    None
                },
            }
        } else {
            Self {
                sanitized: message.to_string(),
                original: None,
            }
        }
    }

    pub fn display(&self) -> &str {
        &self.sanitized
    }

    pub fn original(&self) -> Option<&str> {
        self.original.as_deref()
    }
}

impl std::fmt::Display for SanitizedMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.sanitized)
    }
}
