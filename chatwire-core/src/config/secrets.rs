//! Secret handling for API keys
//!
//! Keys never show up in `Debug` or `Display` output, so configs and
//! options holding them can be logged freely.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A wrapper type for sensitive strings like API keys
#[derive(Clone, Default, Deserialize, Serialize)]
#[serde(transparent)]
pub struct SecretString {
    value: String,
}

impl SecretString {
    /// Create a new secret string
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    /// Get the actual value (use with caution)
    pub fn expose_secret(&self) -> &str {
        &self.value
    }

    /// Check if the secret is empty
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Whether the secret is empty or whitespace only
    pub fn is_blank(&self) -> bool {
        self.value.trim().is_empty()
    }

    /// Get a partially redacted version for debugging
    pub fn partial_redact(&self) -> String {
        if self.value.is_empty() {
            return "[EMPTY]".to_string();
        }

        let chars: Vec<char> = self.value.chars().collect();
        let len = chars.len();
        if len <= 8 {
            // Very short secrets get fully redacted
            return "[REDACTED]".to_string();
        }

        let head = if self.value.starts_with("sk-") { 3 } else { 2 };
        let tail = if head == 3 { 4 } else { 2 };
        let prefix: String = chars[..head].iter().collect();
        let suffix: String = chars[len - tail..].iter().collect();
        format!("{}...{}", prefix, suffix)
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl PartialEq for SecretString {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl From<String> for SecretString {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for SecretString {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_string_redaction() {
        let secret = SecretString::new("sk-1234567890abcdef");
        assert_eq!(format!("{}", secret), "[REDACTED]");
        assert_eq!(format!("{:?}", secret), "[REDACTED]");
        assert_eq!(secret.partial_redact(), "sk-...cdef");
    }

    #[test]
    fn test_partial_redact_short_and_plain() {
        assert_eq!(SecretString::new("").partial_redact(), "[EMPTY]");
        assert_eq!(SecretString::new("short").partial_redact(), "[REDACTED]");
        assert_eq!(SecretString::new("eyJhbGciOiJIUzI1").partial_redact(), "ey...I1");
    }

    #[test]
    fn test_blank_secret() {
        assert!(SecretString::new("   ").is_blank());
        assert!(!SecretString::new("   ").is_empty());
        assert!(!SecretString::new("sk-x").is_blank());
    }

    #[test]
    fn test_serializes_transparently() {
        let secret = SecretString::new("sk-abc");
        assert_eq!(serde_json::to_string(&secret).unwrap(), "\"sk-abc\"");
    }
}
