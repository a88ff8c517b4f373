//! Provider error types and classification

use crate::http::error::TransportError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type for provider operations
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Classified failure kinds surfaced to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// No API key was available; nothing was sent
    NoApiKey,
    /// The upstream rejected the credentials (HTTP 401)
    AuthenticationError,
    /// Any other upstream API error
    ApiError,
    /// The request was aborted through its cancellation token
    Timeout,
    /// Connection or stream failure
    NetworkError,
    /// Failure that carries no usable shape
    UnknownError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoApiKey => "NO_API_KEY",
            Self::AuthenticationError => "AUTHENTICATION_ERROR",
            Self::ApiError => "API_ERROR",
            Self::Timeout => "TIMEOUT",
            Self::NetworkError => "NETWORK_ERROR",
            Self::UnknownError => "UNKNOWN_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified provider failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("[{code}] {message}")]
pub struct ProviderError {
    pub message: String,
    pub code: ErrorCode,
    pub status_code: Option<u16>,
}

impl ProviderError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code,
            status_code: None,
        }
    }

    pub fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    /// Pre-flight failure when no key is configured
    pub fn no_api_key() -> Self {
        Self::new(
            ErrorCode::NoApiKey,
            "No API key configured. Set an API key before sending requests.",
        )
    }

    /// Whether the caller should drop its stored credential
    pub fn is_authentication(&self) -> bool {
        self.code == ErrorCode::AuthenticationError
    }

    /// Suggested remediation for the user
    pub fn hint(&self) -> &'static str {
        match self.code {
            ErrorCode::NoApiKey => "Set your API key and try again.",
            ErrorCode::AuthenticationError => {
                "The API key was rejected. It has been cleared; enter a valid key."
            }
            ErrorCode::ApiError => match self.status_code {
                Some(429) => "The API is rate limiting requests. Wait a moment and retry.",
                Some(status) if status >= 500 => {
                    "The API is having trouble. Retry later."
                }
                _ => "The API rejected the request. Check the model and parameters.",
            },
            ErrorCode::Timeout => "The request was cancelled before it completed.",
            ErrorCode::NetworkError => "Check your network connection and the configured base URL.",
            ErrorCode::UnknownError => "An unexpected error occurred. Check the logs for details.",
        }
    }
}

/// Map a transport failure onto the public taxonomy
pub fn classify(error: TransportError) -> ProviderError {
    match error {
        TransportError::Api { status, message } if status == 401 => {
            ProviderError::new(ErrorCode::AuthenticationError, message).with_status(status)
        }
        TransportError::Api { status, message } => {
            ProviderError::new(ErrorCode::ApiError, message).with_status(status)
        }
        TransportError::Aborted(message) => ProviderError::new(ErrorCode::Timeout, message),
        TransportError::Network(message) => ProviderError::new(ErrorCode::NetworkError, message),
        TransportError::Unknown(message) => ProviderError::new(ErrorCode::UnknownError, message),
    }
}

impl From<TransportError> for ProviderError {
    fn from(error: TransportError) -> Self {
        classify(error)
    }
}
