//! Transport error types and HTTP error mapping

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

/// Failures raised below the provider layer, before classification
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The upstream answered with a non-success status
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The request was aborted before it completed
    #[error("Request aborted: {0}")]
    Aborted(String),

    /// Connection, body or stream failure
    #[error("Network error: {0}")]
    Network(String),

    /// Anything else
    #[error("{0}")]
    Unknown(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Aborted(format!("Request timed out: {}", err))
        } else if let Some(status) = err.status() {
            TransportError::Api {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else if err.is_connect() {
            TransportError::Network(format!("Connection failed: {}", err))
        } else {
            TransportError::Network(err.to_string())
        }
    }
}

/// Map a non-success HTTP status and response body to a transport error
pub fn map_http_error(status: StatusCode, body: Option<String>, request_id: Uuid) -> TransportError {
    let error_message = body
        .as_deref()
        .and_then(|b| serde_json::from_str::<Value>(b).ok())
        .and_then(|v| extract_error_message(&v))
        .or_else(|| body.filter(|b| !b.trim().is_empty()))
        .unwrap_or_else(|| format!("HTTP error {}", status.as_u16()));

    TransportError::Api {
        status: status.as_u16(),
        message: format!("{} [request_id: {}]", error_message, request_id),
    }
}

/// Extract an error message from common JSON error bodies
fn extract_error_message(json: &Value) -> Option<String> {
    // OpenAI format: { "error": { "message": "...", "type": "...", "code": "..." } }
    if let Some(message) = json
        .get("error")
        .and_then(|error| error.get("message"))
        .and_then(Value::as_str)
    {
        return Some(message.to_string());
    }

    // Some compatible APIs report failures in a base_resp envelope
    if let Some(message) = json
        .get("base_resp")
        .and_then(|resp| resp.get("status_msg"))
        .and_then(Value::as_str)
    {
        return Some(message.to_string());
    }

    // Generic format: { "message": "...", "error": "..." }
    if let Some(message) = json.get("message").and_then(Value::as_str) {
        return Some(message.to_string());
    }

    json.get("error").and_then(Value::as_str).map(str::to_string)
}
