//! HTTP client implementation using reqwest

use crate::config::{ConnectionConfig, SecretString};
use crate::http::error::{map_http_error, TransportError};
use crate::http::{ChatTransport, ChunkStream, CHAT_COMPLETIONS_PATH};
use crate::providers::openai::streaming::parse_stream;
use crate::providers::openai::types::ChatCompletionRequest;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, ClientBuilder};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Default user agent
const USER_AGENT: &str = concat!("chatwire/", env!("CARGO_PKG_VERSION"));

/// Shared HTTP client with connection pooling
#[derive(Clone)]
pub struct HttpClient {
    /// The underlying reqwest client
    client: Arc<Client>,

    /// Base URL of the chat completion API, without trailing slash
    base_url: String,
}

impl HttpClient {
    /// Create a new HTTP client with default connection settings
    pub fn new(base_url: impl Into<String>) -> Result<Self, TransportError> {
        Self::with_config(base_url, &ConnectionConfig::default())
    }

    /// Create a new HTTP client with custom connection settings
    pub fn with_config(
        base_url: impl Into<String>,
        connection: &ConnectionConfig,
    ) -> Result<Self, TransportError> {
        let user_agent = connection
            .user_agent
            .clone()
            .unwrap_or_else(|| USER_AGENT.to_string());

        // No overall request timeout: the stream lives as long as the caller's token
        let client = ClientBuilder::new()
            .pool_max_idle_per_host(connection.max_idle_per_host)
            .pool_idle_timeout(Duration::from_secs(90))
            .connect_timeout(Duration::from_millis(connection.connect_timeout_ms))
            .user_agent(user_agent)
            .gzip(true)
            .build()
            .map_err(|e| TransportError::Unknown(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client: Arc::new(client),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Full URL of the chat completion endpoint
    pub fn completions_url(&self) -> String {
        format!("{}{}", self.base_url, CHAT_COMPLETIONS_PATH)
    }
}

#[async_trait]
impl ChatTransport for HttpClient {
    async fn open_stream(
        &self,
        request: &ChatCompletionRequest,
        api_key: &SecretString,
        cancel: CancellationToken,
    ) -> Result<ChunkStream, TransportError> {
        let request_id = Uuid::new_v4();
        let url = self.completions_url();

        info!(
            "Opening chat stream for model {} [request_id: {}]",
            request.model, request_id
        );
        debug!("Request URL: {}", url);

        let send = self
            .client
            .post(&url)
            .bearer_auth(api_key.expose_secret())
            .header("X-Request-ID", request_id.to_string())
            .json(request)
            .send();

        // Dropping the pending send future aborts the connection attempt
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Request cancelled before response [request_id: {}]", request_id);
                return Err(TransportError::Aborted(format!(
                    "Request cancelled [request_id: {}]",
                    request_id
                )));
            }
            result = send => result.map_err(|e| {
                error!("Request error [request_id: {}]: {}", request_id, e);
                TransportError::from(e)
            })?,
        };

        let status = response.status();
        debug!("Response status: {} [request_id: {}]", status, request_id);

        if !status.is_success() {
            let body = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                body = response.text() => body.ok(),
            };

            warn!(
                "Request failed with status {} [request_id: {}]",
                status, request_id
            );

            return Err(map_http_error(status, body, request_id));
        }

        // Dropping the body stream on cancellation closes the connection
        let token = cancel.clone();
        let body = response
            .bytes_stream()
            .take_until(async move { token.cancelled().await });

        Ok(parse_stream(body))
    }
}
