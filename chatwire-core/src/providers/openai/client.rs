//! Streaming chat client

use super::types::{ChatChunk, ChatCompletionRequest, ToolDefinition, WireMessage};
use crate::config::{ChatwireConfig, SecretString};
use crate::http::{ChatTransport, ChunkStream, HttpClient};
use crate::providers::error::{classify, ProviderError, ProviderResult};
use futures::{stream, Stream, StreamExt};
use serde_json::Value;
use std::pin::Pin;
use std::sync::Arc;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, error, info};

/// Sampling temperature when none is given
pub const DEFAULT_TEMPERATURE: f32 = 1.0;

/// Output token limit when none is given
pub const DEFAULT_MAX_TOKENS: u32 = 8192;

/// Classified chunks of one streamed response
pub type ChatStream = Pin<Box<dyn Stream<Item = ProviderResult<ChatChunk>> + Send>>;

/// Options for one streamed chat request
#[derive(Debug, Clone, Default)]
pub struct ChatOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub api_key: Option<SecretString>,
    pub tools: Option<Vec<ToolDefinition>>,
    pub tool_choice: Option<Value>,
    /// Ask for reasoning as a separate stream; defaults to true
    pub reasoning_split: Option<bool>,
}

/// Streaming chat client over a pluggable transport
#[derive(Clone)]
pub struct ChatClient {
    transport: Arc<dyn ChatTransport>,
}

impl ChatClient {
    /// Create a client over the given transport
    pub fn new(transport: Arc<dyn ChatTransport>) -> Self {
        Self { transport }
    }

    /// Create a client that talks HTTP to the configured endpoint
    pub fn from_config(config: &ChatwireConfig) -> ProviderResult<Self> {
        let http = HttpClient::with_config(&config.base_url, &config.connection).map_err(classify)?;
        Ok(Self::new(Arc::new(http)))
    }

    /// Build the wire request for a conversation
    pub fn build_request(
        model: &str,
        messages: Vec<WireMessage>,
        options: &ChatOptions,
    ) -> ChatCompletionRequest {
        let tools = options.tools.clone().filter(|tools| !tools.is_empty());
        let tool_choice = tools.as_ref().and(options.tool_choice.clone());

        ChatCompletionRequest {
            model: model.to_string(),
            messages,
            stream: true,
            temperature: options.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            max_tokens: options.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            tools,
            tool_choice,
            reasoning_split: options.reasoning_split.unwrap_or(true),
        }
    }

    /// Open a streamed chat completion
    ///
    /// Fails with `NO_API_KEY` before touching the network when the key is
    /// missing or blank. Once `cancel` fires, the in-flight request is aborted
    /// and the stream ends without an error; chunks already received but not
    /// yet pulled are discarded.
    pub async fn stream_chat(
        &self,
        model: &str,
        messages: Vec<WireMessage>,
        options: ChatOptions,
        cancel: &CancellationToken,
    ) -> ProviderResult<ChatStream> {
        let api_key = options
            .api_key
            .clone()
            .filter(|key| !key.expose_secret().trim().is_empty())
            .ok_or_else(ProviderError::no_api_key)?;

        if cancel.is_cancelled() {
            debug!("Chat request for {} cancelled before sending", model);
            return Ok(Box::pin(stream::empty()));
        }

        let request = Self::build_request(model, messages, &options);
        info!(
            "Streaming chat: model={} messages={} tools={}",
            request.model,
            request.messages.len(),
            request.tools.as_ref().map_or(0, Vec::len)
        );

        // The child token is what the transport watches; the guard fires it
        // when the stream is dropped and unregisters it from the caller's token
        let request_cancel = cancel.child_token();
        let guard = request_cancel.clone().drop_guard();

        let inner = self
            .transport
            .open_stream(&request, &api_key, request_cancel.clone())
            .await
            .map_err(|e| {
                let classified = classify(e);
                error!("Failed to open chat stream: {}", classified);
                classified
            })?;

        let active = ActiveStream {
            inner,
            cancel: request_cancel,
            _guard: guard,
            chunks: 0,
            done: false,
        };

        Ok(Box::pin(stream::unfold(active, ActiveStream::next_chunk)))
    }
}

/// Live state of one response stream
struct ActiveStream {
    inner: ChunkStream,
    cancel: CancellationToken,
    _guard: DropGuard,
    chunks: usize,
    done: bool,
}

impl ActiveStream {
    async fn next_chunk(mut self) -> Option<(ProviderResult<ChatChunk>, Self)> {
        if self.done || self.cancel.is_cancelled() {
            return None;
        }

        let next = self.inner.next().await;

        // Cancellation observed after a read stops the stream silently
        if self.cancel.is_cancelled() {
            debug!("Chat stream cancelled after {} chunks", self.chunks);
            return None;
        }

        match next {
            Some(Ok(chunk)) => {
                self.chunks += 1;
                Some((Ok(chunk), self))
            }
            Some(Err(e)) => {
                let classified = classify(e);
                error!("Chat stream failed after {} chunks: {}", self.chunks, classified);
                self.done = true;
                Some((Err(classified), self))
            }
            None => {
                debug!("Chat stream completed after {} chunks", self.chunks);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::openai::types::FunctionDefinition;
    use serde_json::json;

    #[test]
    fn test_build_request_defaults() {
        let request = ChatClient::build_request(
            "MiniMax-M2",
            vec![WireMessage::User {
                content: "hi".to_string(),
            }],
            &ChatOptions::default(),
        );

        assert!(request.stream);
        assert_eq!(request.temperature, DEFAULT_TEMPERATURE);
        assert_eq!(request.max_tokens, DEFAULT_MAX_TOKENS);
        assert!(request.reasoning_split);
        assert!(request.tools.is_none());
        assert!(request.tool_choice.is_none());
    }

    #[test]
    fn test_tool_choice_requires_tools() {
        let options = ChatOptions {
            tools: Some(vec![]),
            tool_choice: Some(json!("required")),
            reasoning_split: Some(false),
            ..Default::default()
        };
        let request = ChatClient::build_request("m", vec![], &options);
        assert!(request.tools.is_none());
        assert!(request.tool_choice.is_none());
        assert!(!request.reasoning_split);

        let options = ChatOptions {
            tools: Some(vec![ToolDefinition {
                tool_type: "function".to_string(),
                function: FunctionDefinition {
                    name: "search".to_string(),
                    description: None,
                    parameters: json!({"type": "object", "properties": {}}),
                },
            }]),
            tool_choice: Some(json!("auto")),
            temperature: Some(0.2),
            max_tokens: Some(100),
            ..Default::default()
        };
        let request = ChatClient::build_request("m", vec![], &options);
        assert_eq!(request.tools.as_ref().map(Vec::len), Some(1));
        assert_eq!(request.tool_choice, Some(json!("auto")));
        assert_eq!(request.temperature, 0.2);
        assert_eq!(request.max_tokens, 100);
    }
}
