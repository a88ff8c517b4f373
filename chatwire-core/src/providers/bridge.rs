//! Host-facing chat provider
//!
//! [`ChatBridge`] serves one host request end to end: it resolves the API
//! key, maps the conversation and tools onto the wire, streams the
//! completion and reports rebuilt response parts to the host's sink.

use crate::config::{ChatwireConfig, ModelConfig, SecretString};
use crate::host::{KeyStore, ModelCatalog, ResponseSink};
use crate::protocol::{HostMessage, HostTool, RequestOptions};
use crate::providers::error::{ErrorCode, ProviderError, ProviderResult};
use crate::providers::openai::{
    to_wire_messages, to_wire_tools, ChatClient, ChatOptions, ReconstructorConfig,
    ResponseReconstructor,
};
use crate::tokens::{estimate_message_tokens, estimate_tokens};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// A model as advertised to the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
    pub family: String,
    pub version: String,
    pub max_input_tokens: u32,
    pub max_output_tokens: u32,
    pub tool_calling: bool,
}

impl From<&ModelConfig> for ModelInfo {
    fn from(model: &ModelConfig) -> Self {
        Self {
            id: model.id.clone(),
            name: model.display_name().to_string(),
            family: model.family.clone(),
            version: "1.0.0".to_string(),
            max_input_tokens: model.max_input_tokens,
            max_output_tokens: model.max_output_tokens,
            tool_calling: model.tool_calling,
        }
    }
}

/// How a served response ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOutcome {
    /// The upstream finished the response
    Completed,
    /// The host cancelled; parts reported so far stand
    Cancelled,
}

/// Where the API key for a request came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeySource {
    Config,
    Stored,
    Prompted,
}

/// Input to token counting
#[derive(Debug, Clone, Copy)]
pub enum TokenInput<'a> {
    Text(&'a str),
    Message(&'a HostMessage),
}

/// Chat provider bound to one configuration and one key store
#[derive(Clone)]
pub struct ChatBridge {
    config: ChatwireConfig,
    client: ChatClient,
    keys: Arc<dyn KeyStore>,
}

impl ChatBridge {
    pub fn new(config: ChatwireConfig, client: ChatClient, keys: Arc<dyn KeyStore>) -> Self {
        Self {
            config,
            client,
            keys,
        }
    }

    /// Create a bridge talking HTTP to the configured endpoint
    pub fn from_config(config: ChatwireConfig, keys: Arc<dyn KeyStore>) -> ProviderResult<Self> {
        let client = ChatClient::from_config(&config)?;
        Ok(Self::new(config, client, keys))
    }

    pub fn config(&self) -> &ChatwireConfig {
        &self.config
    }

    /// Configured models the host has enabled
    ///
    /// An empty catalog enables every configured model.
    pub async fn model_information(&self, catalog: &dyn ModelCatalog) -> Vec<ModelInfo> {
        let enabled = catalog.enabled_models().await;
        self.config
            .models
            .iter()
            .filter(|model| enabled.is_empty() || enabled.iter().any(|id| id == &model.id))
            .map(ModelInfo::from)
            .collect()
    }

    /// Stream one response into `sink`
    ///
    /// Returns `Cancelled` when `cancel` fired before the upstream finished.
    /// When the upstream rejects a key that came from the key store, the
    /// stored key is deleted before the error is returned.
    pub async fn provide_response(
        &self,
        model_id: &str,
        messages: &[HostMessage],
        tools: &[HostTool],
        options: RequestOptions,
        sink: &mut dyn ResponseSink,
        cancel: &CancellationToken,
    ) -> ProviderResult<StreamOutcome> {
        let model = self.config.model(model_id);
        if model.is_none() {
            debug!("Model {} is not configured; using request defaults", model_id);
        }

        let (api_key, key_source) = self.resolve_api_key(options.silent).await.unzip();
        let chat_options = self.chat_options(model, tools, &options, api_key);

        let wire_messages = to_wire_messages(messages);
        info!(
            "Providing response: model={} messages={} wire_messages={}",
            model_id,
            messages.len(),
            wire_messages.len()
        );

        let mut stream = match self
            .client
            .stream_chat(model_id, wire_messages, chat_options, cancel)
            .await
        {
            Ok(stream) => stream,
            Err(e) => return self.fail(e, key_source, cancel).await,
        };

        let mut reconstructor = ResponseReconstructor::new(ReconstructorConfig {
            thinking: self.config.thinking,
        });
        let mut reported = 0usize;

        while let Some(next) = stream.next().await {
            match next {
                Ok(chunk) => {
                    for part in reconstructor.process_chunk(&chunk) {
                        sink.report(part);
                        reported += 1;
                    }
                }
                Err(e) => {
                    for part in reconstructor.finish() {
                        sink.report(part);
                        reported += 1;
                    }
                    debug!("Response for {} failed after {} parts", model_id, reported);
                    return self.fail(e, key_source, cancel).await;
                }
            }
        }

        for part in reconstructor.finish() {
            sink.report(part);
            reported += 1;
        }

        if cancel.is_cancelled() {
            info!("Response for {} cancelled after {} parts", model_id, reported);
            Ok(StreamOutcome::Cancelled)
        } else {
            info!("Response for {} completed with {} parts", model_id, reported);
            Ok(StreamOutcome::Completed)
        }
    }

    /// Approximate token count
    pub fn count_tokens(&self, input: TokenInput<'_>) -> usize {
        match input {
            TokenInput::Text(text) => estimate_tokens(text),
            TokenInput::Message(message) => estimate_message_tokens(message),
        }
    }

    /// Config key first, then the stored key, then a prompt unless silent
    async fn resolve_api_key(&self, silent: bool) -> Option<(SecretString, KeySource)> {
        if let Some(key) = self.config.api_key.as_ref().filter(|key| !key.is_blank()) {
            debug!("Using configured API key {}", key.partial_redact());
            return Some((key.clone(), KeySource::Config));
        }

        if let Some(key) = self.keys.get().await.filter(|key| !key.is_blank()) {
            debug!("Using stored API key {}", key.partial_redact());
            return Some((key, KeySource::Stored));
        }

        if silent {
            debug!("No API key stored and prompting is disabled");
            return None;
        }

        let key = self.keys.prompt_and_store().await?;
        Some((key, KeySource::Prompted))
    }

    fn chat_options(
        &self,
        model: Option<&ModelConfig>,
        tools: &[HostTool],
        options: &RequestOptions,
        api_key: Option<SecretString>,
    ) -> ChatOptions {
        let defaults = &self.config.defaults;
        let max_tokens = options
            .max_output_tokens
            .or(model.map(|m| m.max_output_tokens))
            .unwrap_or(defaults.max_tokens);

        let tools = if model.is_none_or(|m| m.tool_calling) {
            to_wire_tools(tools)
        } else {
            None
        };

        ChatOptions {
            temperature: Some(defaults.temperature),
            max_tokens: Some(max_tokens),
            api_key,
            tools,
            tool_choice: Some(Value::from(options.tool_mode.as_wire())),
            reasoning_split: Some(defaults.reasoning_split),
        }
    }

    async fn fail(
        &self,
        error: ProviderError,
        key_source: Option<KeySource>,
        cancel: &CancellationToken,
    ) -> ProviderResult<StreamOutcome> {
        if error.code == ErrorCode::Timeout && cancel.is_cancelled() {
            debug!("Request aborted by cancellation: {}", error.message);
            return Ok(StreamOutcome::Cancelled);
        }

        if error.is_authentication() {
            match key_source {
                Some(KeySource::Stored | KeySource::Prompted) => {
                    warn!("API key rejected; clearing stored key");
                    self.keys.delete().await;
                }
                _ => warn!("Configured API key rejected; stored key left in place"),
            }
        }

        Err(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{MemoryKeyStore, StaticCatalog};
    use crate::http::{ChatTransport, ChunkStream, TransportError};
    use crate::providers::openai::ChatCompletionRequest;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records requests and answers with an empty stream or a fixed error
    #[derive(Default)]
    struct RecordingTransport {
        requests: Mutex<Vec<(ChatCompletionRequest, String)>>,
        failure: Option<TransportError>,
    }

    #[async_trait]
    impl ChatTransport for RecordingTransport {
        async fn open_stream(
            &self,
            request: &ChatCompletionRequest,
            api_key: &SecretString,
            _cancel: CancellationToken,
        ) -> Result<ChunkStream, TransportError> {
            self.requests
                .lock()
                .unwrap()
                .push((request.clone(), api_key.expose_secret().to_string()));
            match &self.failure {
                Some(e) => Err(e.clone()),
                None => Ok(Box::pin(futures::stream::empty())),
            }
        }
    }

    fn bridge_with(
        config: ChatwireConfig,
        transport: Arc<RecordingTransport>,
        keys: Arc<MemoryKeyStore>,
    ) -> ChatBridge {
        ChatBridge::new(config, ChatClient::new(transport), keys)
    }

    #[tokio::test]
    async fn test_model_information_filters_by_catalog() {
        let mut config = ChatwireConfig::default();
        let mut second = config.models[0].clone();
        second.id = "MiniMax-M2-Stable".to_string();
        second.name = None;
        config.models.push(second);

        let bridge = bridge_with(
            config,
            Arc::new(RecordingTransport::default()),
            Arc::new(MemoryKeyStore::new()),
        );

        let all = bridge.model_information(&StaticCatalog::default()).await;
        assert_eq!(all.len(), 2);

        let enabled = bridge
            .model_information(&StaticCatalog(vec!["MiniMax-M2-Stable".to_string()]))
            .await;
        assert_eq!(enabled.len(), 1);
        assert_eq!(enabled[0].name, "MiniMax-M2-Stable");
    }

    #[tokio::test]
    async fn test_model_information_never_shows_blank_name() {
        let mut config = ChatwireConfig::default();
        config.models[0].name = Some("   ".to_string());
        let bridge = bridge_with(
            config,
            Arc::new(RecordingTransport::default()),
            Arc::new(MemoryKeyStore::new()),
        );

        let models = bridge.model_information(&StaticCatalog::default()).await;
        assert_eq!(models[0].name, "MiniMax-M2");
    }

    #[tokio::test]
    async fn test_request_uses_model_limits_and_tool_mode() {
        let transport = Arc::new(RecordingTransport::default());
        let bridge = bridge_with(
            ChatwireConfig::default(),
            transport.clone(),
            Arc::new(MemoryKeyStore::with_key("sk-stored")),
        );

        let tools = vec![HostTool::new("search")];
        let options = RequestOptions {
            tool_mode: crate::protocol::ToolMode::Required,
            ..Default::default()
        };
        let mut sink: Vec<crate::protocol::ResponsePart> = Vec::new();
        let outcome = bridge
            .provide_response(
                "MiniMax-M2",
                &[HostMessage::user("hi")],
                &tools,
                options,
                &mut sink,
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(outcome, StreamOutcome::Completed);
        let requests = transport.requests.lock().unwrap();
        let (request, key) = &requests[0];
        assert_eq!(key, "sk-stored");
        assert_eq!(request.max_tokens, 8192);
        assert_eq!(request.tool_choice, Some(Value::from("required")));
        assert_eq!(request.tools.as_ref().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn test_max_output_override_wins() {
        let transport = Arc::new(RecordingTransport::default());
        let bridge = bridge_with(
            ChatwireConfig::default(),
            transport.clone(),
            Arc::new(MemoryKeyStore::with_key("sk-stored")),
        );

        let options = RequestOptions {
            max_output_tokens: Some(256),
            ..Default::default()
        };
        bridge
            .provide_response(
                "unlisted-model",
                &[HostMessage::user("hi")],
                &[],
                options,
                &mut Vec::new(),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        let requests = transport.requests.lock().unwrap();
        assert_eq!(requests[0].0.max_tokens, 256);
        assert_eq!(requests[0].0.model, "unlisted-model");
    }

    #[tokio::test]
    async fn test_silent_request_does_not_prompt() {
        let transport = Arc::new(RecordingTransport::default());
        let keys = Arc::new(MemoryKeyStore::new().with_prompt_answer("sk-prompted"));
        let bridge = bridge_with(ChatwireConfig::default(), transport.clone(), keys.clone());

        let options = RequestOptions {
            silent: true,
            ..Default::default()
        };
        let err = bridge
            .provide_response(
                "MiniMax-M2",
                &[HostMessage::user("hi")],
                &[],
                options,
                &mut Vec::new(),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::NoApiKey);
        assert!(transport.requests.lock().unwrap().is_empty());
        assert!(keys.get().await.is_none());
    }

    #[tokio::test]
    async fn test_authentication_error_clears_stored_key() {
        let transport = Arc::new(RecordingTransport {
            failure: Some(TransportError::Api {
                status: 401,
                message: "invalid api key".to_string(),
            }),
            ..Default::default()
        });
        let keys = Arc::new(MemoryKeyStore::with_key("sk-revoked"));
        let bridge = bridge_with(ChatwireConfig::default(), transport, keys.clone());

        let err = bridge
            .provide_response(
                "MiniMax-M2",
                &[HostMessage::user("hi")],
                &[],
                RequestOptions::default(),
                &mut Vec::new(),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::AuthenticationError);
        assert!(keys.get().await.is_none());
    }

    #[tokio::test]
    async fn test_rejected_config_key_keeps_stored_key() {
        let transport = Arc::new(RecordingTransport {
            failure: Some(TransportError::Api {
                status: 401,
                message: "invalid api key".to_string(),
            }),
            ..Default::default()
        });
        let config = ChatwireConfig {
            api_key: Some(SecretString::new("sk-config-bad")),
            ..Default::default()
        };
        let keys = Arc::new(MemoryKeyStore::with_key("sk-stored-good"));
        let bridge = bridge_with(config, transport.clone(), keys.clone());

        let err = bridge
            .provide_response(
                "MiniMax-M2",
                &[HostMessage::user("hi")],
                &[],
                RequestOptions::default(),
                &mut Vec::new(),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::AuthenticationError);
        assert_eq!(transport.requests.lock().unwrap()[0].1, "sk-config-bad");
        assert_eq!(keys.get().await.unwrap().expose_secret(), "sk-stored-good");
    }

    #[tokio::test]
    async fn test_rejected_prompted_key_is_cleared() {
        let transport = Arc::new(RecordingTransport {
            failure: Some(TransportError::Api {
                status: 401,
                message: "invalid api key".to_string(),
            }),
            ..Default::default()
        });
        let keys = Arc::new(MemoryKeyStore::new().with_prompt_answer("sk-typo"));
        let bridge = bridge_with(ChatwireConfig::default(), transport, keys.clone());

        let err = bridge
            .provide_response(
                "MiniMax-M2",
                &[HostMessage::user("hi")],
                &[],
                RequestOptions::default(),
                &mut Vec::new(),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::AuthenticationError);
        assert!(keys.get().await.is_none());
    }

    #[test]
    fn test_count_tokens() {
        let bridge = bridge_with(
            ChatwireConfig::default(),
            Arc::new(RecordingTransport::default()),
            Arc::new(MemoryKeyStore::new()),
        );
        assert_eq!(bridge.count_tokens(TokenInput::Text("abcdefgh")), 2);
        assert_eq!(
            bridge.count_tokens(TokenInput::Message(&HostMessage::user("abcde"))),
            2
        );
    }
}
