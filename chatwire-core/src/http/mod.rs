//! HTTP transport for streaming chat completions
//!
//! This module implements the network layer, handling:
//! - Connection pooling and client management
//! - Bearer authentication and request ID correlation
//! - Binding the caller's cancellation token to the in-flight request
//! - Mapping HTTP failures into transport errors

pub mod client;
pub mod error;

use crate::config::SecretString;
use crate::providers::openai::types::{ChatChunk, ChatCompletionRequest};
use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;
use tokio_util::sync::CancellationToken;

pub use client::HttpClient;
pub use error::TransportError;

/// Path of the chat completion endpoint, relative to the base URL
pub const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";

/// Decoded chunks of one streamed response
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<ChatChunk, TransportError>> + Send>>;

/// Trait for streaming transports
///
/// Implementations must abort the underlying network operation once `cancel`
/// fires, not merely stop yielding chunks.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Open a streamed chat completion
    async fn open_stream(
        &self,
        request: &ChatCompletionRequest,
        api_key: &SecretString,
        cancel: CancellationToken,
    ) -> Result<ChunkStream, TransportError>;
}
