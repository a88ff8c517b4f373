//! Provider layer: wire translation, streaming and error classification
//!
//! The OpenAI-compatible provider does the protocol work; the bridge drives a
//! complete request on behalf of the host.

pub mod bridge;
pub mod error;
pub mod openai;

pub use bridge::{ChatBridge, ModelInfo, StreamOutcome, TokenInput};
pub use error::{classify, ErrorCode, ProviderError, ProviderResult};
pub use openai::{ChatClient, ChatOptions};
