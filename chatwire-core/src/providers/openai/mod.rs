//! OpenAI-compatible chat completion provider
//!
//! This module translates host conversations into the chat-completion wire
//! format, drives the streamed request, and rebuilds the streamed output into
//! host response parts.

pub mod client;
pub mod converter;
pub mod reconstruct;
pub mod streaming;
pub mod tools;
pub mod types;

pub use client::{ChatClient, ChatOptions, ChatStream};
pub use converter::to_wire_messages;
pub use reconstruct::{
    parse_tool_arguments, AccumulatedToolCall, ReconstructorConfig, ResponseReconstructor,
    StreamState,
};
pub use tools::to_wire_tools;
pub use types::{ChatChunk, ChatCompletionRequest, ReasoningDetail, ToolDefinition, WireMessage};
