//! Protocol module for the host side of the bridge
//!
//! This module defines the conversation model the chat host speaks:
//! - Messages made of typed parts (text, tool calls, tool results, thinking)
//! - Tool declarations and per-request options
//! - Response parts reported back while a reply streams in

pub mod types;

pub use types::{
    HostMessage, HostPart, HostRole, HostTool, RequestOptions, ResponsePart, ThinkingPart,
    ThinkingSupport, ThinkingValue, ToolMode, ToolResultContent,
};
