//! Approximate token counting
//!
//! A coarse length-based estimate of roughly four characters per token. Good
//! enough for context budgeting; not a tokenizer.

use crate::protocol::{HostMessage, HostPart};
use crate::providers::openai::converter::render_tool_result;

const CHARS_PER_TOKEN: usize = 4;

/// Estimate the token count of a string
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(CHARS_PER_TOKEN)
}

/// Estimate the token count of a host message from everything it would send
pub fn estimate_message_tokens(message: &HostMessage) -> usize {
    let mut text = String::new();
    for part in &message.parts {
        match part {
            HostPart::Text { value } => text.push_str(value),
            HostPart::Thinking(thinking) => text.push_str(&thinking.text()),
            HostPart::ToolCall { name, input, .. } => {
                text.push_str(name);
                if let Some(input) = input {
                    text.push_str(&input.to_string());
                }
            }
            HostPart::ToolResult { content, .. } => text.push_str(&render_tool_result(content)),
            HostPart::Unknown(_) => {}
        }
    }
    estimate_tokens(&text)
}
