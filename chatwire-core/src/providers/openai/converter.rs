//! Conversion from host conversations to wire chat messages

use super::types::{
    ReasoningDetail, WireFunctionCall, WireMessage, WireToolCall, FUNCTION_TYPE,
    REASONING_TEXT_TYPE,
};
use crate::protocol::{HostMessage, HostPart, HostRole, ThinkingPart, ToolResultContent};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::Value;

/// Placeholder content for a tool result that rendered to nothing
const EMPTY_TOOL_RESULT: &str = "{}";

/// Keys of a reasoning detail that host metadata may not overwrite
const RESERVED_DETAIL_KEYS: [&str; 5] = ["type", "index", "text", "id", "format"];

/// Convert a host conversation to wire messages, preserving order
pub fn to_wire_messages(messages: &[HostMessage]) -> Vec<WireMessage> {
    let mut wire = Vec::with_capacity(messages.len());
    for message in messages {
        match message.role {
            HostRole::System => wire.push(WireMessage::System {
                content: message.text(),
            }),
            HostRole::Assistant => wire.push(to_assistant_message(message)),
            HostRole::User => wire.extend(to_user_messages(message)),
        }
    }
    wire
}

/// Build the single assistant message for a host assistant turn
fn to_assistant_message(message: &HostMessage) -> WireMessage {
    let mut content = String::new();
    let mut tool_calls = Vec::new();
    let mut reasoning_details = Vec::new();

    for part in &message.parts {
        match part {
            HostPart::Text { value } => content.push_str(value),
            HostPart::ToolCall {
                call_id,
                name,
                input,
            } => tool_calls.push(WireToolCall {
                id: call_id.clone(),
                tool_type: FUNCTION_TYPE.to_string(),
                function: WireFunctionCall {
                    name: name.clone(),
                    arguments: serialize_arguments(input.as_ref()),
                },
            }),
            HostPart::Thinking(thinking) => {
                if let Some(detail) = to_reasoning_detail(thinking, reasoning_details.len()) {
                    reasoning_details.push(detail);
                }
            }
            HostPart::ToolResult { .. } | HostPart::Unknown(_) => {}
        }
    }

    WireMessage::Assistant {
        content,
        tool_calls: (!tool_calls.is_empty()).then_some(tool_calls),
        reasoning_details: (!reasoning_details.is_empty()).then_some(reasoning_details),
    }
}

fn serialize_arguments(input: Option<&Value>) -> String {
    match input {
        Some(value) => serde_json::to_string(value).unwrap_or_else(|_| value.to_string()),
        None => "{}".to_string(),
    }
}

fn to_reasoning_detail(thinking: &ThinkingPart, index: usize) -> Option<ReasoningDetail> {
    let text = thinking.text();
    if text.is_empty() {
        return None;
    }

    let non_blank = |field: &Option<String>| {
        field
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    };

    let extra = thinking
        .metadata
        .iter()
        .flatten()
        .filter(|(key, _)| !RESERVED_DETAIL_KEYS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    Some(ReasoningDetail {
        detail_type: REASONING_TEXT_TYPE.to_string(),
        index,
        text,
        id: non_blank(&thinking.id),
        format: non_blank(&thinking.format),
        extra,
    })
}

/// Split a host user turn into tool messages followed by at most one user message
fn to_user_messages(message: &HostMessage) -> Vec<WireMessage> {
    let mut messages: Vec<WireMessage> = message
        .parts
        .iter()
        .filter_map(|part| match part {
            HostPart::ToolResult { call_id, content } => Some(WireMessage::Tool {
                tool_call_id: call_id.clone(),
                content: render_tool_result(content),
            }),
            _ => None,
        })
        .collect();

    let text = message.text();
    // A turn made only of tool results must not produce an empty user message
    if !text.trim().is_empty() || messages.is_empty() {
        messages.push(WireMessage::User { content: text });
    }

    messages
}

/// Best-effort text rendering of tool output
pub fn render_tool_result(content: &[ToolResultContent]) -> String {
    let rendered: String = content.iter().map(render_tool_result_content).collect();
    let trimmed = rendered.trim();
    if trimmed.is_empty() {
        EMPTY_TOOL_RESULT.to_string()
    } else {
        trimmed.to_string()
    }
}

fn render_tool_result_content(content: &ToolResultContent) -> String {
    match content {
        ToolResultContent::Text { value } => value.clone(),
        ToolResultContent::Data { mime_type, data } => {
            format!("[data:{};base64,{}]", mime_type, STANDARD.encode(data))
        }
        ToolResultContent::Other(value) => match value.get("value").and_then(Value::as_str) {
            Some(text) => text.to_string(),
            None => serde_json::to_string(value).unwrap_or_else(|_| value.to_string()),
        },
    }
}
