//! Chat-completion wire types
//!
//! Request types match the upstream API exactly and serialize without
//! surprises. Response chunk types are decoded leniently: a field with an
//! unexpected JSON type is treated as absent instead of failing the chunk.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// `type` of every reasoning detail we send
pub const REASONING_TEXT_TYPE: &str = "reasoning.text";

/// `type` of every tool call and tool definition
pub const FUNCTION_TYPE: &str = "function";

/// Streaming chat completion request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<WireMessage>,
    pub stream: bool,
    pub temperature: f32,
    pub max_tokens: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolDefinition>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<Value>,

    /// Ask the upstream to stream reasoning separately from the answer
    pub reasoning_split: bool,
}

/// Chat message in wire format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum WireMessage {
    System {
        content: String,
    },
    User {
        content: String,
    },
    Assistant {
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tool_calls: Option<Vec<WireToolCall>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reasoning_details: Option<Vec<ReasoningDetail>>,
    },
    Tool {
        tool_call_id: String,
        content: String,
    },
}

impl WireMessage {
    /// Wire role name
    pub fn role(&self) -> &'static str {
        match self {
            Self::System { .. } => "system",
            Self::User { .. } => "user",
            Self::Assistant { .. } => "assistant",
            Self::Tool { .. } => "tool",
        }
    }

    /// Text content of the message
    pub fn content(&self) -> &str {
        match self {
            Self::System { content }
            | Self::User { content }
            | Self::Assistant { content, .. }
            | Self::Tool { content, .. } => content,
        }
    }
}

/// Tool call recorded on an assistant message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireToolCall {
    pub id: String,

    #[serde(rename = "type")]
    pub tool_type: String,

    pub function: WireFunctionCall,
}

/// Function name and JSON-encoded arguments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireFunctionCall {
    pub name: String,
    pub arguments: String,
}

/// Reasoning segment replayed on an assistant message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasoningDetail {
    #[serde(rename = "type")]
    pub detail_type: String,

    /// Position among the reasoning segments of one message
    pub index: usize,

    pub text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    /// Host metadata merged into the record
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Tool definition offered to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    #[serde(rename = "type")]
    pub tool_type: String,

    pub function: FunctionDefinition,
}

/// Function definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// JSON schema; always carries `type`, and `properties` when `type` is `object`
    pub parameters: Value,
}

/// One streamed chunk
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatChunk {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub model: Option<String>,

    #[serde(default, deserialize_with = "lenient_vec")]
    pub choices: Vec<ChunkChoice>,
}

/// One choice within a chunk
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChunkChoice {
    #[serde(default, deserialize_with = "lenient")]
    pub index: Option<usize>,

    #[serde(default, deserialize_with = "lenient_or_default")]
    pub delta: ChunkDelta,

    #[serde(default, deserialize_with = "lenient")]
    pub finish_reason: Option<String>,
}

/// Incremental fields of a choice
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChunkDelta {
    #[serde(default, deserialize_with = "lenient")]
    pub content: Option<String>,

    #[serde(default, deserialize_with = "lenient_vec")]
    pub reasoning_details: Vec<ReasoningDelta>,

    #[serde(default, deserialize_with = "lenient_vec")]
    pub tool_calls: Vec<ToolCallFragment>,
}

/// Reasoning entry within a delta; the upstream resends the full text so far
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReasoningDelta {
    #[serde(default, deserialize_with = "lenient")]
    pub text: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub reasoning_id: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub thinking_id: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub format: Option<String>,
}

impl ReasoningDelta {
    /// First non-empty of `id`, `reasoning_id`, `thinking_id`
    pub fn resolved_id(&self) -> Option<&str> {
        [&self.id, &self.reasoning_id, &self.thinking_id]
            .into_iter()
            .filter_map(|candidate| candidate.as_deref())
            .find(|candidate| !candidate.is_empty())
    }
}

/// Fragment of a streamed tool call
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolCallFragment {
    /// Position of the tool call; absent or invalid means "next"
    #[serde(default, deserialize_with = "lenient")]
    pub index: Option<usize>,

    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub function: Option<FunctionFragment>,
}

/// Function portion of a tool call fragment
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FunctionFragment {
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub arguments: Option<String>,
}

/// Decode a field, treating a value of the wrong shape as absent
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

fn lenient_or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    Ok(lenient(deserializer)?.unwrap_or_default())
}

/// Decode a list, dropping elements of the wrong shape
fn lenient_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}
