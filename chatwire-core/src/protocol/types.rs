//! Host-facing protocol types
//!
//! These types describe a conversation the way the chat host hands it to us:
//! - Messages carry an ordered list of typed parts
//! - Parts are a closed set of known kinds plus a structural fallback, because
//!   hosts add new part kinds over time
//! - Response parts are what we report back while a reply streams in

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Role of a host message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostRole {
    /// System instructions
    System,
    /// User turn, which may also carry tool results
    User,
    /// Assistant turn, which may carry tool calls and reasoning
    Assistant,
}

/// A message in the host conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostMessage {
    /// Role of the message sender
    pub role: HostRole,

    /// Ordered content parts
    #[serde(default)]
    pub parts: Vec<HostPart>,
}

impl HostMessage {
    /// Create an empty message with the given role
    pub fn new(role: HostRole) -> Self {
        Self {
            role,
            parts: Vec::new(),
        }
    }

    /// Create a system message with a single text part
    pub fn system(text: impl Into<String>) -> Self {
        Self::new(HostRole::System).with_part(HostPart::text(text))
    }

    /// Create a user message with a single text part
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(HostRole::User).with_part(HostPart::text(text))
    }

    /// Create an assistant message with a single text part
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(HostRole::Assistant).with_part(HostPart::text(text))
    }

    /// Append a part
    pub fn with_part(mut self, part: HostPart) -> Self {
        self.parts.push(part);
        self
    }

    /// Concatenation of all text parts, in order
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|part| match part {
                HostPart::Text { value } => Some(value.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// A typed part of a host message
///
/// Deserialization recognizes `text`, `tool_call` and `tool_result` by their
/// `type` tag. Any other object is a thinking part when its `value` field is a
/// string or a list of strings, and [`HostPart::Unknown`] otherwise.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostPart {
    /// Plain text
    Text { value: String },

    /// A tool invocation previously requested by the model
    ToolCall {
        call_id: String,
        name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        input: Option<Value>,
    },

    /// The result of running a tool
    ToolResult {
        call_id: String,
        content: Vec<ToolResultContent>,
    },

    /// Model reasoning carried over from an earlier turn
    Thinking(ThinkingPart),

    /// A part kind this crate does not understand
    #[serde(untagged)]
    Unknown(Value),
}

/// Tag-driven view of the three well-known part kinds
#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum KnownPart {
    Text {
        value: String,
    },
    ToolCall {
        call_id: String,
        name: String,
        #[serde(default)]
        input: Option<Value>,
    },
    ToolResult {
        call_id: String,
        #[serde(default)]
        content: Vec<ToolResultContent>,
    },
}

impl HostPart {
    /// Create a text part
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text {
            value: value.into(),
        }
    }

    /// Create a tool call part
    pub fn tool_call(call_id: impl Into<String>, name: impl Into<String>, input: Value) -> Self {
        Self::ToolCall {
            call_id: call_id.into(),
            name: name.into(),
            input: Some(input),
        }
    }

    /// Create a tool result part
    pub fn tool_result(call_id: impl Into<String>, content: Vec<ToolResultContent>) -> Self {
        Self::ToolResult {
            call_id: call_id.into(),
            content,
        }
    }

    /// Create a single-segment thinking part
    pub fn thinking(value: impl Into<String>) -> Self {
        Self::Thinking(ThinkingPart::new(value))
    }

    /// Classify a loosely-typed JSON part
    pub fn from_value(value: Value) -> Self {
        if let Ok(known) = serde_json::from_value::<KnownPart>(value.clone()) {
            return match known {
                KnownPart::Text { value } => Self::Text { value },
                KnownPart::ToolCall {
                    call_id,
                    name,
                    input,
                } => Self::ToolCall {
                    call_id,
                    name,
                    input,
                },
                KnownPart::ToolResult { call_id, content } => Self::ToolResult { call_id, content },
            };
        }

        // A well-known tag that failed to decode is never reinterpreted
        let known_tag = matches!(
            value.get("type").and_then(Value::as_str),
            Some("text" | "tool_call" | "tool_result")
        );
        if known_tag {
            return Self::Unknown(value);
        }

        match ThinkingPart::from_value(&value) {
            Some(thinking) => Self::Thinking(thinking),
            None => Self::Unknown(value),
        }
    }
}

impl<'de> Deserialize<'de> for HostPart {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_value(value))
    }
}

/// Reasoning text, either whole or as ordered segments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ThinkingValue {
    Text(String),
    Segments(Vec<String>),
}

impl ThinkingValue {
    /// The full text, with segments joined without a separator
    pub fn joined(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Segments(segments) => segments.concat(),
        }
    }
}

/// A reasoning part
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThinkingPart {
    pub value: ThinkingValue,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl ThinkingPart {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: ThinkingValue::Text(value.into()),
            id: None,
            format: None,
            metadata: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Structural match: any object whose `value` is a string or a list of strings.
    /// Fields of the wrong type are treated as absent.
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let thinking = match object.get("value")? {
            Value::String(text) => ThinkingValue::Text(text.clone()),
            Value::Array(items) => ThinkingValue::Segments(
                items
                    .iter()
                    .map(|item| item.as_str().map(str::to_string))
                    .collect::<Option<Vec<_>>>()?,
            ),
            _ => return None,
        };

        let string_field = |key: &str| object.get(key).and_then(Value::as_str).map(str::to_string);

        Some(Self {
            value: thinking,
            id: string_field("id"),
            format: string_field("format"),
            metadata: object.get("metadata").and_then(Value::as_object).cloned(),
        })
    }

    /// The reasoning text
    pub fn text(&self) -> String {
        self.value.joined()
    }
}

/// One piece of a tool result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolResultContent {
    /// Text output
    Text { value: String },

    /// Binary output with its MIME type
    Data { mime_type: String, data: Vec<u8> },

    /// Anything else the host produced
    #[serde(untagged)]
    Other(Value),
}

impl ToolResultContent {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text {
            value: value.into(),
        }
    }

    pub fn data(mime_type: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self::Data {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }
}

/// A tool the host offers to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostTool {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// JSON schema for the tool input, in whatever shape the host supplied it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<Value>,
}

impl HostTool {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            input_schema: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_input_schema(mut self, schema: Value) -> Self {
        self.input_schema = Some(schema);
        self
    }
}

/// How strongly the host wants the model to call a tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolMode {
    #[default]
    Auto,
    Required,
}

impl ToolMode {
    /// Wire value for `tool_choice`
    pub fn as_wire(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Required => "required",
        }
    }
}

/// Per-request options supplied by the host
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestOptions {
    /// Override for the maximum number of output tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,

    #[serde(default)]
    pub tool_mode: ToolMode,

    /// Never show UI (such as a key prompt) while serving this request
    #[serde(default)]
    pub silent: bool,
}

/// How the host can display model reasoning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThinkingSupport {
    /// The host has a dedicated reasoning part
    #[default]
    Structured,
    /// Reasoning is folded into the text as a `<think>` block
    Inline,
}

/// Output reported to the host while a response streams in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponsePart {
    /// A fragment of answer text
    Text { value: String },

    /// A fragment of reasoning text
    Thinking {
        value: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        metadata: Option<Map<String, Value>>,
    },

    /// A fully assembled tool invocation
    ToolCall {
        call_id: String,
        name: String,
        input: Map<String, Value>,
    },
}

impl ResponsePart {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text {
            value: value.into(),
        }
    }
}
