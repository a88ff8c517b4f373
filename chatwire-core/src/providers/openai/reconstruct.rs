//! Response reconstruction from streamed chunks
//!
//! The upstream streams three interleaved things:
//! - answer text, as true increments
//! - reasoning, as the whole text so far, resent with every delta
//! - tool calls, as argument fragments keyed by a tool-call index
//!
//! [`ResponseReconstructor`] turns those into host-facing [`ResponsePart`]s,
//! one chunk at a time, against a [`StreamState`] scoped to one response.

use super::types::{ChatChunk, ChunkChoice, ReasoningDelta, ToolCallFragment};
use crate::protocol::{ResponsePart, ThinkingSupport};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::debug;

/// Finish reasons that release accumulated tool calls
const TOOL_CALL_FINISH_REASONS: [&str; 2] = ["tool_calls", "function_call"];

const THINK_OPEN: &str = "<think>";
const THINK_CLOSE: &str = "</think>";

/// A tool call being assembled from fragments
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccumulatedToolCall {
    pub index: usize,
    pub id: Option<String>,
    pub name: Option<String>,
    pub arguments: String,
}

impl AccumulatedToolCall {
    fn new(index: usize) -> Self {
        Self {
            index,
            ..Default::default()
        }
    }

    /// Apply one fragment. Non-empty ids and names overwrite earlier ones;
    /// argument text is appended.
    fn apply(&mut self, fragment: &ToolCallFragment) {
        if let Some(id) = fragment.id.as_deref().filter(|id| !id.is_empty()) {
            self.id = Some(id.to_string());
        }

        if let Some(function) = &fragment.function {
            if let Some(name) = function.name.as_deref().filter(|name| !name.is_empty()) {
                self.name = Some(name.to_string());
            }
            if let Some(arguments) = function.arguments.as_deref() {
                self.arguments.push_str(arguments);
            }
        }
    }

    /// Convert to a response part when both id and name are known
    fn into_part(self) -> Option<ResponsePart> {
        let call_id = self.id.filter(|id| !id.is_empty())?;
        let name = self.name.filter(|name| !name.is_empty())?;
        Some(ResponsePart::ToolCall {
            call_id,
            name,
            input: parse_tool_arguments(&self.arguments),
        })
    }
}

/// Per-response reconstruction state
#[derive(Debug, Clone, Default)]
pub struct StreamState {
    /// Longest reasoning text emitted so far
    pub reasoning_buffer: String,

    /// Tool calls keyed by stream index
    pub pending_tool_calls: BTreeMap<usize, AccumulatedToolCall>,

    /// Tool calls are reported at most once per response
    pub tool_calls_emitted: bool,

    /// An inline `<think>` block is open
    think_block_open: bool,
}

/// Reconstructor configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconstructorConfig {
    pub thinking: ThinkingSupport,
}

/// Incremental converter from chunks to response parts
#[derive(Debug, Default)]
pub struct ResponseReconstructor {
    config: ReconstructorConfig,
    state: StreamState,
}

impl ResponseReconstructor {
    pub fn new(config: ReconstructorConfig) -> Self {
        Self {
            config,
            state: StreamState::default(),
        }
    }

    pub fn state(&self) -> &StreamState {
        &self.state
    }

    /// Process every choice of a chunk, in order
    pub fn process_chunk(&mut self, chunk: &ChatChunk) -> Vec<ResponsePart> {
        let mut parts = Vec::new();
        for choice in &chunk.choices {
            self.process_choice(choice, &mut parts);
        }
        parts
    }

    /// Close anything left open once the stream has ended
    pub fn finish(&mut self) -> Vec<ResponsePart> {
        let mut parts = Vec::new();
        self.close_think_block(&mut parts);
        parts
    }

    fn process_choice(&mut self, choice: &ChunkChoice, parts: &mut Vec<ResponsePart>) {
        let delta = &choice.delta;

        if let Some(latest) = latest_reasoning(&delta.reasoning_details) {
            self.process_reasoning(latest, parts);
        }

        if let Some(content) = delta.content.as_deref().filter(|c| !c.is_empty()) {
            self.close_think_block(parts);
            parts.push(ResponsePart::text(content));
        }

        for fragment in &delta.tool_calls {
            self.accumulate_tool_call(fragment);
        }

        let finished_with_tools = choice
            .finish_reason
            .as_deref()
            .is_some_and(|reason| TOOL_CALL_FINISH_REASONS.contains(&reason));

        if finished_with_tools && !self.state.tool_calls_emitted {
            self.emit_tool_calls(parts);
        }
    }

    fn process_reasoning(&mut self, latest: &ReasoningDelta, parts: &mut Vec<ResponsePart>) {
        let Some(text) = latest.text.as_deref() else {
            return;
        };

        let delta = match text.strip_prefix(self.state.reasoning_buffer.as_str()) {
            Some(suffix) => suffix,
            // Upstream restarted or replaced its reasoning
            None => text,
        };

        if delta.is_empty() {
            return;
        }

        match self.config.thinking {
            ThinkingSupport::Structured => parts.push(ResponsePart::Thinking {
                value: delta.to_string(),
                id: latest.resolved_id().map(str::to_string),
                metadata: latest.format.as_ref().map(|format| {
                    let mut metadata = Map::new();
                    metadata.insert("format".to_string(), Value::String(format.clone()));
                    metadata
                }),
            }),
            ThinkingSupport::Inline => {
                let value = if self.state.think_block_open {
                    delta.to_string()
                } else {
                    self.state.think_block_open = true;
                    format!("{}{}", THINK_OPEN, delta)
                };
                parts.push(ResponsePart::Text { value });
            }
        }

        self.state.reasoning_buffer = text.to_string();
    }

    fn close_think_block(&mut self, parts: &mut Vec<ResponsePart>) {
        if self.state.think_block_open {
            self.state.think_block_open = false;
            parts.push(ResponsePart::text(THINK_CLOSE));
        }
    }

    fn accumulate_tool_call(&mut self, fragment: &ToolCallFragment) {
        let pending = &mut self.state.pending_tool_calls;
        let index = fragment.index.unwrap_or(pending.len());
        pending
            .entry(index)
            .or_insert_with(|| AccumulatedToolCall::new(index))
            .apply(fragment);
    }

    fn emit_tool_calls(&mut self, parts: &mut Vec<ResponsePart>) {
        self.close_think_block(parts);

        let pending = std::mem::take(&mut self.state.pending_tool_calls);
        for (index, call) in pending {
            match call.into_part() {
                Some(part) => parts.push(part),
                None => debug!("Dropping incomplete tool call at index {}", index),
            }
        }

        self.state.tool_calls_emitted = true;
    }
}

/// The last reasoning entry carrying text; later entries supersede earlier ones
fn latest_reasoning(details: &[ReasoningDelta]) -> Option<&ReasoningDelta> {
    details.iter().rev().find(|detail| detail.text.is_some())
}

/// Parse accumulated tool-call arguments into an input object
///
/// Never fails: non-object JSON is wrapped as `{value}` and invalid JSON as
/// `{rawArguments}`.
pub fn parse_tool_arguments(raw: &str) -> Map<String, Value> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Map::new();
    }

    let mut wrapped = Map::new();
    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(object)) => return object,
        Ok(other) => {
            wrapped.insert("value".to_string(), other);
        }
        Err(_) => {
            wrapped.insert("rawArguments".to_string(), Value::String(raw.to_string()));
        }
    }
    wrapped
}
