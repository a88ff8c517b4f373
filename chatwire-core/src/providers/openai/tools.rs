//! Tool declaration normalization
//!
//! The upstream API rejects function schemas without a `type`, and object
//! schemas without `properties`. Host tools are passed through with those two
//! keys filled in; anything that is not a JSON object is replaced outright.

use super::types::{FunctionDefinition, ToolDefinition, FUNCTION_TYPE};
use crate::protocol::HostTool;
use serde_json::{json, Map, Value};
use tracing::debug;

/// Convert host tools to wire tool definitions
///
/// Returns `None` when there is nothing to send, including when every tool
/// was skipped for having a blank name.
pub fn to_wire_tools(tools: &[HostTool]) -> Option<Vec<ToolDefinition>> {
    let definitions: Vec<ToolDefinition> = tools
        .iter()
        .filter_map(|tool| {
            if tool.name.trim().is_empty() {
                debug!("Skipping tool with blank name");
                return None;
            }

            Some(ToolDefinition {
                tool_type: FUNCTION_TYPE.to_string(),
                function: FunctionDefinition {
                    name: tool.name.clone(),
                    description: tool
                        .description
                        .clone()
                        .filter(|d| !d.trim().is_empty()),
                    parameters: normalize_schema(tool.input_schema.as_ref()),
                },
            })
        })
        .collect();

    (!definitions.is_empty()).then_some(definitions)
}

/// Fill in the schema keys the upstream requires
pub fn normalize_schema(schema: Option<&Value>) -> Value {
    let Some(Value::Object(object)) = schema else {
        return empty_object_schema();
    };

    let mut normalized: Map<String, Value> = object.clone();
    normalized
        .entry("type")
        .or_insert_with(|| Value::String("object".to_string()));

    if normalized.get("type").and_then(Value::as_str) == Some("object") {
        normalized
            .entry("properties")
            .or_insert_with(|| Value::Object(Map::new()));
    }

    Value::Object(normalized)
}

fn empty_object_schema() -> Value {
    json!({"type": "object", "properties": {}})
}
