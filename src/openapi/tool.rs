use crate::constants::tools::{ENABLE_FLAG, OPENAPI_DOCS_FUNCTION, OPENAPI_URLS_FIELD};
use serde_json::{Map, Value};

/// What the inbound `useOpenAPITool` flag asked for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOptions {
    pub enabled: bool,
    pub openapi_urls: Vec<String>,
}

/// Removes the flag from the request body. `None` means the flag was absent.
pub fn take_tool_flag(body: &mut Map<String, Value>) -> Option<ToolOptions> {
    let flag = body.remove(ENABLE_FLAG)?;
    let options = match flag {
        Value::Bool(enabled) => ToolOptions {
            enabled,
            openapi_urls: Vec::new(),
        },
        Value::Object(config) => ToolOptions {
            enabled: config.get(ENABLE_FLAG).and_then(Value::as_bool) == Some(true),
            openapi_urls: config
                .get(OPENAPI_URLS_FIELD)
                .and_then(Value::as_array)
                .map(|urls| {
                    urls.iter()
                        .filter_map(Value::as_str)
                        .map(str::trim)
                        .filter(|u| !u.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
        },
        _ => ToolOptions::default(),
    };
    Some(options)
}

pub fn documentation_descriptor() -> Value {
    serde_json::json!({
        "type": "function",
        "function": {
            "name": OPENAPI_DOCS_FUNCTION,
            "description": "Fetch OpenAPI/Swagger documentation from a URL. Use this when you need to understand an API specification, endpoints, parameters, or schemas. Extract URLs from the user's message or conversation context.",
            "parameters": {
                "type": "object",
                "properties": {
                    "url": {
                        "type": "string",
                        "description": "The URL of the OpenAPI/Swagger specification (JSON or YAML format). Extract this URL from the user's message or conversation context."
                    },
                    "format": {
                        "type": "string",
                        "enum": ["json", "yaml"],
                        "description": "Preferred format for the response (defaults to json)"
                    }
                },
                "required": ["url"]
            }
        }
    })
}

fn descriptor_name(tool: &Value) -> Option<&str> {
    tool.get("function")
        .and_then(|f| f.get("name"))
        .and_then(Value::as_str)
}

/// Appends descriptors to `tools` (created when absent) and sets
/// `tool_choice` to `auto`. The documentation descriptor is always appended;
/// a generated descriptor whose name is already present is skipped.
/// `messages` is left untouched.
pub fn inject_tools(body: &mut Map<String, Value>, descriptors: Vec<Value>) {
    let tools = body
        .entry("tools".to_string())
        .or_insert_with(|| Value::Array(Vec::new()));
    if !tools.is_array() {
        *tools = Value::Array(Vec::new());
    }
    if let Value::Array(list) = tools {
        for descriptor in descriptors {
            let exists = descriptor_name(&descriptor)
                .filter(|name| *name != OPENAPI_DOCS_FUNCTION)
                .is_some_and(|name| list.iter().any(|t| descriptor_name(t) == Some(name)));
            if !exists {
                list.push(descriptor);
            }
        }
    }
    body.insert("tool_choice".to_string(), Value::String("auto".to_string()));
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

/// Arguments arrive as a JSON-encoded string; an object is accepted too.
/// Anything unparseable becomes an empty object so the handler reports
/// the missing fields itself.
fn parse_arguments(raw: Option<&Value>) -> Value {
    match raw {
        Some(Value::String(text)) => match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(map)) => Value::Object(map),
            _ => Value::Object(Map::new()),
        },
        Some(Value::Object(map)) => Value::Object(map.clone()),
        _ => Value::Object(Map::new()),
    }
}

/// The assistant message of the first choice plus its parsed tool calls.
pub fn extract_tool_calls(response: &Value) -> Option<(Value, Vec<ToolCall>)> {
    let message = response.get("choices")?.get(0)?.get("message")?;
    let calls = message.get("tool_calls")?.as_array()?;
    let parsed: Vec<ToolCall> = calls
        .iter()
        .filter_map(|call| {
            let function = call.get("function")?;
            Some(ToolCall {
                id: call
                    .get("id")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                name: function.get("name").and_then(Value::as_str)?.to_string(),
                arguments: parse_arguments(function.get("arguments")),
            })
        })
        .collect();
    if parsed.is_empty() {
        return None;
    }
    Some((message.clone(), parsed))
}

/// The second LLM request: the forwarded body with the assistant turn and one
/// `role: "tool"` message per executed call appended.
pub fn follow_up_body(
    forwarded: &Map<String, Value>,
    assistant: Value,
    results: Vec<(String, Value)>,
) -> Value {
    let mut body = forwarded.clone();
    let mut messages = body
        .get("messages")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    messages.push(assistant);
    for (call_id, result) in results {
        messages.push(serde_json::json!({
            "role": "tool",
            "tool_call_id": call_id,
            "content": result.to_string(),
        }));
    }
    body.insert("messages".to_string(), Value::Array(messages));
    Value::Object(body)
}
