//! Turns the operations of a fetched spec into callable LLM functions.
//!
//! Every `(method, path)` pair becomes a descriptor named
//! `api_<method>_<segments>`. Path parameters map to required properties,
//! query parameters to `query_<name>`, and a free-form `headers` object is
//! always accepted. Operations that take a body also accept `request_body`.

use crate::errors::GatewayError;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashSet;
use url::Url;

const METHODS: &[&str] = &["get", "put", "post", "delete", "patch", "head", "options"];
const MAX_NAME_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiOperation {
    pub name: String,
    pub method: String,
    pub path: String,
    pub server_url: String,
    pub description: String,
    pub parameters: Value,
}

pub fn function_name(method: &str, path: &str) -> String {
    let mut name = format!("api_{}", method.to_ascii_lowercase());
    let segments: Vec<String> = path
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|segment| {
            segment
                .chars()
                .filter(|c| *c != '{' && *c != '}')
                .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
                .collect::<String>()
        })
        .filter(|s| !s.is_empty())
        .collect();
    if segments.is_empty() {
        name.push_str("_root");
    }
    for segment in segments {
        name.push('_');
        name.push_str(&segment);
    }
    name.chars().take(MAX_NAME_LEN).collect()
}

/// `<base>_<n>`, with `base` shortened so the result stays within the name limit.
fn suffixed_name(base: &str, n: usize) -> String {
    let suffix = format!("_{}", n);
    let keep = MAX_NAME_LEN.saturating_sub(suffix.len());
    let mut name: String = base.chars().take(keep).collect();
    name.push_str(&suffix);
    name
}

/// Base URL for calls: `servers[0].url` (OpenAPI 3) or `host` + `basePath`
/// (Swagger 2), resolved against the URL the spec was fetched from.
pub fn resolve_server_url(spec: &Value, spec_url: &Url) -> String {
    let origin = spec_url.origin().ascii_serialization();

    if let Some(server) = spec
        .get("servers")
        .and_then(Value::as_array)
        .and_then(|s| s.first())
        .and_then(|s| s.get("url"))
        .and_then(Value::as_str)
    {
        let server = server.trim();
        if server.starts_with("http://") || server.starts_with("https://") {
            return server.trim_end_matches('/').to_string();
        }
        if let Ok(joined) = spec_url.join(server) {
            return joined.as_str().trim_end_matches('/').to_string();
        }
    }

    if let Some(host) = spec.get("host").and_then(Value::as_str) {
        let scheme = spec
            .get("schemes")
            .and_then(Value::as_array)
            .and_then(|s| s.iter().filter_map(Value::as_str).find(|s| *s == "https"))
            .or_else(|| {
                spec.get("schemes")
                    .and_then(Value::as_array)
                    .and_then(|s| s.first())
                    .and_then(Value::as_str)
            })
            .unwrap_or(spec_url.scheme());
        let base_path = spec.get("basePath").and_then(Value::as_str).unwrap_or("");
        return format!("{}://{}{}", scheme, host, base_path)
            .trim_end_matches('/')
            .to_string();
    }

    if let Some(base_path) = spec.get("basePath").and_then(Value::as_str) {
        return format!("{}{}", origin, base_path)
            .trim_end_matches('/')
            .to_string();
    }

    origin
}

fn parameter_schema(param: &Value) -> Value {
    let schema = param.get("schema");
    let kind = schema
        .and_then(|s| s.get("type"))
        .or_else(|| param.get("type"))
        .and_then(Value::as_str)
        .unwrap_or("string");
    let mut out = Map::new();
    out.insert("type".to_string(), Value::String(kind.to_string()));
    if kind == "array" {
        let items = schema
            .and_then(|s| s.get("items"))
            .or_else(|| param.get("items"))
            .and_then(|i| i.get("type"))
            .and_then(Value::as_str)
            .unwrap_or("string");
        out.insert("items".to_string(), serde_json::json!({ "type": items }));
    }
    if let Some(values) = schema
        .and_then(|s| s.get("enum"))
        .or_else(|| param.get("enum"))
        .filter(|v| v.is_array())
    {
        out.insert("enum".to_string(), values.clone());
    }
    if let Some(description) = param.get("description").and_then(Value::as_str) {
        out.insert(
            "description".to_string(),
            Value::String(description.to_string()),
        );
    }
    Value::Object(out)
}

fn build_parameters(path_item: &Value, operation: &Value) -> Value {
    let mut properties = Map::new();
    let mut required: Vec<Value> = Vec::new();
    let mut takes_body = operation.get("requestBody").is_some();
    let mut body_required = operation
        .get("requestBody")
        .and_then(|b| b.get("required"))
        .and_then(Value::as_bool)
        .unwrap_or(false);

    let shared = path_item.get("parameters").and_then(Value::as_array);
    let own = operation.get("parameters").and_then(Value::as_array);
    for param in shared.into_iter().flatten().chain(own.into_iter().flatten()) {
        let Some(name) = param.get("name").and_then(Value::as_str) else {
            continue;
        };
        let is_required = param.get("required").and_then(Value::as_bool) == Some(true);
        match param.get("in").and_then(Value::as_str) {
            Some("path") => {
                properties.insert(name.to_string(), parameter_schema(param));
                if !required.iter().any(|r| r == name) {
                    required.push(Value::String(name.to_string()));
                }
            }
            Some("query") => {
                let key = format!("query_{}", name);
                properties.insert(key.clone(), parameter_schema(param));
                if is_required && !required.iter().any(|r| r == key.as_str()) {
                    required.push(Value::String(key));
                }
            }
            Some("body") | Some("formData") => {
                takes_body = true;
                body_required |= is_required;
            }
            _ => {}
        }
    }

    properties.insert(
        "headers".to_string(),
        serde_json::json!({
            "type": "object",
            "description": "Additional HTTP headers to send with the request",
            "additionalProperties": { "type": "string" }
        }),
    );
    if takes_body {
        properties.insert(
            "request_body".to_string(),
            serde_json::json!({
                "type": "object",
                "description": "JSON request body"
            }),
        );
        if body_required {
            required.push(Value::String("request_body".to_string()));
        }
    }

    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

/// Operations of a valid spec, at most `limit` of them, in document order.
pub fn operations_from_spec(spec: &Value, spec_url: &Url, limit: usize) -> Vec<ApiOperation> {
    let Some(paths) = spec.get("paths").and_then(Value::as_object) else {
        return Vec::new();
    };
    let server_url = resolve_server_url(spec, spec_url);
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::new();

    for (path, path_item) in paths {
        for method in METHODS {
            let Some(operation) = path_item.get(*method).filter(|o| o.is_object()) else {
                continue;
            };
            if out.len() >= limit {
                return out;
            }
            let mut name = function_name(method, path);
            if !seen.insert(name.clone()) {
                let mut n = 2;
                while seen.contains(&suffixed_name(&name, n)) {
                    n += 1;
                }
                name = suffixed_name(&name, n);
                seen.insert(name.clone());
            }
            let description = operation
                .get("summary")
                .or_else(|| operation.get("description"))
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("{} {}", method.to_ascii_uppercase(), path));
            out.push(ApiOperation {
                name,
                method: method.to_ascii_uppercase(),
                path: path.clone(),
                server_url: server_url.clone(),
                description,
                parameters: build_parameters(path_item, operation),
            });
        }
    }
    out
}

fn render_arg(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Substitutes `{name}` placeholders inside one path segment.
fn render_segment(segment: &str, args: &Value) -> Result<String, GatewayError> {
    let mut out = String::with_capacity(segment.len());
    let mut rest = segment;
    while let Some(start) = rest.find('{') {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        let key = &rest[start + 1..start + len];
        let value = args
            .get(key)
            .filter(|v| !v.is_null())
            .ok_or_else(|| GatewayError::invalid_params(format!("Missing path parameter: {}", key)))?;
        out.push_str(&rest[..start]);
        out.push_str(&render_arg(value));
        rest = &rest[start + len + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

impl ApiOperation {
    pub fn descriptor(&self) -> Value {
        serde_json::json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": format!("{} ({} {})", self.description, self.method, self.path),
                "parameters": self.parameters,
            }
        })
    }

    /// Server URL + path with placeholders filled in and `query_*` arguments
    /// appended in argument order.
    pub fn build_url(&self, args: &Value) -> Result<Url, GatewayError> {
        let mut url = Url::parse(&self.server_url).map_err(|err| {
            GatewayError::invalid_params(format!("Invalid server URL '{}': {}", self.server_url, err))
        })?;
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                GatewayError::invalid_params(format!("Server URL cannot be a base: {}", self.server_url))
            })?;
            segments.pop_if_empty();
            for segment in self.path.split('/').filter(|s| !s.is_empty()) {
                segments.push(&render_segment(segment, args)?);
            }
        }

        let query: Vec<(String, String)> = args
            .as_object()
            .map(|map| {
                map.iter()
                    .filter(|(_, v)| !v.is_null())
                    .filter_map(|(k, v)| {
                        k.strip_prefix("query_")
                            .map(|name| (name.to_string(), render_arg(v)))
                    })
                    .collect()
            })
            .unwrap_or_default();
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn operation(path: &str, method: &str) -> ApiOperation {
        ApiOperation {
            name: function_name(method, path),
            method: method.to_string(),
            path: path.to_string(),
            server_url: "https://api.example.com".to_string(),
            description: String::new(),
            parameters: json!({}),
        }
    }

    #[test]
    fn names_follow_method_and_segments() {
        assert_eq!(function_name("GET", "/pets/{petId}"), "api_get_pets_petId");
        assert_eq!(
            function_name("get", "/users/{userId}/orders/{orderId}"),
            "api_get_users_userId_orders_orderId"
        );
        assert_eq!(function_name("post", "/pets"), "api_post_pets");
        assert_eq!(function_name("get", "/"), "api_get_root");
        assert_eq!(function_name("get", "/v1/pet-store.list"), "api_get_v1_pet_store_list");
    }

    #[test]
    fn colliding_long_names_stay_within_limit() {
        let long = format!("/{}", "segment".repeat(12));
        let spec = json!({
            "openapi": "3.0.0",
            "paths": {
                format!("{}/a", long): {"get": {}},
                format!("{}/b", long): {"get": {}},
                format!("{}/c", long): {"get": {}}
            }
        });
        let spec_url = Url::parse("https://api.example.com/openapi.json").unwrap();
        let ops = operations_from_spec(&spec, &spec_url, 64);
        assert_eq!(ops.len(), 3);
        assert!(ops.iter().all(|op| op.name.chars().count() <= MAX_NAME_LEN));
        assert!(ops[1].name.ends_with("_2"));
        assert!(ops[2].name.ends_with("_3"));
        assert_ne!(ops[0].name, ops[1].name);
        assert_eq!(suffixed_name("api_get_pets", 2), "api_get_pets_2");
    }

    #[test]
    fn urls_substitute_path_and_query() {
        let op = operation("/users/{userId}/orders/{orderId}", "GET");
        let url = op.build_url(&json!({"userId": "123", "orderId": 456})).unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/users/123/orders/456");

        let list = operation("/pets", "GET");
        let url = list
            .build_url(&json!({"query_status": "available", "query_limit": "10", "headers": {}}))
            .unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/pets?status=available&limit=10");

        let err = operation("/pets/{petId}", "GET").build_url(&json!({})).unwrap_err();
        assert_eq!(err.message, "Missing path parameter: petId");
    }

    #[test]
    fn server_url_resolution() {
        let spec_url = Url::parse("https://docs.example.com/specs/openapi.json").unwrap();
        assert_eq!(
            resolve_server_url(&json!({"servers": [{"url": "https://api.example.com/v1/"}]}), &spec_url),
            "https://api.example.com/v1"
        );
        assert_eq!(
            resolve_server_url(&json!({"servers": [{"url": "/v2"}]}), &spec_url),
            "https://docs.example.com/v2"
        );
        assert_eq!(
            resolve_server_url(
                &json!({"swagger": "2.0", "host": "petstore.swagger.io", "basePath": "/v2", "schemes": ["http", "https"]}),
                &spec_url
            ),
            "https://petstore.swagger.io/v2"
        );
        assert_eq!(resolve_server_url(&json!({}), &spec_url), "https://docs.example.com");
    }

    #[test]
    fn operations_carry_parameters() {
        let spec = json!({
            "openapi": "3.0.0",
            "servers": [{"url": "https://api.example.com"}],
            "paths": {
                "/pets": {
                    "get": {
                        "summary": "List pets",
                        "parameters": [{"name": "status", "in": "query", "required": true, "schema": {"type": "string", "enum": ["available", "sold"]}}]
                    },
                    "post": {"requestBody": {"required": true, "content": {}}}
                },
                "/pets/{petId}": {
                    "parameters": [{"name": "petId", "in": "path", "required": true, "schema": {"type": "integer"}}],
                    "get": {}
                }
            }
        });
        let spec_url = Url::parse("https://api.example.com/openapi.json").unwrap();
        let ops = operations_from_spec(&spec, &spec_url, 64);
        let names: Vec<&str> = ops.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["api_get_pets", "api_post_pets", "api_get_pets_petId"]);

        let list = &ops[0].parameters;
        assert_eq!(list["properties"]["query_status"]["enum"], json!(["available", "sold"]));
        assert_eq!(list["required"], json!(["query_status"]));

        assert_eq!(ops[1].parameters["required"], json!(["request_body"]));
        assert_eq!(ops[2].parameters["properties"]["petId"]["type"], "integer");
        assert_eq!(ops[2].description, "GET /pets/{petId}");

        assert_eq!(operations_from_spec(&spec, &spec_url, 2).len(), 2);
    }
}
