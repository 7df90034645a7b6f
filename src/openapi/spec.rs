use crate::constants::tools::YAML_NOTE;
use crate::errors::GatewayError;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Json,
    Yaml,
    Other,
}

impl ContentKind {
    pub fn sniff(content_type: &str) -> Self {
        let lowered = content_type.to_ascii_lowercase();
        if lowered.contains("application/json") {
            ContentKind::Json
        } else if lowered.contains("application/yaml") || lowered.contains("text/yaml") {
            ContentKind::Yaml
        } else {
            ContentKind::Other
        }
    }
}

/// A fetched document: parsed JSON, or YAML kept as text.
#[derive(Debug, Clone, PartialEq)]
pub enum SpecDocument {
    Json(Value),
    Yaml(String),
}

pub fn decode_document(content_type: &str, body: &str) -> Result<SpecDocument, GatewayError> {
    match ContentKind::sniff(content_type) {
        ContentKind::Yaml => Ok(SpecDocument::Yaml(body.to_string())),
        ContentKind::Json => serde_json::from_str(body)
            .map(SpecDocument::Json)
            .map_err(|err| {
                GatewayError::invalid_params("Invalid JSON specification")
                    .with_hint(format!("Response declared JSON but failed to parse: {}", err))
            }),
        ContentKind::Other => serde_json::from_str(body)
            .map(SpecDocument::Json)
            .map_err(|_| {
                GatewayError::invalid_params("Unsupported content type").with_hint(format!(
                    "Content type '{}' is not supported. Please provide a JSON or YAML OpenAPI specification.",
                    content_type
                ))
            }),
    }
}

fn non_empty_str(value: Option<&Value>) -> bool {
    value
        .and_then(|v| v.as_str())
        .is_some_and(|s| !s.trim().is_empty())
}

/// An object with a version string under `openapi`/`swagger`, or with both
/// `info` and `paths` objects.
pub fn is_valid_spec(doc: &Value) -> bool {
    let Some(obj) = doc.as_object() else {
        return false;
    };
    if non_empty_str(obj.get("openapi")) || non_empty_str(obj.get("swagger")) {
        return true;
    }
    obj.get("info").is_some_and(Value::is_object) && obj.get("paths").is_some_and(Value::is_object)
}

#[derive(Debug, Clone, Serialize)]
pub struct SpecSummary {
    pub title: String,
    pub version: String,
    pub description: String,
    pub endpoints: Vec<String>,
    pub servers: Value,
}

pub fn summarize(doc: &Value) -> SpecSummary {
    let info = doc.get("info");
    let text = |key: &str, fallback: &str| {
        info.and_then(|i| i.get(key))
            .and_then(|v| v.as_str())
            .unwrap_or(fallback)
            .to_string()
    };
    SpecSummary {
        title: text("title", "Unknown API"),
        version: text("version", "Unknown version"),
        description: text("description", "No description available"),
        endpoints: doc
            .get("paths")
            .and_then(|p| p.as_object())
            .map(|paths| paths.keys().cloned().collect())
            .unwrap_or_default(),
        servers: doc
            .get("servers")
            .cloned()
            .unwrap_or_else(|| Value::Array(Vec::new())),
    }
}

/// Body of a successful `GET /api/openapi` call.
pub fn endpoint_payload(document: SpecDocument, url: &str) -> Value {
    match document {
        SpecDocument::Json(data) => serde_json::json!({
            "success": true,
            "data": data,
            "url": url,
            "contentType": "json",
        }),
        SpecDocument::Yaml(text) => serde_json::json!({
            "success": true,
            "data": text,
            "url": url,
            "contentType": "yaml",
            "message": YAML_NOTE,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn validity_rule() {
        assert!(is_valid_spec(&json!({"openapi": "3.0.0", "info": {}, "paths": {}})));
        assert!(is_valid_spec(&json!({"swagger": "2.0"})));
        assert!(is_valid_spec(&json!({"info": {"title": "x"}, "paths": {}})));
        assert!(!is_valid_spec(&json!({"openapi": ""})));
        assert!(!is_valid_spec(&json!({"info": {}})));
        assert!(!is_valid_spec(&json!({"random": "data"})));
        assert!(!is_valid_spec(&json!("openapi")));
    }

    #[test]
    fn sniffing_and_decoding() {
        assert_eq!(
            ContentKind::sniff("application/json; charset=utf-8"),
            ContentKind::Json
        );
        assert_eq!(ContentKind::sniff("text/yaml"), ContentKind::Yaml);
        assert_eq!(
            decode_document("text/plain", r#"{"swagger":"2.0"}"#).unwrap(),
            SpecDocument::Json(json!({"swagger": "2.0"}))
        );
        let err = decode_document("text/html", "<html></html>").unwrap_err();
        assert_eq!(err.message, "Unsupported content type");
        assert!(matches!(
            decode_document("application/yaml", "openapi: 3.0.0").unwrap(),
            SpecDocument::Yaml(_)
        ));
    }

    #[test]
    fn summary_defaults() {
        let summary = summarize(&json!({"paths": {"/pets": {}, "/users": {}}}));
        assert_eq!(summary.title, "Unknown API");
        assert_eq!(summary.endpoints, vec!["/pets", "/users"]);
        assert_eq!(summary.servers, json!([]));
    }
}
