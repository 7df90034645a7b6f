use crate::constants::limits::{LOG_SUBSTRING_LENGTH, MAX_GENERATED_FUNCTIONS};
use crate::constants::network::{SPEC_ACCEPT, USER_AGENT};
use crate::constants::tools::{OPENAPI_DOCS_FUNCTION, SUMMARY_NOTE, YAML_NOTE};
use crate::errors::GatewayError;
use crate::openapi::operations::operations_from_spec;
use crate::openapi::spec::{decode_document, endpoint_payload, is_valid_spec, summarize};
use crate::openapi::{ApiOperation, SpecDocument};
use crate::services::logger::Logger;
use crate::services::tool_executor::{ToolExecutor, ToolHandler};
use crate::services::validation::Validation;
use crate::utils::text::preview;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

const INVALID_SPEC_MESSAGE: &str =
    "The provided URL does not contain a valid OpenAPI 3.x or Swagger 2.x specification";

/// Fetches OpenAPI/Swagger documents and executes the functions derived from them.
#[derive(Clone)]
pub struct OpenApiManager {
    logger: Logger,
    validation: Validation,
    client: Client,
    fetch_timeout: Duration,
}

fn map_fetch_error(err: reqwest::Error) -> GatewayError {
    if err.is_timeout() {
        GatewayError::timeout("Request timeout - the OpenAPI specification took too long to fetch")
    } else {
        GatewayError::upstream("Network error - unable to reach the provided URL")
            .with_hint(err.to_string())
    }
}

/// Tool results carry a single `error` string, so the hint is folded in.
fn tool_failure(err: GatewayError) -> GatewayError {
    match err.hint.clone() {
        Some(hint) if hint != err.message => {
            GatewayError::new(err.kind, err.code, format!("{}: {}", err.message, hint))
        }
        _ => err,
    }
}

impl OpenApiManager {
    pub fn new(
        logger: Logger,
        validation: Validation,
        client: Client,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            logger: logger.child("openapi"),
            validation,
            client,
            fetch_timeout,
        }
    }

    pub async fn fetch_document(&self, url: &Url) -> Result<SpecDocument, GatewayError> {
        self.logger.info(
            "Fetching OpenAPI specification",
            Some(&serde_json::json!({ "url": url.as_str() })),
        );
        let response = self
            .client
            .get(url.clone())
            .header(ACCEPT, SPEC_ACCEPT)
            .timeout(self.fetch_timeout)
            .send()
            .await
            .map_err(map_fetch_error)?;

        let status = response.status();
        if !status.is_success() {
            self.logger.warn(
                "Specification host answered with an error",
                Some(&serde_json::json!({ "url": url.as_str(), "status": status.as_u16() })),
            );
            return Err(GatewayError::upstream("Failed to fetch OpenAPI specification")
                .with_hint(format!(
                    "HTTP {} {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("")
                ).trim_end().to_string())
                .with_status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        let body = response.text().await.map_err(map_fetch_error)?;
        decode_document(&content_type, &body)
    }

    /// `GET /api/openapi?url=...`
    pub async fn fetch_spec(&self, raw_url: Option<&str>) -> Result<Value, GatewayError> {
        let raw_url = raw_url.map(str::trim).filter(|u| !u.is_empty()).ok_or_else(|| {
            GatewayError::invalid_params("Missing required parameter: url")
                .with_hint("Please provide a URL parameter with the OpenAPI/Swagger specification URL")
        })?;
        let url = self.validation.ensure_http_url(raw_url, "URL")?;
        let with_url = |err: GatewayError| {
            err.with_details(serde_json::json!({ "url": raw_url }))
        };

        let document = self.fetch_document(&url).await.map_err(with_url)?;
        if let SpecDocument::Json(spec) = &document {
            if !is_valid_spec(spec) {
                return Err(with_url(
                    GatewayError::invalid_params("Invalid OpenAPI/Swagger specification")
                        .with_hint(INVALID_SPEC_MESSAGE),
                ));
            }
        }
        Ok(endpoint_payload(document, raw_url))
    }

    /// `get_openapi_documentation` tool body.
    pub async fn documentation(&self, args: &Value) -> Result<Value, GatewayError> {
        let raw_url = args
            .get("url")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| GatewayError::invalid_params("URL parameter is required"))?;
        let url = self
            .validation
            .ensure_http_url(raw_url, "URL")
            .map_err(|_| GatewayError::invalid_params("Invalid URL format"))?;
        let format = args.get("format").and_then(Value::as_str).unwrap_or("json");

        let spec = match self.fetch_document(&url).await.map_err(tool_failure)? {
            SpecDocument::Yaml(content) => {
                return Ok(serde_json::json!({
                    "success": true,
                    "data": {
                        "content": content,
                        "contentType": "yaml",
                        "url": raw_url,
                        "note": YAML_NOTE,
                    },
                    "format": "yaml",
                }));
            }
            SpecDocument::Json(spec) => spec,
        };
        if !is_valid_spec(&spec) {
            return Err(GatewayError::invalid_params(INVALID_SPEC_MESSAGE));
        }

        let summary = summarize(&spec);
        if format == "yaml" {
            let mut data = serde_json::to_value(&summary)?;
            if let Value::Object(map) = &mut data {
                map.insert("note".to_string(), Value::String(SUMMARY_NOTE.to_string()));
                map.insert("url".to_string(), Value::String(raw_url.to_string()));
            }
            return Ok(serde_json::json!({
                "success": true,
                "data": data,
                "format": "yaml",
            }));
        }
        Ok(serde_json::json!({
            "success": true,
            "data": spec,
            "format": "json",
            "url": raw_url,
            "summary": summary,
        }))
    }

    /// Operations of every reachable, valid spec. Failures are logged and skipped.
    pub async fn load_operations(&self, urls: &[String]) -> Vec<ApiOperation> {
        let mut out: Vec<ApiOperation> = Vec::new();
        for raw in urls {
            let remaining = MAX_GENERATED_FUNCTIONS.saturating_sub(out.len());
            if remaining == 0 {
                self.logger.warn(
                    "Generated function limit reached",
                    Some(&serde_json::json!({ "limit": MAX_GENERATED_FUNCTIONS })),
                );
                break;
            }
            let url = match self.validation.ensure_http_url(raw, "URL") {
                Ok(url) => url,
                Err(err) => {
                    self.logger.warn(
                        "Skipping OpenAPI URL",
                        Some(&serde_json::json!({ "url": raw, "error": err.message })),
                    );
                    continue;
                }
            };
            match self.fetch_document(&url).await {
                Ok(SpecDocument::Json(spec)) if is_valid_spec(&spec) => {
                    let operations = operations_from_spec(&spec, &url, remaining);
                    self.logger.info(
                        "Loaded API functions",
                        Some(&serde_json::json!({ "url": raw, "count": operations.len() })),
                    );
                    for op in operations {
                        if !out.iter().any(|existing| existing.name == op.name) {
                            out.push(op);
                        }
                    }
                }
                Ok(_) => self.logger.warn(
                    "Skipping OpenAPI URL without a usable JSON specification",
                    Some(&serde_json::json!({ "url": raw })),
                ),
                Err(err) => self.logger.warn(
                    "Skipping unreachable OpenAPI URL",
                    Some(&serde_json::json!({ "url": raw, "error": err.message })),
                ),
            }
        }
        out
    }

    /// Executes one generated function against its API.
    pub async fn call_operation(
        &self,
        operation: &ApiOperation,
        args: &Value,
    ) -> Result<Value, GatewayError> {
        let url = operation.build_url(args)?;
        let method = Method::from_bytes(operation.method.as_bytes()).map_err(|_| {
            GatewayError::invalid_params(format!("Unsupported method: {}", operation.method))
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            reqwest::header::USER_AGENT,
            HeaderValue::from_static(USER_AGENT),
        );
        for (key, value) in self.validation.ensure_headers(args.get("headers"))? {
            let name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|_| GatewayError::invalid_params(format!("Invalid header name: {}", key)))?;
            let value = HeaderValue::from_str(value.as_str().unwrap_or_default())
                .map_err(|_| GatewayError::invalid_params(format!("Invalid header value for {}", key)))?;
            headers.insert(name, value);
        }

        let mut request = self.client.request(method, url.clone()).headers(headers);
        if let Some(body) = args.get("request_body").filter(|b| !b.is_null()) {
            request = request.body(serde_json::to_vec(body)?);
        }

        let response = request
            .send()
            .await
            .map_err(|err| GatewayError::upstream(err.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|err| GatewayError::upstream(err.to_string()))?;
        let data = serde_json::from_str::<Value>(&text).unwrap_or(Value::String(text));

        self.logger.debug(
            "API function answered",
            Some(&serde_json::json!({
                "function": operation.name,
                "url": url.as_str(),
                "status": status.as_u16(),
                "preview": preview(&data.to_string(), LOG_SUBSTRING_LENGTH),
            })),
        );

        Ok(serde_json::json!({
            "success": status.is_success(),
            "status": status.as_u16(),
            "data": data,
        }))
    }

    /// Executor with the documentation tool plus one handler per operation.
    pub fn tool_executor(self: &Arc<Self>, operations: Vec<ApiOperation>) -> ToolExecutor {
        let mut executor = ToolExecutor::new(self.logger.clone());
        executor.register(
            OPENAPI_DOCS_FUNCTION,
            Arc::new(DocumentationTool {
                manager: self.clone(),
            }),
        );
        for operation in operations {
            executor.register(
                operation.name.clone(),
                Arc::new(ApiFunctionTool {
                    manager: self.clone(),
                    operation,
                }),
            );
        }
        executor
    }
}

struct DocumentationTool {
    manager: Arc<OpenApiManager>,
}

#[async_trait]
impl ToolHandler for DocumentationTool {
    async fn handle(&self, args: Value) -> Result<Value, GatewayError> {
        self.manager.documentation(&args).await
    }
}

struct ApiFunctionTool {
    manager: Arc<OpenApiManager>,
    operation: ApiOperation,
}

#[async_trait]
impl ToolHandler for ApiFunctionTool {
    async fn handle(&self, args: Value) -> Result<Value, GatewayError> {
        self.manager.call_operation(&self.operation, &args).await
    }
}
