use crate::config::Config;
use crate::constants::limits::LOG_SUBSTRING_LENGTH;
use crate::errors::GatewayError;
use crate::managers::openapi::OpenApiManager;
use crate::openapi::tool::{
    documentation_descriptor, extract_tool_calls, follow_up_body, inject_tools, take_tool_flag,
};
use crate::services::logger::Logger;
use crate::services::tool_executor::ToolExecutor;
use crate::services::validation::Validation;
use crate::utils::multipart::{is_multipart, validate_multipart};
use crate::utils::text::preview;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, ORIGIN};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use reqwest::Client;
use serde_json::{Map, Value};
use std::sync::Arc;

pub const API_URL_HEADER: &str = "api-url";
pub const API_PATH_HEADER: &str = "api-path";
pub const SYSTEM_KEY_HEADER: &str = "system-key";

const GATEWAY_UNREACHABLE: &str = "Error connecting to AI Gateway";

/// Everything the proxy needs from the inbound request.
#[derive(Debug, Clone)]
pub struct ProxyRequest {
    pub method: Method,
    pub headers: HeaderMap,
    pub query: Option<String>,
    pub body: Bytes,
}

#[derive(Debug, Clone)]
pub struct ProxyResponse {
    pub status: StatusCode,
    pub content_type: String,
    pub body: Bytes,
}

impl ProxyResponse {
    fn is_json_success(&self) -> bool {
        self.status.is_success() && self.content_type.to_ascii_lowercase().contains("application/json")
    }
}

impl IntoResponse for ProxyResponse {
    fn into_response(self) -> Response {
        (self.status, [(CONTENT_TYPE, self.content_type)], self.body).into_response()
    }
}

struct Outbound {
    method: Method,
    url: String,
    authorization: Option<String>,
    content_type: String,
}

/// JSON body ready to forward, plus the tool state when tools were injected.
struct PreparedBody {
    body: Bytes,
    tools: Option<(Map<String, Value>, ToolExecutor)>,
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

#[derive(Clone)]
pub struct ProxyManager {
    logger: Logger,
    config: Arc<Config>,
    validation: Validation,
    client: Client,
    openapi: Arc<OpenApiManager>,
}

impl ProxyManager {
    pub fn new(
        logger: Logger,
        config: Arc<Config>,
        validation: Validation,
        client: Client,
        openapi: Arc<OpenApiManager>,
    ) -> Self {
        Self {
            logger: logger.child("proxy"),
            config,
            validation,
            client,
            openapi,
        }
    }

    fn check_origin(&self, headers: &HeaderMap) -> Result<(), GatewayError> {
        if self.config.is_dev() {
            return Ok(());
        }
        let origin = header_str(headers, ORIGIN.as_str());
        if self.config.origin_allowed(origin) {
            return Ok(());
        }
        self.logger.warn(
            "Rejected origin",
            Some(&serde_json::json!({ "origin": origin })),
        );
        Err(GatewayError::denied("Forbidden: invalid origin"))
    }

    /// `{api-url}/{api-path}` with exactly one slash between them and the
    /// inbound query string carried over.
    pub fn target_url(&self, headers: &HeaderMap, query: Option<&str>) -> Result<String, GatewayError> {
        let (Some(api_url), Some(api_path)) = (
            header_str(headers, API_URL_HEADER),
            header_str(headers, API_PATH_HEADER),
        ) else {
            return Err(GatewayError::invalid_params("Missing api-url or api-path header")
                .with_hint("Set the api-url header to the provider base URL and api-path to the endpoint path"));
        };
        self.validation.ensure_http_url(api_url, "api-url")?;

        let mut target = format!(
            "{}/{}",
            api_url.trim_end_matches('/'),
            api_path.trim_start_matches('/')
        );
        if let Some(query) = query.map(str::trim).filter(|q| !q.is_empty()) {
            target.push(if target.contains('?') { '&' } else { '?' });
            target.push_str(query);
        }
        url::Url::parse(&target).map_err(|_| {
            GatewayError::invalid_params("Invalid target URL")
                .with_details(serde_json::json!({ "target": target }))
        })?;
        Ok(target)
    }

    /// Configured provider secret for `system-key`, else the caller's own header.
    pub fn authorization(&self, headers: &HeaderMap) -> Result<Option<String>, GatewayError> {
        if let Some(system_key) = header_str(headers, SYSTEM_KEY_HEADER) {
            let key = system_key.to_ascii_lowercase();
            return match self.config.system_keys.get(&key) {
                Some(Some(secret)) => Ok(Some(format!("Bearer {}", secret))),
                Some(None) => Err(GatewayError::internal(format!(
                    "System key '{}' is not configured",
                    key
                ))),
                None => Err(GatewayError::invalid_params(format!(
                    "Unknown system-key: {}",
                    system_key
                ))
                .with_hint("Supported system keys: openai, gemini")),
            };
        }
        Ok(header_str(headers, AUTHORIZATION.as_str()).map(str::to_string))
    }

    pub async fn forward(&self, request: ProxyRequest) -> Result<ProxyResponse, GatewayError> {
        self.check_origin(&request.headers)?;
        let url = self.target_url(&request.headers, request.query.as_deref())?;
        let authorization = self.authorization(&request.headers)?;
        let inbound_type = header_str(&request.headers, CONTENT_TYPE.as_str());

        if is_multipart(inbound_type) {
            let content_type = inbound_type.unwrap_or_default().to_string();
            let summary = validate_multipart(&content_type, request.body.clone()).await?;
            self.logger.info(
                "Forwarding multipart request",
                Some(&serde_json::json!({
                    "method": request.method.as_str(),
                    "target": url,
                    "files": summary.files,
                    "fields": summary.fields,
                })),
            );
            let outbound = Outbound {
                method: request.method,
                url,
                authorization,
                content_type,
            };
            return self.send(&outbound, request.body).await;
        }

        let prepared = self.prepare_json_body(request.body).await;
        self.logger.info(
            "Forwarding request",
            Some(&serde_json::json!({
                "method": request.method.as_str(),
                "target": url,
                "tools": prepared.tools.as_ref().map(|(_, executor)| executor.len()),
            })),
        );
        let outbound = Outbound {
            method: request.method,
            url,
            authorization,
            content_type: "application/json".to_string(),
        };
        let response = self.send(&outbound, prepared.body).await?;

        match prepared.tools {
            Some((forwarded, executor)) if response.is_json_success() => {
                self.complete_tool_calls(&outbound, forwarded, &executor, response)
                    .await
            }
            _ => Ok(response),
        }
    }

    /// Strips the tool flag and, when it is enabled, injects the descriptors.
    /// Bodies that are not JSON objects are forwarded byte for byte.
    async fn prepare_json_body(&self, body: Bytes) -> PreparedBody {
        let untouched = |body: Bytes| PreparedBody { body, tools: None };
        if body.is_empty() {
            return untouched(body);
        }
        let Ok(Value::Object(mut map)) = serde_json::from_slice::<Value>(&body) else {
            return untouched(body);
        };
        let Some(options) = take_tool_flag(&mut map) else {
            return untouched(body);
        };

        let tools = if options.enabled {
            let operations = self.openapi.load_operations(&options.openapi_urls).await;
            let mut descriptors = vec![documentation_descriptor()];
            descriptors.extend(operations.iter().map(|op| op.descriptor()));
            inject_tools(&mut map, descriptors);
            Some(self.openapi.tool_executor(operations))
        } else {
            None
        };

        match serde_json::to_vec(&Value::Object(map.clone())) {
            Ok(encoded) => PreparedBody {
                body: Bytes::from(encoded),
                tools: tools.map(|executor| (map, executor)),
            },
            Err(_) => untouched(body),
        }
    }

    async fn send(&self, outbound: &Outbound, body: Bytes) -> Result<ProxyResponse, GatewayError> {
        let mut request = self
            .client
            .request(outbound.method.clone(), outbound.url.as_str())
            .header(CONTENT_TYPE, outbound.content_type.as_str());
        if let Some(auth) = &outbound.authorization {
            request = request.header(AUTHORIZATION, auth.as_str());
        }
        if !body.is_empty() {
            request = request.body(body);
        }

        let unreachable = |err: reqwest::Error| {
            self.logger.error(
                GATEWAY_UNREACHABLE,
                Some(&serde_json::json!({ "target": outbound.url, "error": err.to_string() })),
            );
            GatewayError::upstream(GATEWAY_UNREACHABLE).with_hint(err.to_string())
        };
        let response = request.send().await.map_err(unreachable)?;
        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/json")
            .to_string();
        let body = response.bytes().await.map_err(unreachable)?;

        if !status.is_success() {
            self.logger.warn(
                "Upstream answered with an error",
                Some(&serde_json::json!({
                    "target": outbound.url,
                    "status": status.as_u16(),
                    "body": preview(&String::from_utf8_lossy(&body), LOG_SUBSTRING_LENGTH),
                })),
            );
        }
        Ok(ProxyResponse {
            status,
            content_type,
            body,
        })
    }

    /// Runs the tool calls of the first choice and replaces the answer with
    /// the follow-up completion. Answers without tool calls pass through.
    async fn complete_tool_calls(
        &self,
        outbound: &Outbound,
        forwarded: Map<String, Value>,
        executor: &ToolExecutor,
        response: ProxyResponse,
    ) -> Result<ProxyResponse, GatewayError> {
        let Ok(parsed) = serde_json::from_slice::<Value>(&response.body) else {
            return Ok(response);
        };
        let Some((assistant, calls)) = extract_tool_calls(&parsed) else {
            return Ok(response);
        };

        let mut results = Vec::with_capacity(calls.len());
        for call in calls {
            self.logger.info(
                "Executing tool call",
                Some(&serde_json::json!({ "id": call.id, "function": call.name })),
            );
            let result = executor.execute(&call.name, call.arguments).await;
            results.push((call.id, result));
        }

        let follow_up = follow_up_body(&forwarded, assistant, results);
        let encoded = serde_json::to_vec(&follow_up)
            .map_err(|err| GatewayError::internal(format!("Failed to encode follow-up: {}", err)))?;
        self.logger.info(
            "Sending follow-up completion",
            Some(&serde_json::json!({ "target": outbound.url })),
        );
        self.send(outbound, Bytes::from(encoded)).await
    }
}
