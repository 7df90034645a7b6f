use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::Value;
use std::error::Error;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayErrorKind {
    InvalidParams,
    Denied,
    NotFound,
    MethodNotAllowed,
    Timeout,
    Upstream,
    Internal,
}

impl GatewayErrorKind {
    pub fn status(self) -> StatusCode {
        match self {
            GatewayErrorKind::InvalidParams => StatusCode::BAD_REQUEST,
            GatewayErrorKind::Denied => StatusCode::FORBIDDEN,
            GatewayErrorKind::NotFound => StatusCode::NOT_FOUND,
            GatewayErrorKind::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            GatewayErrorKind::Timeout => StatusCode::REQUEST_TIMEOUT,
            GatewayErrorKind::Upstream => StatusCode::BAD_GATEWAY,
            GatewayErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error surfaced to HTTP callers as a `{ success: false, ... }` envelope.
///
/// `status` overrides the status implied by `kind`; it is used when an
/// upstream answered with a status worth relaying as-is.
#[derive(Debug, Clone, Serialize)]
pub struct GatewayError {
    pub kind: GatewayErrorKind,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    #[serde(skip)]
    pub status: Option<u16>,
}

impl GatewayError {
    pub fn new(
        kind: GatewayErrorKind,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            code: code.into(),
            message: message.into(),
            hint: None,
            details: None,
            status: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorKind::InvalidParams, "INVALID_PARAMS", message)
    }

    pub fn denied(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorKind::Denied, "DENIED", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorKind::NotFound, "NOT_FOUND", message)
    }

    pub fn method_not_allowed(message: impl Into<String>) -> Self {
        Self::new(
            GatewayErrorKind::MethodNotAllowed,
            "METHOD_NOT_ALLOWED",
            message,
        )
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorKind::Timeout, "TIMEOUT", message)
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorKind::Upstream, "UPSTREAM", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorKind::Internal, "INTERNAL", message)
    }

    pub fn status_code(&self) -> StatusCode {
        self.status
            .and_then(|code| StatusCode::from_u16(code).ok())
            .unwrap_or_else(|| self.kind.status())
    }

    /// The `{ success: false, error, message, ...details }` body.
    pub fn envelope(&self) -> Value {
        let mut body = serde_json::Map::new();
        body.insert("success".to_string(), Value::Bool(false));
        body.insert("error".to_string(), Value::String(self.message.clone()));
        body.insert(
            "message".to_string(),
            Value::String(self.hint.clone().unwrap_or_else(|| self.message.clone())),
        );
        body.insert("code".to_string(), Value::String(self.code.clone()));
        if let Some(Value::Object(details)) = &self.details {
            for (key, value) in details {
                body.entry(key.clone()).or_insert_with(|| value.clone());
            }
        }
        Value::Object(body)
    }
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for GatewayError {}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.envelope())).into_response()
    }
}

impl From<std::io::Error> for GatewayError {
    fn from(err: std::io::Error) -> Self {
        GatewayError::internal(err.to_string())
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        GatewayError::invalid_params(format!("Invalid JSON: {}", err))
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GatewayError::timeout(err.to_string())
        } else {
            GatewayError::upstream(err.to_string())
        }
    }
}
