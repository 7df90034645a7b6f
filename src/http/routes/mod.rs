use crate::errors::GatewayError;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, Method};

pub mod email;
pub mod forms;
pub mod netlify;
pub mod openapi;
pub mod proxy;

pub(crate) fn content_type(headers: &HeaderMap) -> Option<&str> {
    headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
}

pub async fn method_not_allowed(method: Method) -> GatewayError {
    GatewayError::method_not_allowed(format!("Method {} not allowed", method))
}
