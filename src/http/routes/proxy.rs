use crate::app::App;
use crate::errors::GatewayError;
use crate::managers::proxy::{ProxyRequest, ProxyResponse};
use axum::extract::State;
use axum::http::{HeaderMap, Method, Uri};
use bytes::Bytes;
use std::sync::Arc;

/// Catch-all: every path without its own route is relayed to the LLM provider.
pub async fn forward(
    State(app): State<Arc<App>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<ProxyResponse, GatewayError> {
    app.proxy
        .forward(ProxyRequest {
            method,
            headers,
            query: uri.query().map(str::to_string),
            body,
        })
        .await
}
