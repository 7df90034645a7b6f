use crate::app::App;
use crate::errors::GatewayError;
use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct SpecQuery {
    url: Option<String>,
}

pub async fn fetch(
    State(app): State<Arc<App>>,
    Query(query): Query<SpecQuery>,
) -> Result<Json<Value>, GatewayError> {
    app.openapi.fetch_spec(query.url.as_deref()).await.map(Json)
}

pub async fn get_only() -> GatewayError {
    GatewayError::method_not_allowed("Only GET requests are allowed for OpenAPI/Swagger fetching")
}
