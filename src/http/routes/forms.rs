use super::content_type;
use crate::app::App;
use crate::errors::GatewayError;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use bytes::Bytes;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    limit: Option<String>,
    offset: Option<String>,
}

pub async fn create(
    State(app): State<Arc<App>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>), GatewayError> {
    let created = app.forms.create(content_type(&headers), &body).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list(
    State(app): State<Arc<App>>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Value>, GatewayError> {
    app.forms
        .list(page.limit.as_deref(), page.offset.as_deref())
        .await
        .map(Json)
}

pub async fn get(
    State(app): State<Arc<App>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, GatewayError> {
    app.forms.get(&id).await.map(Json)
}

pub async fn update(
    State(app): State<Arc<App>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, GatewayError> {
    app.forms
        .update(&id, content_type(&headers), &body)
        .await
        .map(Json)
}

pub async fn delete(
    State(app): State<Arc<App>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, GatewayError> {
    app.forms.delete(&id).await.map(Json)
}
