use crate::app::App;
use crate::constants::netlify::DEPLOY_ACTION_PREFIX;
use crate::errors::GatewayError;
use crate::managers::netlify::CallbackQuery;
use axum::extract::{Path, Query, State};
use axum::http::header::LOCATION;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct AuthorizeQuery {
    state: Option<String>,
}

fn found(location: String) -> Response {
    (StatusCode::FOUND, [(LOCATION, location)]).into_response()
}

pub async fn callback(
    State(app): State<Arc<App>>,
    Query(query): Query<CallbackQuery>,
) -> Result<Response, GatewayError> {
    app.netlify.callback(&query).await.map(found)
}

pub async fn authorize(
    State(app): State<Arc<App>>,
    Path(action): Path<String>,
    Query(query): Query<AuthorizeQuery>,
) -> Result<Response, GatewayError> {
    if action.starts_with(DEPLOY_ACTION_PREFIX) {
        return Err(GatewayError::method_not_allowed(
            "Deploy actions only accept POST",
        ));
    }
    app.netlify.authorize_url(query.state.as_deref()).map(found)
}

pub async fn deploy(
    State(app): State<Arc<App>>,
    Path(action): Path<String>,
    body: Bytes,
) -> Result<Json<Value>, GatewayError> {
    let Some(target) = action.strip_prefix(DEPLOY_ACTION_PREFIX) else {
        return Err(GatewayError::method_not_allowed(format!(
            "POST is only supported for {}* actions",
            DEPLOY_ACTION_PREFIX
        )));
    };
    app.netlify.deploy(target, &body).await.map(Json)
}
