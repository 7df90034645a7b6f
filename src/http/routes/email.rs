use crate::app::App;
use crate::errors::GatewayError;
use axum::extract::State;
use axum::Json;
use bytes::Bytes;
use serde_json::Value;
use std::sync::Arc;

pub async fn send_form_data(
    State(app): State<Arc<App>>,
    body: Bytes,
) -> Result<Json<Value>, GatewayError> {
    app.email.send_form_data(&body).await.map(Json)
}
