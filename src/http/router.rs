use crate::app::App;
use crate::constants::limits::MAX_REQUEST_BYTES;
use crate::http::middleware::{cors, log_requests};
use crate::http::routes::{self, email, forms, netlify, openapi, proxy};
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::{middleware, Router};
use std::sync::Arc;

/// Route table. Anything unmatched falls through to the LLM proxy.
pub fn build(app: Arc<App>) -> Router {
    Router::new()
        .route(
            "/email/form-data",
            post(email::send_form_data).fallback(routes::method_not_allowed),
        )
        .route(
            "/api/data",
            get(forms::list)
                .post(forms::create)
                .fallback(routes::method_not_allowed),
        )
        .route(
            "/api/data/{id}",
            get(forms::get)
                .put(forms::update)
                .delete(forms::delete)
                .fallback(routes::method_not_allowed),
        )
        .route(
            "/api/openapi",
            get(openapi::fetch).fallback(openapi::get_only),
        )
        .route(
            "/api/swagger",
            get(openapi::fetch).fallback(openapi::get_only),
        )
        .route(
            "/netlify",
            get(netlify::callback).fallback(routes::method_not_allowed),
        )
        .route(
            "/netlify/{action}",
            get(netlify::authorize)
                .post(netlify::deploy)
                .fallback(routes::method_not_allowed),
        )
        .fallback(proxy::forward)
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BYTES))
        .layer(middleware::from_fn(cors))
        .layer(middleware::from_fn_with_state(app.clone(), log_requests))
        .with_state(app)
}
