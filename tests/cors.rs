mod common;
use common::{empty_request, send, test_config, test_router};

use axum::http::{Method, StatusCode};
use formgen_gateway::config::RuntimeMode;

#[tokio::test]
async fn preflight_is_answered_without_routing() {
    let mut config = test_config();
    config.mode = RuntimeMode::Production;
    let router = test_router(config);

    for uri in ["/", "/api/data", "/netlify/deploy-x", "/v1/chat/completions"] {
        let response = send(&router, empty_request(Method::OPTIONS, uri)).await;
        assert_eq!(response.status, StatusCode::NO_CONTENT, "{}", uri);
        assert_eq!(response.header("access-control-allow-origin"), Some("*"));
        assert_eq!(response.header("access-control-allow-methods"), Some("*"));
        assert_eq!(response.header("access-control-allow-headers"), Some("*"));
        assert!(response.body.is_empty());
    }
}

#[tokio::test]
async fn every_response_carries_cors_and_request_id() {
    let router = test_router(test_config());

    let ok = send(&router, empty_request(Method::GET, "/api/data")).await;
    assert_eq!(ok.status, StatusCode::OK);
    assert_eq!(ok.header("access-control-allow-origin"), Some("*"));

    let error = send(&router, empty_request(Method::GET, "/api/data/nope")).await;
    assert_eq!(error.status, StatusCode::BAD_REQUEST);
    assert_eq!(error.header("access-control-allow-origin"), Some("*"));

    let first = ok.header("x-request-id").expect("request id").to_string();
    let second = error.header("x-request-id").expect("request id").to_string();
    assert_eq!(first.len(), 36);
    assert_ne!(first, second);
}
