mod common;
use common::{empty_request, send, test_config, test_router};

use axum::http::{Method, StatusCode};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn spec_uri(server: &MockServer, spec_path: &str) -> String {
    format!("/api/openapi?url={}{}", server.uri(), spec_path)
}

#[tokio::test]
async fn returns_json_specification() {
    let server = MockServer::start().await;
    let spec = json!({"openapi": "3.0.0", "info": {"title": "Pets", "version": "1"}, "paths": {}});
    Mock::given(method("GET"))
        .and(path("/openapi.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(spec.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let router = test_router(test_config());
    let response = send(&router, empty_request(Method::GET, &spec_uri(&server, "/openapi.json"))).await;

    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["contentType"], "json");
    assert_eq!(body["data"], spec);
    assert_eq!(body["url"], format!("{}/openapi.json", server.uri()));
}

#[tokio::test]
async fn swagger_alias_serves_the_same_handler() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/swagger.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"swagger": "2.0", "paths": {}})))
        .mount(&server)
        .await;

    let router = test_router(test_config());
    let uri = format!("/api/swagger?url={}/swagger.json", server.uri());
    let response = send(&router, empty_request(Method::GET, &uri)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["data"]["swagger"], "2.0");
}

#[tokio::test]
async fn yaml_is_returned_as_text() {
    let server = MockServer::start().await;
    let yaml = "openapi: 3.0.0\ninfo:\n  title: Pets\n";
    Mock::given(method("GET"))
        .and(path("/openapi.yaml"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(yaml, "application/yaml"))
        .mount(&server)
        .await;

    let router = test_router(test_config());
    let response = send(&router, empty_request(Method::GET, &spec_uri(&server, "/openapi.yaml"))).await;

    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["contentType"], "yaml");
    assert_eq!(body["data"], yaml);
    assert!(body["message"].as_str().unwrap().contains("YAML"));
}

#[tokio::test]
async fn documents_that_are_not_specs_are_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/random.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"random": "data"})))
        .mount(&server)
        .await;

    let router = test_router(test_config());
    let response = send(&router, empty_request(Method::GET, &spec_uri(&server, "/random.json"))).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let body = response.json();
    assert_eq!(body["error"], "Invalid OpenAPI/Swagger specification");
    assert_eq!(body["url"], format!("{}/random.json", server.uri()));
}

#[tokio::test]
async fn upstream_status_is_relayed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing.json"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let router = test_router(test_config());
    let response = send(&router, empty_request(Method::GET, &spec_uri(&server, "/missing.json"))).await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    let body = response.json();
    assert_eq!(body["error"], "Failed to fetch OpenAPI specification");
    assert_eq!(body["message"], "HTTP 404 Not Found");
}

#[tokio::test]
async fn unsupported_content_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<html></html>", "text/html"))
        .mount(&server)
        .await;

    let router = test_router(test_config());
    let response = send(&router, empty_request(Method::GET, &spec_uri(&server, "/page"))).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["error"], "Unsupported content type");
}

#[tokio::test]
async fn url_parameter_is_validated() {
    let router = test_router(test_config());

    let missing = send(&router, empty_request(Method::GET, "/api/openapi")).await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert_eq!(missing.json()["error"], "Missing required parameter: url");

    let bad = send(&router, empty_request(Method::GET, "/api/openapi?url=ftp://x.example/spec")).await;
    assert_eq!(bad.status, StatusCode::BAD_REQUEST);
    let body = bad.json();
    assert_eq!(body["error"], "Invalid URL format");
    assert_eq!(body["message"], "Please provide a valid HTTP or HTTPS URL");
}

#[tokio::test]
async fn unreachable_hosts_are_bad_gateway() {
    let router = test_router(test_config());
    let response = send(
        &router,
        empty_request(Method::GET, "/api/openapi?url=http://127.0.0.1:1/spec.json"),
    )
    .await;
    assert_eq!(response.status, StatusCode::BAD_GATEWAY);
    assert_eq!(
        response.json()["error"],
        "Network error - unable to reach the provided URL"
    );
}

#[tokio::test]
async fn only_get_is_accepted() {
    let router = test_router(test_config());
    let response = send(&router, empty_request(Method::POST, "/api/openapi")).await;
    assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(
        response.json()["error"],
        "Only GET requests are allowed for OpenAPI/Swagger fetching"
    );
}

#[tokio::test]
async fn slow_hosts_time_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"openapi": "3.0.0"}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let mut config = test_config();
    config.spec_fetch_timeout = Duration::from_millis(200);
    let router = test_router(config);
    let response = send(&router, empty_request(Method::GET, &spec_uri(&server, "/slow.json"))).await;

    assert_eq!(response.status, StatusCode::REQUEST_TIMEOUT);
    let body = response.json();
    assert_eq!(
        body["error"],
        "Request timeout - the OpenAPI specification took too long to fetch"
    );
    assert_eq!(body["url"], format!("{}/slow.json", server.uri()));
}
