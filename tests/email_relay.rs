mod common;
use common::{empty_request, json_request, received_json, send, test_config, test_router};

use axum::http::{Method, StatusCode};
use formgen_gateway::config::Config;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn mail_config(server: &MockServer) -> Config {
    let mut config = test_config();
    config.mailrelay.api_key = Some("mr-key".to_string());
    config.mailrelay.domain = Some(server.uri());
    config
}

fn submission() -> serde_json::Value {
    json!({
        "to": "test@example.com",
        "subject": "Test Form",
        "formData": {"name": "John <Doe>", "email": "john@example.com"}
    })
}

#[tokio::test]
async fn relays_submission_to_mailrelay() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/send"))
        .and(header("authorization", "Bearer mr-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"messageId": "test-message-id"})))
        .expect(1)
        .mount(&server)
        .await;

    let router = test_router(mail_config(&server));
    let response = send(&router, json_request(Method::POST, "/email/form-data", &submission())).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.json(),
        json!({"success": true, "message": "Email sent successfully", "messageId": "test-message-id"})
    );

    let sent = received_json(&server, "/api/v1/send").await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0]["to"], "test@example.com");
    assert_eq!(sent[0]["subject"], "Test Form");
    assert_eq!(sent[0]["from"], "noreply@yourdomain.com");
    let text = sent[0]["text"].as_str().unwrap();
    assert!(text.contains("name: \"John <Doe>\""));
    assert!(text.ends_with("Sent via Form Generator Worker"));
    let html = sent[0]["html"].as_str().unwrap();
    assert!(html.contains("&lt;Doe&gt;"));
    assert!(html.contains("<br>"));
}

#[tokio::test]
async fn missing_message_id_reads_unknown() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/send"))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({"status": "queued"})))
        .mount(&server)
        .await;

    let router = test_router(mail_config(&server));
    let response = send(&router, json_request(Method::POST, "/email/form-data", &submission())).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["messageId"], "unknown");
}

#[tokio::test]
async fn invalid_address_is_rejected_before_configuration() {
    let router = test_router(test_config());
    let mut body = submission();
    body["to"] = json!("invalid-email");

    let response = send(&router, json_request(Method::POST, "/email/form-data", &body)).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["error"], "Invalid email format");
}

#[tokio::test]
async fn missing_fields_and_configuration() {
    let router = test_router(test_config());

    let missing = send(
        &router,
        json_request(Method::POST, "/email/form-data", &json!({"to": "test@example.com"})),
    )
    .await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert_eq!(missing.json()["error"], "Missing required fields: to and formData");

    let unconfigured = send(&router, json_request(Method::POST, "/email/form-data", &submission())).await;
    assert_eq!(unconfigured.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(unconfigured.json()["error"], "Email service not configured");
}

#[tokio::test]
async fn mailrelay_errors_become_500() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/send"))
        .respond_with(ResponseTemplate::new(422).set_body_string("bad sender"))
        .mount(&server)
        .await;

    let router = test_router(mail_config(&server));
    let response = send(&router, json_request(Method::POST, "/email/form-data", &submission())).await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    let body = response.json();
    assert_eq!(body["error"], "Mailrelay API error: 422");
    assert_eq!(body["message"], "Failed to send email");
}

#[tokio::test]
async fn unreachable_mailrelay_is_bad_gateway() {
    let mut config = test_config();
    config.mailrelay.api_key = Some("mr-key".to_string());
    config.mailrelay.domain = Some("http://127.0.0.1:1".to_string());

    let router = test_router(config);
    let response = send(&router, json_request(Method::POST, "/email/form-data", &submission())).await;
    assert_eq!(response.status, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn only_post_is_accepted() {
    let router = test_router(test_config());
    let response = send(&router, empty_request(Method::GET, "/email/form-data")).await;
    assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.json()["success"], false);
}
