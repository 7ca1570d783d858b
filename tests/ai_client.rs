use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use zapiszto::sync::anthropic::AiClient;

fn setup(server: &MockServer) -> AiClient {
    AiClient::new(Some("sk-test".into()), "", Duration::from_secs(5))
        .unwrap()
        .with_base_url(&server.uri())
}

#[tokio::test]
async fn expansion_uses_first_text_block() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "sk-test"))
        .and(header("anthropic-version", "2023-06-01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "msg_1",
            "type": "message",
            "role": "assistant",
            "content": [{ "type": "text", "text": "  Plant seedlings in May.  " }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let out = setup(&server).expand_note("Garden", "grow tomatoes").await;
    assert!(!out.is_fallback());
    assert_eq!(out.content, "Plant seedlings in May.");
}

#[tokio::test]
async fn api_error_falls_back() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid x-api-key"))
        .mount(&server)
        .await;

    let out = setup(&server).expand_note("Garden", "grow tomatoes").await;
    assert!(out.is_fallback());
    assert!(out.content.contains("Garden"));
    assert!(out.warning.unwrap().contains("401"));
}

#[tokio::test]
async fn empty_content_falls_back() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "content": [] })))
        .mount(&server)
        .await;

    let out = setup(&server).expand_note("Garden", "").await;
    assert_eq!(out.warning.as_deref(), Some("no text in API response"));
}
