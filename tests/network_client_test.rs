use serde_json::{json, Value};
use std::time::Duration;
use study_flow::network::{HttpClient, NetworkError};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_client_initialization() {
    let client = HttpClient::new(Duration::from_secs(5));
    assert!(client.is_ok());
}

#[tokio::test]
async fn test_post_json_sends_body_and_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer secret"))
        .and(body_json(json!({"q": 1})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new(Duration::from_secs(5)).unwrap();
    let resp: Value = client
        .post_json(&format!("{}/chat/completions", server.uri()), Some("secret"), &json!({"q": 1}))
        .await
        .unwrap();
    assert_eq!(resp["ok"], true);
}

#[tokio::test]
async fn test_non_success_status_carries_body_preview() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_string("quota exceeded"))
        .mount(&server)
        .await;

    let client = HttpClient::new(Duration::from_secs(5)).unwrap();
    let err = client
        .post_json::<_, Value>(&server.uri(), None, &json!({}))
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), Some(429));
    assert!(matches!(err, NetworkError::Status { ref body, .. } if body == "quota exceeded"));
}

#[tokio::test]
async fn test_slow_server_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let client = HttpClient::new(Duration::from_millis(200)).unwrap();
    let err = client
        .post_json::<_, Value>(&server.uri(), None, &json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, NetworkError::Timeout(_)));
}
