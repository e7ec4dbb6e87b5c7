use serde_json::json;
use std::time::Duration;
use study_flow::config::{ProviderKind, ProviderSettings};
use study_flow::generation::{GenerationClient, GenerationParams, ProviderSpec, TextGenerator};
use study_flow::network::HttpClient;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PARAMS: GenerationParams = GenerationParams {
    temperature: 0.8,
    max_output_tokens: 4096,
};

fn gemini_ok(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "candidates": [{"content": {"parts": [{"text": text}], "role": "model"}}]
    }))
}

fn models(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn client(spec: ProviderSpec) -> GenerationClient {
    GenerationClient::new(HttpClient::new(Duration::from_secs(5)).unwrap(), spec, "test-key", PARAMS)
}

#[tokio::test]
async fn test_falls_through_to_second_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/model-a:generateContent"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/model-b:generateContent"))
        .and(query_param("key", "test-key"))
        .and(body_partial_json(json!({"generationConfig": {"maxOutputTokens": 4096}})))
        .respond_with(gemini_ok("from B"))
        .expect(1)
        .mount(&server)
        .await;

    let spec = ProviderSpec::gemini(&server.uri(), &models(&["model-a", "model-b"])).unwrap();
    let generated = client(spec).generate("prompt").await.unwrap();

    assert_eq!(generated.text, "from B");
    assert_eq!(generated.endpoint, "model-b");
}

#[tokio::test]
async fn test_first_success_stops_the_walk() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/model-a:generateContent"))
        .respond_with(gemini_ok("from A"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/model-b:generateContent"))
        .respond_with(gemini_ok("from B"))
        .expect(0)
        .mount(&server)
        .await;

    let spec = ProviderSpec::gemini(&server.uri(), &models(&["model-a", "model-b"])).unwrap();
    assert_eq!(client(spec).generate("p").await.unwrap().endpoint, "model-a");
}

#[tokio::test]
async fn test_empty_text_counts_as_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/model-a:generateContent"))
        .respond_with(gemini_ok("   \n"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/model-b:generateContent"))
        .respond_with(gemini_ok("real text"))
        .expect(1)
        .mount(&server)
        .await;

    let spec = ProviderSpec::gemini(&server.uri(), &models(&["model-a", "model-b"])).unwrap();
    let generated = client(spec).generate("p").await.unwrap();
    assert_eq!(generated.endpoint, "model-b");
}

#[tokio::test]
async fn test_total_failure_returns_none() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/model-a:generateContent"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/model-b:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
        .expect(1)
        .mount(&server)
        .await;

    let spec = ProviderSpec::gemini(&server.uri(), &models(&["model-a", "model-b"])).unwrap();
    assert_eq!(client(spec).generate("p").await, None);
}

#[tokio::test]
async fn test_openai_compatible_provider_from_settings() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({"model": "proxy-model", "max_tokens": 4096})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "proxied"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let settings = ProviderSettings {
        kind: ProviderKind::OpenaiCompatible,
        model: "proxy-model".into(),
        fallback_models: vec![],
        base_url: Some(format!("{}/v1", server.uri())),
    };
    let spec = ProviderSpec::from_settings(&settings).unwrap();
    let generated = client(spec).generate("p").await.unwrap();
    assert_eq!(generated.text, "proxied");
    assert_eq!(generated.endpoint, "proxy-model");
}

#[tokio::test]
async fn test_slow_endpoint_times_out_and_falls_through() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/a:generateContent"))
        .respond_with(gemini_ok("too late").set_delay(Duration::from_secs(3)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/b:generateContent"))
        .respond_with(gemini_ok("fast"))
        .expect(1)
        .mount(&server)
        .await;

    let spec = ProviderSpec::gemini(&server.uri(), &models(&["a", "b"])).unwrap();
    let client = GenerationClient::new(
        HttpClient::new(Duration::from_millis(500)).unwrap(),
        spec,
        "test-key",
        PARAMS,
    );
    let generated = client.generate("p").await.unwrap();

    assert_eq!(generated.text, "fast");
    assert_eq!(generated.endpoint, "b");
}
