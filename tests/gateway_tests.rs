//! # Gateway Tests
//!
//! Drives the router with `oneshot` requests against wiremock stand-ins for
//! the Anthropic and Groq streaming APIs.

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use stream_relay::{create_router, AppState, Config};
use tower::ServiceExt;
use wiremock::{
    matchers::{body_partial_json, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

const ANTHROPIC_STREAM: &str = concat!(
    "event: message_start\n",
    "data: {\"type\":\"message_start\",\"message\":{\"id\":\"msg_1\",\"role\":\"assistant\",\"content\":[]}}\n\n",
    "event: content_block_start\n",
    "data: {\"type\":\"content_block_start\",\"index\":0,\"content_block\":{\"type\":\"text\",\"text\":\"\"}}\n\n",
    "event: ping\n",
    "data: {\"type\":\"ping\"}\n\n",
    "event: content_block_delta\n",
    "data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"He\"}}\n\n",
    "event: content_block_delta\n",
    "data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"llo\"}}\n\n",
    "event: content_block_stop\n",
    "data: {\"type\":\"content_block_stop\",\"index\":0}\n\n",
    "event: message_delta\n",
    "data: {\"type\":\"message_delta\",\"delta\":{\"stop_reason\":\"end_turn\"},\"usage\":{\"output_tokens\":2}}\n\n",
    "event: message_stop\n",
    "data: {\"type\":\"message_stop\"}\n\n",
);

const GROQ_STREAM: &str = concat!(
    "data: {\"id\":\"c1\",\"choices\":[{\"index\":0,\"delta\":{\"role\":\"assistant\",\"content\":\"\"}}]}\n\n",
    "data: {\"id\":\"c1\",\"choices\":[{\"index\":0,\"delta\":{\"content\":\"Hi\"}}]}\n\n",
    "data: {\"id\":\"c1\",\"choices\":[{\"index\":0,\"delta\":{\"content\":\" there\"}}]}\n\n",
    "data: {\"id\":\"c1\",\"choices\":[{\"index\":0,\"delta\":{},\"finish_reason\":\"stop\"}]}\n\n",
    "data: [DONE]\n\n",
);

/// Router whose providers both point at `upstream`, with both keys set.
fn create_test_app(upstream: &MockServer) -> Router {
    let mut config = Config::for_test();
    config.anthropic_base_url = upstream.uri();
    config.groq_base_url = format!("{}/openai/v1", upstream.uri());
    config.anthropic_api_key = Some("sk-ant-test".to_string());
    config.groq_api_key = Some("gsk-test".to_string());

    create_router(AppState::new(config).unwrap())
}

fn generate_request(body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/generate")
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn error_message(response: axum::response::Response) -> String {
    let json: Value = serde_json::from_str(&body_text(response).await).unwrap();
    json["error"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_anthropic_stream_is_relayed() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "sk-ant-test"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(json!({
            "model": "claude-3-haiku-20240307",
            "stream": true,
            "messages": [{"role": "user", "content": "Say hello"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_raw(ANTHROPIC_STREAM, "text/event-stream"))
        .expect(1)
        .mount(&upstream)
        .await;

    let app = create_test_app(&upstream);
    let response = app
        .oneshot(generate_request(json!({
            "prompt": "Say hello",
            "provider": "anthropic",
            "model": "claude-3-haiku-20240307"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("content-type").unwrap(), "text/event-stream");
    assert_eq!(response.headers().get("cache-control").unwrap(), "no-cache");
    assert!(response.headers().get("x-request-id").is_some());

    assert_eq!(
        body_text(response).await,
        "data: {\"text\":\"He\"}\n\ndata: {\"text\":\"llo\"}\n\ndata: [DONE]\n\n"
    );
}

#[tokio::test]
async fn test_groq_stream_is_relayed() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/openai/v1/chat/completions"))
        .and(header("authorization", "Bearer gsk-test"))
        .and(body_partial_json(json!({"model": "llama-3.1-8b-instant", "stream": true})))
        .respond_with(ResponseTemplate::new(200).set_body_raw(GROQ_STREAM, "text/event-stream"))
        .expect(1)
        .mount(&upstream)
        .await;

    let app = create_test_app(&upstream);
    let response = app
        .oneshot(generate_request(json!({
            "prompt": "Greet me",
            "provider": "groq",
            "model": "llama-3.1-8b-instant"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_text(response).await,
        "data: {\"text\":\"Hi\"}\n\ndata: {\"text\":\" there\"}\n\ndata: [DONE]\n\n"
    );
}

#[tokio::test]
async fn test_empty_prompt_is_rejected() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&upstream)
        .await;

    let app = create_test_app(&upstream);
    let response = app
        .oneshot(generate_request(json!({
            "prompt": "   ",
            "provider": "groq",
            "model": "llama-3.1-8b-instant"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_message(response).await, "'prompt' must not be empty");
}

#[tokio::test]
async fn test_missing_field_is_rejected() {
    let upstream = MockServer::start().await;
    let app = create_test_app(&upstream);

    let response = app
        .oneshot(generate_request(json!({"prompt": "hi", "provider": "groq"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_message(response).await, "Missing required field 'model'");
}

#[tokio::test]
async fn test_unknown_provider_is_rejected() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&upstream)
        .await;

    let app = create_test_app(&upstream);
    let response = app
        .oneshot(generate_request(json!({
            "prompt": "hi",
            "provider": "openai",
            "model": "gpt-4o"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_message(response).await, "Unsupported provider: openai");
}

#[tokio::test]
async fn test_invalid_json_is_rejected() {
    let upstream = MockServer::start().await;
    let app = create_test_app(&upstream);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/generate")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(error_message(response).await.starts_with("Invalid request body"));
}

#[tokio::test]
async fn test_missing_credential_is_server_error() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&upstream)
        .await;

    let mut config = Config::for_test();
    config.anthropic_base_url = upstream.uri();
    let app = create_router(AppState::new(config).unwrap());

    let response = app
        .oneshot(generate_request(json!({
            "prompt": "hi",
            "provider": "anthropic",
            "model": "claude-3-haiku-20240307"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error_message(response).await, "ANTHROPIC_API_KEY is not configured");
}

#[tokio::test]
async fn test_upstream_rejection_is_bad_gateway() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "type": "error",
            "error": {"type": "authentication_error", "message": "invalid x-api-key"}
        })))
        .mount(&upstream)
        .await;

    let app = create_test_app(&upstream);
    let response = app
        .oneshot(generate_request(json!({
            "prompt": "hi",
            "provider": "anthropic",
            "model": "claude-3-haiku-20240307"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(error_message(response).await, "HTTP 401: invalid x-api-key");
}

#[tokio::test]
async fn test_failure_after_delta_is_reported_in_stream() {
    let upstream = MockServer::start().await;
    let stream = concat!(
        "data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"d1\"}}\n\n",
        "data: {\"type\":\"error\",\"error\":{\"type\":\"overloaded_error\",\"message\":\"Overloaded\"}}\n\n",
        "data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"d2\"}}\n\n",
    );
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(stream, "text/event-stream"))
        .mount(&upstream)
        .await;

    let app = create_test_app(&upstream);
    let response = app
        .oneshot(generate_request(json!({
            "prompt": "hi",
            "provider": "anthropic",
            "model": "claude-3-haiku-20240307"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_text(response).await,
        "data: {\"text\":\"d1\"}\n\ndata: {\"error\":\"Overloaded\"}\n\n"
    );
}

#[tokio::test]
async fn test_nothing_forwarded_after_terminal() {
    let upstream = MockServer::start().await;
    let stream = concat!(
        "data: {\"choices\":[{\"delta\":{\"content\":\"a\"}}]}\n\n",
        "data: [DONE]\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"late\"}}]}\n\n",
    );
    Mock::given(method("POST"))
        .and(path("/openai/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(stream, "text/event-stream"))
        .mount(&upstream)
        .await;

    let app = create_test_app(&upstream);
    let response = app
        .oneshot(generate_request(json!({
            "prompt": "hi",
            "provider": "groq",
            "model": "llama-3.1-8b-instant"
        })))
        .await
        .unwrap();

    assert_eq!(body_text(response).await, "data: {\"text\":\"a\"}\n\ndata: [DONE]\n\n");
}

#[tokio::test]
async fn test_upstream_close_without_terminal_completes() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/openai/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            "data: {\"choices\":[{\"delta\":{\"content\":\"partial\"}}]}\n\n",
            "text/event-stream",
        ))
        .mount(&upstream)
        .await;

    let app = create_test_app(&upstream);
    let response = app
        .oneshot(generate_request(json!({
            "prompt": "hi",
            "provider": "groq",
            "model": "llama-3.1-8b-instant"
        })))
        .await
        .unwrap();

    assert_eq!(
        body_text(response).await,
        "data: {\"text\":\"partial\"}\n\ndata: [DONE]\n\n"
    );
}

#[tokio::test]
async fn test_unreachable_provider_is_bad_gateway() {
    let mut config = Config::for_test();
    config.groq_base_url = "http://127.0.0.1:1".to_string();
    config.groq_api_key = Some("gsk-test".to_string());
    let app = create_router(AppState::new(config).unwrap());

    let response = app
        .oneshot(generate_request(json!({
            "prompt": "hi",
            "provider": "groq",
            "model": "llama-3.1-8b-instant"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_health_reports_configured_providers() {
    let mut config = Config::for_test();
    config.groq_api_key = Some("gsk-test".to_string());
    let app = create_router(AppState::new(config).unwrap());

    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json["service"], "stream-relay");
    assert_eq!(json["providers"], json!({"anthropic": false, "groq": true}));
    assert!(!json.to_string().contains("gsk-test"));
}
