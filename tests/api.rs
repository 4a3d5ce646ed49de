// HTTP boundary tests against the in-process router

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use llm_engine::api::{router, AppState};
use llm_engine::crypto::ApiKeyCodec;
use llm_engine::db::{CredentialStore, NewCredential};
use llm_engine::proxy::translator::ChatClient;

fn test_state() -> AppState {
    AppState {
        store: Arc::new(CredentialStore::open_in_memory().unwrap()),
        codec: ApiKeyCodec::new("test-secret"),
        chat: ChatClient::new(),
        provider_defaults: None,
    }
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn health_reports_healthy() {
    let app = router(test_state());
    let response = app
        .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "llm-engine");
}

#[tokio::test]
async fn root_lists_endpoints() {
    let app = router(test_state());
    let response = app
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["endpoints"]["health"], "GET /api/health");
}

#[tokio::test]
async fn empty_messages_is_rejected() {
    let app = router(test_state());
    let response = app
        .oneshot(post_json("/api/chat/completions", json!({ "messages": [] })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "invalid_request_error");
}

#[tokio::test]
async fn missing_credentials_is_rejected() {
    let app = router(test_state());
    let request = post_json(
        "/api/chat/completions",
        json!({ "messages": [{ "role": "user", "content": "hi" }] }),
    );
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "invalid_request_error");
    assert!(body["message"].as_str().unwrap().contains("endpoint"));
}

#[tokio::test]
async fn undecryptable_stored_credential_is_a_server_error() {
    let state = test_state();

    // Simulate a credential written under a different process secret.
    let other_codec = ApiKeyCodec::new("some-other-secret");
    state
        .store
        .insert(
            &other_codec,
            NewCredential {
                name: "prod".into(),
                provider_name: "openai".into(),
                model_name: "gpt-4o".into(),
                api_key: "sk-unreadable".into(),
                temperature: 0.7,
                max_tokens: 1000,
                is_default: true,
            },
        )
        .unwrap();

    let app = router(state);
    let request = post_json(
        "/api/chat/completions",
        json!({ "messages": [{ "role": "user", "content": "hi" }] }),
    );
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["error"], "decryption_error");
    // The plaintext secret must never leak into the error message.
    assert!(!body["message"].as_str().unwrap().contains("sk-unreadable"));
}
