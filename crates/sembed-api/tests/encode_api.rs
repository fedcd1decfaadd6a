//! API contract tests for the encode and dimensions endpoints
//!
//! Driven against the real router with a stub encoder, so the wire contract
//! is exercised without loading model weights.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use axum::{body::Body, http::Request};
use sembed_api::{AppState, routes::create_router};
use sembed_embeddings::{SentenceEncoder, encoder::StubEncoder};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

fn app_with_dimensions(dimensions: usize) -> axum::Router {
    let encoder = Arc::new(StubEncoder::new(dimensions)) as Arc<dyn SentenceEncoder>;
    create_router(AppState::new(encoder))
}

fn failing_app() -> axum::Router {
    let encoder = Arc::new(StubEncoder::new(768).with_failure()) as Arc<dyn SentenceEncoder>;
    create_router(AppState::new(encoder))
}

fn encode_request(sentence: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/encode/")
        .header("content-type", "application/json")
        .body(Body::from(json!({ "sentence": sentence }).to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn dimensions_endpoint_reports_the_model_dimension() {
    let app = app_with_dimensions(768);

    let request = Request::builder()
        .method("GET")
        .uri("/dimensions/")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), 200);

    let body = body_json(response).await;
    assert_eq!(body, json!({ "dimensions": 768 }));
}

#[tokio::test]
async fn encode_returns_a_dimension_length_embedding() {
    let app = app_with_dimensions(384);

    let response = app.oneshot(encode_request("test sentence")).await.unwrap();
    assert_eq!(response.status(), 200);

    let body = body_json(response).await;
    let embedding = body["embedding"].as_array().unwrap();
    assert_eq!(embedding.len(), 384);
}

#[tokio::test]
async fn encode_agrees_with_dimensions_across_many_calls() {
    let app = app_with_dimensions(96);

    for sentence in ["one", "two", "three", "a much longer sentence than the others"] {
        let response = app
            .clone()
            .oneshot(encode_request(sentence))
            .await
            .unwrap();
        assert_eq!(response.status(), 200);

        let body = body_json(response).await;
        assert_eq!(body["embedding"].as_array().unwrap().len(), 96);
    }
}

#[tokio::test]
async fn empty_sentence_is_accepted() {
    let app = app_with_dimensions(768);

    let response = app.oneshot(encode_request("")).await.unwrap();
    assert_eq!(response.status(), 200);

    let body = body_json(response).await;
    assert_eq!(body["embedding"].as_array().unwrap().len(), 768);
}

#[tokio::test]
async fn concurrent_encodes_return_their_own_vectors() {
    let app = app_with_dimensions(8);
    let stub = StubEncoder::new(8);

    let (a, b) = tokio::join!(
        app.clone().oneshot(encode_request("alpha")),
        app.clone().oneshot(encode_request("beta")),
    );

    let body_a = body_json(a.unwrap()).await;
    let body_b = body_json(b.unwrap()).await;

    let vector = |body: &Value| -> Vec<f32> {
        body["embedding"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_f64().unwrap() as f32)
            .collect()
    };

    assert_eq!(vector(&body_a), stub.expected_vector("alpha"));
    assert_eq!(vector(&body_b), stub.expected_vector("beta"));
}

#[tokio::test]
async fn encoding_failure_is_a_request_level_error() {
    let app = failing_app();

    let response = app
        .clone()
        .oneshot(encode_request("anything"))
        .await
        .unwrap();
    assert_eq!(response.status(), 422);
    assert!(response.headers().contains_key("X-Correlation-ID"));

    let body = body_json(response).await;
    assert_eq!(body["error"], "ENCODING_FAILED");
    assert!(body["correlation_id"].is_string());

    // The dimensions endpoint is unaffected by encode failures
    let request = Request::builder()
        .method("GET")
        .uri("/dimensions/")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn malformed_request_body_is_rejected() {
    let app = app_with_dimensions(768);

    let request = Request::builder()
        .method("POST")
        .uri("/encode/")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"not_a_sentence": 42}"#))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn health_reports_the_served_model() {
    let app = app_with_dimensions(768);

    let request = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), 200);

    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["model"], "stub-encoder");
}
