//! Integration tests for the webhook API.

mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use common::*;
use tower::ServiceExt;
use volume_bot::api::{create_router, AppState};

fn test_app() -> axum::Router {
    let bot = test_bot(StubAnswer::Missing);
    create_router(AppState::new(bot.controller, bot.verifier, bot.sessions))
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let response = test_app()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["sessions"], 0);
    assert_eq!(json["chains"][0]["chain"], "base");
    assert_eq!(json["chains"][1]["chain"], "solana");
    assert_eq!(json["chains"][1]["healthy"], true);
}

#[tokio::test]
async fn test_update_endpoint_returns_reply() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/updates")
                .header("content-type", "application/json")
                .body(Body::from(
                    r#"{"conversation_id": "42", "type": "message", "text": "/start"}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert!(json["text"].as_str().unwrap().contains("Select your blockchain"));
    assert_eq!(json["buttons"][0][0]["callback_data"], "blockchain_base");
}

#[tokio::test]
async fn test_update_endpoint_rejects_bad_body() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/updates")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"conversation_id": "42", "type": "sticker"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_unknown_route() {
    let response = test_app()
        .oneshot(Request::builder().uri("/v1/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
