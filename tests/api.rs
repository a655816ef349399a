//! API endpoint integration tests

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use tokio::sync::watch;
use tower::ServiceExt;

use lingo_pal::api::{ApiServer, ApiState};
use lingo_pal::{FeedbackView, Mood, Phase, PhoneticDictionary};

/// Build a test API router around a feedback channel
fn build_test_router(view: FeedbackView) -> (axum::Router, watch::Sender<FeedbackView>) {
    let (tx, rx) = watch::channel(view);
    let server = ApiServer::new(
        ApiState {
            feedback: rx,
            dictionary: Arc::new(PhoneticDictionary::builtin().clone()),
        },
        0,
    );
    (server.router(), tx)
}

async fn get_json(router: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = router
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_health_endpoint() {
    let (router, _tx) = build_test_router(FeedbackView::default());
    let (status, json) = get_json(router, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_session_reflects_latest_view() {
    let (router, tx) = build_test_router(FeedbackView::default());
    tx.send_replace(FeedbackView {
        phase: Phase::Speaking,
        mood: Mood::Celebrating,
        is_thinking: true,
        feedback_text: "You did it!".to_string(),
        history_len: 2,
        ..FeedbackView::default()
    });

    let (status, json) = get_json(router, "/api/session").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["mood"], "CELEBRATING");
    assert_eq!(json["phase"], "SPEAKING");
    assert_eq!(json["is_thinking"], true);
    assert_eq!(json["feedback_text"], "You did it!");
    assert_eq!(json["history_len"], 2);
}

#[tokio::test]
async fn test_word_lookup() {
    let (router, _tx) = build_test_router(FeedbackView::default());
    let (status, json) = get_json(router, "/api/words/Frogs").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["word"], "frog");
    assert_eq!(json["category"], "ANIMALS");
}

#[tokio::test]
async fn test_unknown_word_is_404() {
    let (router, _tx) = build_test_router(FeedbackView::default());
    let (status, json) = get_json(router, "/api/words/xylophone").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].as_str().unwrap().contains("xylophone"));
}

#[tokio::test]
async fn test_word_listing_filters() {
    let (router, _tx) = build_test_router(FeedbackView::default());
    let (status, json) = get_json(router.clone(), "/api/words?category=colors").await;
    assert_eq!(status, StatusCode::OK);
    let words: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|w| w["word"].as_str().unwrap())
        .collect();
    assert_eq!(words, ["black", "blue", "green", "red"]);

    let (status, _) = get_json(router, "/api/words?difficulty=9").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
