//! Integration tests for the web dashboard feature.

#![cfg(feature = "api")]

mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::NaiveDateTime;
use tower::util::ServiceExt;

use meter_analytics::api::{AppState, router};
use meter_analytics::dashboard::Session;

fn build_api_state(dir: &std::path::Path) -> Arc<AppState> {
    let config = common::config_in(dir, &["Istanbul", "Gaziantep", "Kayseri"]);
    let mut session = Session::open(config).unwrap();
    session
        .regenerate_at(Some(42), NaiveDateTime::default())
        .unwrap();
    AppState::new(session)
}

async fn get_json(state: Arc<AppState>, uri: &str) -> (StatusCode, serde_json::Value) {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let resp = router(state).oneshot(req).await.unwrap();
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap_or_default())
}

#[tokio::test]
async fn state_reflects_query_filters() {
    let dir = tempfile::tempdir().unwrap();
    let state = build_api_state(dir.path());

    let (status, json) = get_json(
        state,
        "/api/state?city=Gaziantep&city=Kayseri&from=2024-01-02&to=2024-01-03",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let panels = json["view"]["panels"].as_array().unwrap();
    assert_eq!(panels.len(), 2);
    assert_eq!(panels[0]["points"].as_array().unwrap().len(), 48);
    assert_eq!(panels[0]["forecast"]["status"], "hidden");
    assert_eq!(json["view"]["map"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn forecast_endpoint_returns_requested_horizon() {
    let dir = tempfile::tempdir().unwrap();
    let state = build_api_state(dir.path());

    let (status, json) = get_json(state, "/api/forecast?city=Istanbul&horizon=72").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["model"], "additive");
    assert_eq!(json["points"].as_array().unwrap().len(), 72);
}

#[tokio::test]
async fn unknown_city_forecast_is_404() {
    let dir = tempfile::tempdir().unwrap();
    let state = build_api_state(dir.path());

    let (status, json) = get_json(state, "/api/forecast?city=Atlantis").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].as_str().unwrap().contains("Atlantis"));
}

#[tokio::test]
async fn bad_query_is_400() {
    let dir = tempfile::tempdir().unwrap();
    let state = build_api_state(dir.path());

    let (status, json) = get_json(state, "/api/state?from=yesterday").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json.get("error").is_some());
}

#[tokio::test]
async fn regenerate_then_page_shows_new_seed() {
    let dir = tempfile::tempdir().unwrap();
    let state = build_api_state(dir.path());

    let req = Request::builder()
        .method("POST")
        .uri("/api/regenerate?seed=1234")
        .body(Body::empty())
        .unwrap();
    let resp = router(state.clone()).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let req = Request::builder().uri("/").body(Body::empty()).unwrap();
    let resp = router(state).oneshot(req).await.unwrap();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let html = String::from_utf8(body.to_vec()).unwrap();
    assert!(html.contains(r#"name="seed" min="0" value="1234""#));
}
