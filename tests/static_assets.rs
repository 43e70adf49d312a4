//! Serving the web frontend from a configured directory.

mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use common::{create_test_state, test_config};
use http_body_util::BodyExt;
use std::sync::Arc;
use tempfile::TempDir;
use tmux_bridge::api::router;
use tmux_bridge::fake::FakeDriver;
use tower::ServiceExt;

const INDEX: &str = "<!doctype html><title>Claude Terminal</title>";

fn frontend_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("index.html"), INDEX).unwrap();
    std::fs::write(dir.path().join("manifest.json"), r#"{"name":"Claude Terminal"}"#).unwrap();
    std::fs::create_dir(dir.path().join("js")).unwrap();
    std::fs::write(dir.path().join("js").join("app.js"), "console.log('up');").unwrap();
    dir
}

fn app_for(dir: &TempDir) -> axum::Router {
    let mut config = test_config();
    config.static_dir = Some(dir.path().to_path_buf());
    router(create_test_state(Arc::new(FakeDriver::new()), config))
}

async fn get(app: axum::Router, uri: &str) -> (StatusCode, String) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8_lossy(&bytes).into_owned())
}

#[tokio::test]
async fn root_and_terminal_serve_index() {
    let dir = frontend_dir();

    let (status, body) = get(app_for(&dir), "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, INDEX);

    let (status, body) = get(app_for(&dir), "/terminal").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, INDEX);
}

#[tokio::test]
async fn assets_are_served_from_the_directory() {
    let dir = frontend_dir();

    let (status, body) = get(app_for(&dir), "/manifest.json").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Claude Terminal"));

    let (status, body) = get(app_for(&dir), "/js/app.js").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("console.log"));
}

#[tokio::test]
async fn missing_asset_is_404() {
    let dir = frontend_dir();
    let (status, _) = get(app_for(&dir), "/css/missing.css").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_api_path_is_json_404() {
    let dir = frontend_dir();
    let (status, body) = get(app_for(&dir), "/api/terminal/claude/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json, serde_json::json!({ "error": "Not found" }));
}

#[tokio::test]
async fn api_routes_still_win_over_assets() {
    let dir = frontend_dir();
    let (status, body) = get(app_for(&dir), "/api/terminal/claude/status").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"session_exists\":false"));
}
