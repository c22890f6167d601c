//! Requests without a usable bearer token never reach the provider.

use axum::http::StatusCode;
use serde_json::json;

use super::helpers::TestApp;

#[tokio::test]
async fn test_missing_header_is_rejected_without_provider_call() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/user/me", None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "statusCode": 401, "message": "Unauthorized" }));
    assert_eq!(app.stub.calls(), 0);
    assert_eq!(app.stored_users(), 0);
}

#[tokio::test]
async fn test_non_bearer_schemes_are_rejected() {
    let app = TestApp::new().await;

    for header in ["Basic dXNlcjpwYXNz", "Bearer", "Bearer    ", "token-without-scheme"] {
        let (status, _) = app.get("/user/me", Some(header)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "header {header:?}");
    }
    assert_eq!(app.stub.calls(), 0);
}

#[tokio::test]
async fn test_health_is_public() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(app.stub.calls(), 0);
}
