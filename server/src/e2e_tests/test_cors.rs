//! Browser clients on other origins.

use axum::body::Body;
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_REQUEST_HEADERS, ACCESS_CONTROL_REQUEST_METHOD,
    ORIGIN,
};
use axum::http::{HeaderValue, Method, Request, StatusCode};

use super::helpers::TestApp;
use crate::auth::ProviderKind;
use crate::config::keys;
use crate::testing::generic_profile_json;

#[tokio::test]
async fn test_preflight_answered_without_provider_call() {
    let app = TestApp::new().await;

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/user/me")
        .header(ORIGIN, "https://logbook.example.org")
        .header(ACCESS_CONTROL_REQUEST_METHOD, "GET")
        .header(ACCESS_CONTROL_REQUEST_HEADERS, "authorization")
        .body(Body::empty())
        .expect("request");
    let response = app.send(request).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).map(HeaderValue::as_bytes),
        Some(&b"*"[..])
    );
    assert_eq!(app.stub.calls(), 0);
}

#[tokio::test]
async fn test_cross_origin_responses_carry_allow_origin() {
    let app = TestApp::new().await;
    app.stub.grant("token-a", generic_profile_json(3, "browser"));

    let request = Request::builder()
        .method(Method::GET)
        .uri("/user/me")
        .header(ORIGIN, "https://logbook.example.org")
        .header("authorization", "Bearer token-a")
        .body(Body::empty())
        .expect("request");
    let response = app.send(request).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key(ACCESS_CONTROL_ALLOW_ORIGIN));
}

#[tokio::test]
async fn test_rejections_are_readable_cross_origin() {
    let app = TestApp::new().await;

    let request = Request::builder()
        .method(Method::GET)
        .uri("/user/me")
        .header(ORIGIN, "https://logbook.example.org")
        .body(Body::empty())
        .expect("request");
    let response = app.send(request).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().contains_key(ACCESS_CONTROL_ALLOW_ORIGIN));
}

#[tokio::test]
async fn test_request_logging_keeps_routes_working() {
    let app = TestApp::with_env(ProviderKind::Generic, |snapshot| {
        snapshot.set(keys::USE_INFO_LOGGER, "true");
    })
    .await;
    app.stub.grant("token-a", generic_profile_json(4, "logged"));

    assert!(app.config.use_info_logger);
    assert_eq!(app.get("/health", None).await.0, StatusCode::OK);
    assert_eq!(app.get_as("/user/me", "token-a").await.0, StatusCode::OK);
    assert_eq!(app.get("/user/me", None).await.0, StatusCode::UNAUTHORIZED);
}
