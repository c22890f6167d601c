//! Provider-side failures surface as a plain 401.

use std::time::Duration;

use axum::http::StatusCode;
use serde_json::json;

use super::helpers::TestApp;
use crate::auth::ProviderKind;
use crate::config::keys;
use crate::testing::generic_profile_json;

#[tokio::test]
async fn test_unknown_token_is_unauthorized() {
    let app = TestApp::new().await;

    let (status, body) = app.get_as("/user/me", "revoked-token").await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    // The provider's own message is not passed on.
    assert_eq!(body, json!({ "statusCode": 401, "message": "Unauthorized" }));
    assert_eq!(app.stub.calls(), 1);
    assert_eq!(app.stored_users(), 0);
}

#[tokio::test]
async fn test_malformed_profile_is_unauthorized() {
    let app = TestApp::new().await;
    app.stub.grant("odd-token", json!({ "login": "no-id" }));

    let (status, _) = app.get_as("/user/me", "odd-token").await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.stored_users(), 0);
}

#[tokio::test]
async fn test_slow_provider_is_unauthorized() {
    let app = TestApp::with_env(ProviderKind::Generic, |snapshot| {
        snapshot.set(keys::PROVIDER_TIMEOUT_SECONDS, "1");
    })
    .await;
    app.stub.grant("slow-token", generic_profile_json(5, "slow"));
    app.stub.set_delay(Duration::from_secs(3));

    let (status, _) = app.get_as("/user/me", "slow-token").await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.stored_users(), 0);
}
