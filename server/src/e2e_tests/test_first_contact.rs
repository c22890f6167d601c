//! A valid token creates the local identity once and reuses it afterwards.

use axum::http::StatusCode;

use super::helpers::TestApp;
use crate::testing::generic_profile_json;

#[tokio::test]
async fn test_first_contact_creates_identity() {
    let app = TestApp::new().await;
    app.stub.grant("token-a", generic_profile_json(583_231, "octocat"));

    let (status, body) = app.get_as("/user/me", "token-a").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["external_id"], "583231");
    // No display name at the provider: the username is used.
    assert_eq!(body["name"], "octocat");
    assert_eq!(body["email"], "octocat@example.org");
    assert_eq!(app.stored_users(), 1);
}

#[tokio::test]
async fn test_repeat_requests_reuse_identity() {
    let app = TestApp::new().await;
    app.stub.grant("token-a", generic_profile_json(583_231, "octocat"));
    app.stub.grant("token-b", generic_profile_json(583_231, "octocat"));

    let (_, first) = app.get_as("/user/me", "token-a").await;
    let (_, second) = app.get_as("/user/me", "token-a").await;
    let (status, other_token) = app.get_as("/user/me", "token-b").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["id"], second["id"]);
    assert_eq!(first["id"], other_token["id"]);
    assert_eq!(app.stored_users(), 1);
    // Every request is checked against the provider.
    assert_eq!(app.stub.calls(), 3);
}

#[tokio::test]
async fn test_distinct_users_get_distinct_identities() {
    let app = TestApp::new().await;
    app.stub.grant("token-a", generic_profile_json(1, "first"));
    app.stub.grant("token-b", generic_profile_json(2, "second"));

    let (_, a) = app.get_as("/user/me", "token-a").await;
    let (_, b) = app.get_as("/user/me", "token-b").await;

    assert_ne!(a["id"], b["id"]);
    assert_eq!(app.stored_users(), 2);
}
