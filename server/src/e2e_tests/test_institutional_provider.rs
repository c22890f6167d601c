//! Deployments backed by the institutional SSO.

use axum::http::StatusCode;

use super::helpers::TestApp;
use crate::auth::ProviderKind;
use crate::testing::institutional_profile_json;

#[tokio::test]
async fn test_institutional_profile_maps_to_identity() {
    let app = TestApp::with(ProviderKind::Institutional, false).await;
    app.stub.grant("sso-token", institutional_profile_json(764_212, "Ada Lovelace"));

    let (status, body) = app.get_as("/user/me", "sso-token").await;

    assert_eq!(status, StatusCode::OK);
    // The person id, not the account id, identifies the user.
    assert_eq!(body["external_id"], "764212");
    assert_eq!(body["name"], "Ada Lovelace");
    assert_eq!(body["email"], "ada.lovelace@example.org");
}

#[tokio::test]
async fn test_generic_profile_rejected_by_institutional_deployment() {
    let app = TestApp::with(ProviderKind::Institutional, false).await;
    app.stub.grant("gh-token", crate::testing::generic_profile_json(7, "octocat"));

    let (status, _) = app.get_as("/user/me", "gh-token").await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.stored_users(), 0);
}
