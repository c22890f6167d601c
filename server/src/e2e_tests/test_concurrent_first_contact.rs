//! Overlapping first requests for the same user create one record.

use std::time::Duration;

use axum::http::StatusCode;
use futures::future::join_all;

use super::helpers::TestApp;
use crate::testing::generic_profile_json;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_contact_creates_single_identity() {
    let app = TestApp::new().await;
    app.stub.grant("token-a", generic_profile_json(42, "racer"));
    app.stub.grant("token-b", generic_profile_json(42, "racer"));
    app.stub.set_delay(Duration::from_millis(100));

    let requests = (0..8).map(|i| {
        let token = if i % 2 == 0 { "token-a" } else { "token-b" };
        app.get_as("/user/me", token)
    });
    let responses = join_all(requests).await;

    let first_id = responses[0].1["id"].clone();
    for (status, body) in &responses {
        assert_eq!(*status, StatusCode::OK);
        assert_eq!(body["id"], first_id);
    }
    assert_eq!(app.stored_users(), 1);
    assert_eq!(app.stub.calls(), 8);
}
