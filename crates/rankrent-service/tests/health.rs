//! Health endpoint tests.

mod common;

use common::TestHarness;

#[tokio::test]
async fn health_check_returns_ok() {
    let harness = TestHarness::new().await;

    let response = harness.server.get("/health").await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "rankrent");
}

#[tokio::test]
async fn health_check_needs_no_auth() {
    let harness = TestHarness::new().await;

    harness.server.get("/health").await.assert_status_ok();
    harness
        .server
        .get("/v1/credits/balance")
        .await
        .assert_status_unauthorized();
}
