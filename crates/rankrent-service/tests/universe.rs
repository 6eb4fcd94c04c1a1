//! City and niche universe integration tests.

mod common;

use axum::http::StatusCode;
use common::{TestHarness, ADMIN_KEY};
use serde_json::json;

// ============================================================================
// Listing
// ============================================================================

#[tokio::test]
async fn cities_are_listed_largest_first() {
    let harness = TestHarness::new().await;

    let response = harness
        .server
        .get("/v1/cities")
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let names: Vec<_> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["Austin", "Boise"]);
}

#[tokio::test]
async fn cities_filter_by_population() {
    let harness = TestHarness::new().await;

    let response = harness
        .server
        .get("/v1/cities?max_population=500000")
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["name"], "Boise");
}

#[tokio::test]
async fn inverted_population_filter_is_rejected() {
    let harness = TestHarness::new().await;

    harness
        .server
        .get("/v1/cities?min_population=10&max_population=5")
        .add_header("authorization", harness.user_auth_header())
        .await
        .assert_status_bad_request();
}

#[tokio::test]
async fn niches_are_listed_by_name() {
    let harness = TestHarness::new().await;

    let response = harness
        .server
        .get("/v1/niches")
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body[0]["name"], "Electrician");
    assert_eq!(body[2]["name"], "Roofing");
}

#[tokio::test]
async fn listing_requires_auth() {
    let harness = TestHarness::new().await;

    harness.server.get("/v1/niches").await.assert_status_unauthorized();
}

// ============================================================================
// Admin replacement
// ============================================================================

#[tokio::test]
async fn admin_replaces_cities() {
    let harness = TestHarness::new().await;

    let response = harness
        .server
        .put("/v1/admin/cities")
        .add_header("x-admin-key", ADMIN_KEY)
        .json(&json!([
            { "name": "  Salt   Lake City ", "state": "ut", "population": 200_000 },
            { "name": "Denver", "state": "CO", "population": 715_000 },
        ]))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["imported"], 2);

    let cities: serde_json::Value = harness
        .server
        .get("/v1/cities")
        .add_header("authorization", harness.user_auth_header())
        .await
        .json();
    assert_eq!(cities[0]["name"], "Denver");
    assert_eq!(cities[1]["name"], "Salt Lake City");
    assert_eq!(cities[1]["state"], "UT");
}

#[tokio::test]
async fn invalid_city_rejects_whole_import() {
    let harness = TestHarness::new().await;

    harness
        .server
        .put("/v1/admin/cities")
        .add_header("x-admin-key", ADMIN_KEY)
        .json(&json!([
            { "name": "Denver", "state": "CO", "population": 715_000 },
            { "name": "Nowhere", "state": "Texas", "population": 10 },
        ]))
        .await
        .assert_status_bad_request();

    let cities: serde_json::Value = harness
        .server
        .get("/v1/cities")
        .add_header("authorization", harness.user_auth_header())
        .await
        .json();
    assert_eq!(cities.as_array().unwrap().len(), 2);
    assert_eq!(cities[0]["name"], "Austin");
}

#[tokio::test]
async fn admin_replaces_niches() {
    let harness = TestHarness::new().await;

    harness
        .server
        .put("/v1/admin/niches")
        .add_header("x-admin-key", ADMIN_KEY)
        .json(&json!([{ "name": "HVAC" }]))
        .await
        .assert_status_ok();

    let niches: serde_json::Value = harness
        .server
        .get("/v1/niches")
        .add_header("authorization", harness.user_auth_header())
        .await
        .json();
    assert_eq!(niches.as_array().unwrap().len(), 1);
    assert_eq!(niches[0]["name"], "HVAC");
}

#[tokio::test]
async fn admin_routes_require_admin_key() {
    let harness = TestHarness::new().await;

    harness
        .server
        .put("/v1/admin/niches")
        .json(&json!([{ "name": "HVAC" }]))
        .await
        .assert_status_unauthorized();

    harness
        .server
        .put("/v1/admin/niches")
        .add_header("x-admin-key", "wrong-key")
        .json(&json!([{ "name": "HVAC" }]))
        .await
        .assert_status(StatusCode::FORBIDDEN);
}
