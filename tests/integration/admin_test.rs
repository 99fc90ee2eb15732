//! Integration tests for admin endpoints and health checks.

use axum::http::StatusCode;
use serde_json::json;

use crate::helpers::{ADMIN_TOKEN, TestApp};

#[tokio::test]
async fn test_admin_requires_token() {
    let app = TestApp::new();

    let missing = app.request("GET", "/api/admin/licenses", None, None).await;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);

    let wrong = app
        .request("GET", "/api/admin/licenses", None, Some("not-the-token"))
        .await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_disabled_without_configured_token() {
    let mut config = TestApp::config();
    config.admin.api_token = String::new();
    let app = TestApp::with_config(config);

    let response = app
        .request("GET", "/api/admin/licenses", None, Some("anything"))
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_grant_get_and_list() {
    let app = TestApp::new();

    let grant = app
        .request(
            "POST",
            "/api/admin/licenses",
            Some(json!({ "email": "Partner@Example.com", "hours": 2 })),
            Some(ADMIN_TOKEN),
        )
        .await;
    assert_eq!(grant.status, StatusCode::OK);
    assert_eq!(grant.data()["kind"], "admin_grant");
    assert_eq!(grant.data()["email"], "partner@example.com");
    assert_eq!(grant.data()["allotted_seconds"], 7200);
    assert!(grant.data()["order_id"].as_str().unwrap().starts_with("ADMIN_"));
    let key = grant.data()["key"].as_str().unwrap().to_string();

    let fetched = app
        .request("GET", &format!("/api/admin/licenses/{key}"), None, Some(ADMIN_TOKEN))
        .await;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.data()["key"], key.as_str());

    app.issue_purchase("buyer@example.com", 3600, "cs_admin_list").await;
    let list = app
        .request("GET", "/api/admin/licenses?page=1&per_page=10", None, Some(ADMIN_TOKEN))
        .await;
    assert_eq!(list.status, StatusCode::OK);
    assert_eq!(list.data()["total_items"], 2);
    assert_eq!(list.data()["items"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_grant_with_exact_seconds() {
    let app = TestApp::new();

    let grant = app
        .request(
            "POST",
            "/api/admin/licenses",
            Some(json!({ "email": "qa@example.com", "duration_seconds": 90 })),
            Some(ADMIN_TOKEN),
        )
        .await;

    assert_eq!(grant.status, StatusCode::OK);
    assert_eq!(grant.data()["allotted_seconds"], 90);
    assert_eq!(grant.data()["remaining_seconds"], 90);
}

#[tokio::test]
async fn test_grant_validation() {
    let app = TestApp::new();

    let both = app
        .request(
            "POST",
            "/api/admin/licenses",
            Some(json!({ "email": "qa@example.com", "hours": 1, "duration_seconds": 90 })),
            Some(ADMIN_TOKEN),
        )
        .await;
    assert_eq!(both.status, StatusCode::BAD_REQUEST);

    let neither = app
        .request(
            "POST",
            "/api/admin/licenses",
            Some(json!({ "email": "qa@example.com" })),
            Some(ADMIN_TOKEN),
        )
        .await;
    assert_eq!(neither.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_grant_length_upper_bound() {
    let app = TestApp::new();

    for seconds in [31_536_001_i64, 10_000_000_000_000, i64::MAX] {
        let grant = app
            .request(
                "POST",
                "/api/admin/licenses",
                Some(json!({ "email": "qa@example.com", "duration_seconds": seconds })),
                Some(ADMIN_TOKEN),
            )
            .await;
        assert_eq!(grant.status, StatusCode::BAD_REQUEST);
    }
    assert_eq!(app.licenses.stats().await.unwrap().total, 0);

    let longest = app
        .request(
            "POST",
            "/api/admin/licenses",
            Some(json!({ "email": "qa@example.com", "duration_seconds": 31_536_000 })),
            Some(ADMIN_TOKEN),
        )
        .await;
    assert_eq!(longest.status, StatusCode::OK);
    assert!(longest.data()["token"].is_string());

    app.advance(365 * 86_400);
    assert_eq!(app.licenses.expire_elapsed().await.unwrap(), 1);

    let stats = app
        .request("GET", "/api/admin/licenses/stats", None, Some(ADMIN_TOKEN))
        .await;
    assert_eq!(stats.status, StatusCode::OK);
    assert_eq!(stats.data()["expired"], 1);
}

#[tokio::test]
async fn test_get_and_revoke_unknown_key() {
    let app = TestApp::new();

    let get = app
        .request("GET", "/api/admin/licenses/CC-UNKNOWN", None, Some(ADMIN_TOKEN))
        .await;
    assert_eq!(get.status, StatusCode::NOT_FOUND);

    let revoke = app
        .request(
            "POST",
            "/api/admin/licenses/CC-UNKNOWN/revoke",
            None,
            Some(ADMIN_TOKEN),
        )
        .await;
    assert_eq!(revoke.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_stats_after_sweep() {
    let app = TestApp::new();
    app.request("POST", "/api/trial", Some(json!({ "email": "t1@example.com" })), None)
        .await;
    app.issue_purchase("buyer@example.com", 3600, "cs_stats").await;

    app.advance(301);
    assert_eq!(app.licenses.expire_elapsed().await.unwrap(), 1);

    let stats = app
        .request("GET", "/api/admin/licenses/stats", None, Some(ADMIN_TOKEN))
        .await;
    assert_eq!(stats.status, StatusCode::OK);
    assert_eq!(stats.data()["total"], 2);
    assert_eq!(stats.data()["active"], 1);
    assert_eq!(stats.data()["expired"], 1);
    assert_eq!(stats.data()["revoked"], 0);
}

#[tokio::test]
async fn test_health_endpoints() {
    let app = TestApp::new();

    let basic = app.request("GET", "/api/health", None, None).await;
    assert_eq!(basic.status, StatusCode::OK);
    assert_eq!(basic.data()["status"], "ok");

    let detailed = app.request("GET", "/api/health/detailed", None, None).await;
    assert_eq!(detailed.status, StatusCode::OK);
    assert_eq!(detailed.data()["store"], "memory");
    assert_eq!(detailed.data()["store_healthy"], true);
    assert_eq!(detailed.data()["licenses"]["total"], 0);
}
