//! Integration tests for activation, usage heartbeats, expiry and trials.

use axum::http::StatusCode;
use serde_json::json;

use crate::helpers::{ADMIN_TOKEN, TestApp};

#[tokio::test]
async fn test_issued_license_activates_with_full_allotment() {
    let app = TestApp::new();
    let key = app.issue_purchase("buyer@example.com", 3600, "cs_test_1").await;

    let response = app
        .request("POST", "/api/licenses/activate", Some(json!({ "key": key })), None)
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["status"], "active");
    assert_eq!(response.data()["kind"], "purchase");
    assert_eq!(response.data()["remaining_seconds"], 3600);
}

#[tokio::test]
async fn test_activation_is_idempotent() {
    let app = TestApp::new();
    let key = app.issue_purchase("buyer@example.com", 7200, "cs_test_2").await;

    let first = app
        .request("POST", "/api/licenses/activate", Some(json!({ "key": key })), None)
        .await;
    let second = app
        .request("POST", "/api/licenses/activate", Some(json!({ "key": key })), None)
        .await;

    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.body, second.body);
}

#[tokio::test]
async fn test_activate_unknown_key() {
    let app = TestApp::new();

    let response = app
        .request(
            "POST",
            "/api/licenses/activate",
            Some(json!({ "key": "CC-DOESNOTEXIST" })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.error_code(), "NOT_FOUND");
    assert_eq!(app.licenses.stats().await.unwrap().total, 0);
}

#[tokio::test]
async fn test_usage_exhausts_purchase() {
    let app = TestApp::new();
    let key = app.issue_purchase("buyer@example.com", 3600, "cs_test_3").await;

    let first = app
        .request(
            "POST",
            "/api/licenses/usage",
            Some(json!({ "key": key, "elapsed_seconds": 1800 })),
            None,
        )
        .await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.data()["outcome"], "applied");
    assert_eq!(first.data()["status"], "active");
    assert_eq!(first.data()["remaining_seconds"], 1800);

    let second = app
        .request(
            "POST",
            "/api/licenses/usage",
            Some(json!({ "key": key, "elapsed_seconds": 1800 })),
            None,
        )
        .await;
    assert_eq!(second.data()["outcome"], "applied");
    assert_eq!(second.data()["status"], "expired");
    assert_eq!(second.data()["remaining_seconds"], 0);

    let third = app
        .request(
            "POST",
            "/api/licenses/usage",
            Some(json!({ "key": key, "elapsed_seconds": 60 })),
            None,
        )
        .await;
    assert_eq!(third.data()["outcome"], "not_applicable");

    let expiry = app
        .request("GET", &format!("/api/licenses/{key}/expiry"), None, None)
        .await;
    assert_eq!(expiry.status, StatusCode::OK);
    assert_eq!(expiry.data()["expired"], true);

    let license = app.licenses.get(&key).await.unwrap();
    assert_eq!(license.consumed_seconds, 3600);
}

#[tokio::test]
async fn test_usage_for_unknown_key_is_ignored() {
    let app = TestApp::new();

    let response = app
        .request(
            "POST",
            "/api/licenses/usage",
            Some(json!({ "key": "CC-NOPE", "elapsed_seconds": 30 })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["outcome"], "unknown_key");
}

#[tokio::test]
async fn test_negative_usage_is_rejected() {
    let app = TestApp::new();
    let key = app.issue_purchase("buyer@example.com", 3600, "cs_test_4").await;

    let response = app
        .request(
            "POST",
            "/api/licenses/usage",
            Some(json!({ "key": key, "elapsed_seconds": -10 })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(app.licenses.get(&key).await.unwrap().consumed_seconds, 0);
}

#[tokio::test]
async fn test_trial_expires_on_wall_clock() {
    let app = TestApp::new();

    let trial = app
        .request("POST", "/api/trial", Some(json!({ "email": "curious@example.com" })), None)
        .await;
    assert_eq!(trial.status, StatusCode::OK);
    assert_eq!(trial.data()["kind"], "trial");
    assert_eq!(trial.data()["remaining_seconds"], 300);
    let key = trial.data()["key"].as_str().unwrap().to_string();
    let expiry_path = format!("/api/licenses/{key}/expiry");

    // Usage reports do not move a wall-clock window.
    let usage = app
        .request(
            "POST",
            "/api/licenses/usage",
            Some(json!({ "key": key, "elapsed_seconds": 299 })),
            None,
        )
        .await;
    assert_eq!(usage.data()["outcome"], "not_applicable");

    app.advance(299);
    let before = app.request("GET", &expiry_path, None, None).await;
    assert_eq!(before.data()["expired"], false);

    app.advance(2);
    let after = app.request("GET", &expiry_path, None, None).await;
    assert_eq!(after.data()["expired"], true);

    let activation = app
        .request("POST", "/api/licenses/activate", Some(json!({ "key": key })), None)
        .await;
    assert_eq!(activation.data()["status"], "expired");
    assert_eq!(activation.data()["remaining_seconds"], 0);
}

#[tokio::test]
async fn test_trial_rejects_bad_email() {
    let app = TestApp::new();

    let response = app
        .request("POST", "/api/trial", Some(json!({ "email": "not-an-email" })), None)
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_code(), "VALIDATION");
}

#[tokio::test]
async fn test_revoked_license_reports_revoked() {
    let app = TestApp::new();
    let key = app.issue_purchase("buyer@example.com", 3600, "cs_test_5").await;
    let revoke_path = format!("/api/admin/licenses/{key}/revoke");

    let first = app
        .request("POST", &revoke_path, None, Some(ADMIN_TOKEN))
        .await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.data()["status"], "revoked");

    let activation = app
        .request("POST", "/api/licenses/activate", Some(json!({ "key": key })), None)
        .await;
    assert_eq!(activation.data()["status"], "revoked");
    assert_eq!(activation.data()["remaining_seconds"], 0);

    let second = app
        .request("POST", &revoke_path, None, Some(ADMIN_TOKEN))
        .await;
    assert_eq!(second.status, StatusCode::OK);
    assert_eq!(second.data()["status"], "revoked");
}

#[tokio::test]
async fn test_expiry_for_unknown_key() {
    let app = TestApp::new();

    let response = app
        .request("GET", "/api/licenses/CC-MISSING/expiry", None, None)
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_oversized_usage_is_rejected() {
    let app = TestApp::new();
    let key = app.issue_purchase("buyer@example.com", 3600, "cs_test_huge").await;

    for elapsed in [31_536_001_i64, i64::MAX] {
        let response = app
            .request(
                "POST",
                "/api/licenses/usage",
                Some(json!({ "key": key, "elapsed_seconds": elapsed })),
                None,
            )
            .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.error_code(), "VALIDATION");
    }

    let stored = app.licenses.get(&key).await.unwrap();
    assert_eq!(stored.consumed_seconds, 0);
    assert_eq!(stored.version, 0);
}

#[tokio::test]
async fn test_purchase_expires_one_year_after_issue() {
    let app = TestApp::new();
    let key = app.issue_purchase("buyer@example.com", 3600, "cs_test_year").await;

    app.advance(364 * 86_400);
    let expiry = app
        .request("GET", &format!("/api/licenses/{key}/expiry"), None, None)
        .await;
    assert_eq!(expiry.data()["expired"], false);

    app.advance(86_400);
    let expiry = app
        .request("GET", &format!("/api/licenses/{key}/expiry"), None, None)
        .await;
    assert_eq!(expiry.data()["expired"], true);

    let activation = app
        .request("POST", "/api/licenses/activate", Some(json!({ "key": key })), None)
        .await;
    assert_eq!(activation.data()["status"], "expired");
    assert_eq!(activation.data()["remaining_seconds"], 0);
    assert!(activation.data().get("token").is_none());
}

#[tokio::test]
async fn test_activation_token_verifies() {
    let app = TestApp::new();
    let key = app.issue_purchase("buyer@example.com", 7200, "cs_test_token").await;

    let activation = app
        .request("POST", "/api/licenses/activate", Some(json!({ "key": key })), None)
        .await;
    let token = activation.data()["token"].as_str().unwrap().to_string();
    let expires_at = activation.data()["expires_at"].clone();
    assert!(!expires_at.is_null());

    let verified = app
        .request("POST", "/api/licenses/verify", Some(json!({ "token": token })), None)
        .await;
    assert_eq!(verified.status, StatusCode::OK);
    assert_eq!(verified.data()["claims"]["key"], key.as_str());
    assert_eq!(verified.data()["claims"]["sub"], "buyer@example.com");
    assert_eq!(verified.data()["claims"]["usage_hours"], 2);
    assert_eq!(verified.data()["license"]["status"], "active");

    let forged = app
        .request(
            "POST",
            "/api/licenses/verify",
            Some(json!({ "token": format!("{token}x") })),
            None,
        )
        .await;
    assert_eq!(forged.status, StatusCode::UNAUTHORIZED);

    app.advance(365 * 86_400);
    let expired = app
        .request("POST", "/api/licenses/verify", Some(json!({ "token": token })), None)
        .await;
    assert_eq!(expired.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(expired.error_code(), "LICENSE");
}

