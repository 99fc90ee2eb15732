//! Integration tests for pricing, checkout, confirmation and webhooks.

use axum::http::StatusCode;
use serde_json::{Value, json};

use licensehub_service::payment::{CheckoutSession, PaymentStatus};

use crate::helpers::{ADMIN_EMAIL, TestApp};

async fn start_checkout(app: &TestApp, hours: u32) -> String {
    let response = app
        .request(
            "POST",
            "/api/purchase",
            Some(json!({ "name": "Ada Buyer", "email": "ada@example.com", "hours": hours })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["type"], "checkout");
    response.data()["session_id"].as_str().unwrap().to_string()
}

fn completed_event(session_id: &str) -> Value {
    json!({
        "id": "evt_1",
        "type": "checkout.session.completed",
        "data": { "object": { "id": session_id, "payment_status": "paid" } }
    })
}

#[tokio::test]
async fn test_pricing_table() {
    let app = TestApp::new();

    let response = app.request("GET", "/api/pricing", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    let prices = response.data()["prices"].as_array().unwrap();
    assert_eq!(prices.len(), 5);
    assert_eq!(prices[0]["hours"], 1);
    assert_eq!(prices[0]["amount_cents"], 999);
    assert_eq!(prices[4]["hours"], 5);
    assert_eq!(prices[4]["amount_cents"], 4500);
}

#[tokio::test]
async fn test_checkout_then_confirm_issues_once() {
    let app = TestApp::new();
    let session_id = start_checkout(&app, 2).await;
    let confirm_path = format!("/api/purchase/success?session_id={session_id}");

    let unpaid = app.request("GET", &confirm_path, None, None).await;
    assert_eq!(unpaid.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(unpaid.error_code(), "LICENSE");

    assert!(app.gateway.mark_paid(&session_id));

    let first = app.request("GET", &confirm_path, None, None).await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.data()["newly_issued"], true);
    assert_eq!(first.data()["email_sent"], true);
    assert_eq!(first.data()["license"]["kind"], "purchase");
    assert_eq!(first.data()["license"]["allotted_seconds"], 7200);
    assert_eq!(first.data()["license"]["order_id"], session_id.as_str());

    let second = app.request("GET", &confirm_path, None, None).await;
    assert_eq!(second.status, StatusCode::OK);
    assert_eq!(second.data()["newly_issued"], false);
    assert_eq!(second.data()["license"]["key"], first.data()["license"]["key"]);

    assert_eq!(app.mailer.sent().await.len(), 1);
    assert_eq!(app.licenses.stats().await.unwrap().total, 1);
}

#[tokio::test]
async fn test_admin_email_purchase_is_granted() {
    let app = TestApp::new();

    let response = app
        .request(
            "POST",
            "/api/purchase",
            Some(json!({ "name": "Owner", "email": ADMIN_EMAIL, "hours": 3 })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["type"], "granted");
    assert_eq!(response.data()["email_sent"], true);
    assert_eq!(response.data()["license"]["kind"], "admin_grant");
    assert_eq!(response.data()["license"]["allotted_seconds"], 3 * 3600);

    let sent = app.mailer.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to_email, ADMIN_EMAIL);
}

#[tokio::test]
async fn test_purchase_validation() {
    let app = TestApp::new();

    let bad_hours = app
        .request(
            "POST",
            "/api/purchase",
            Some(json!({ "name": "Ada", "email": "ada@example.com", "hours": 7 })),
            None,
        )
        .await;
    assert_eq!(bad_hours.status, StatusCode::BAD_REQUEST);

    let typo = app
        .request(
            "POST",
            "/api/purchase",
            Some(json!({ "name": "Ada", "email": "ada@gmial.com", "hours": 1 })),
            None,
        )
        .await;
    assert_eq!(typo.status, StatusCode::BAD_REQUEST);
    assert!(
        typo.body["message"]
            .as_str()
            .unwrap()
            .contains("Did you mean ada@gmail.com?")
    );

    let no_name = app
        .request(
            "POST",
            "/api/purchase",
            Some(json!({ "name": "  ", "email": "ada@example.com", "hours": 1 })),
            None,
        )
        .await;
    assert_eq!(no_name.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_confirm_rejects_amount_mismatch() {
    let app = TestApp::new();
    app.gateway.insert(CheckoutSession {
        id: "cs_underpaid".to_string(),
        url: None,
        payment_status: PaymentStatus::Paid,
        amount_total: Some(100),
        currency: Some("usd".to_string()),
        email: Some("cheap@example.com".to_string()),
        name: Some("Cheap".to_string()),
        hours: Some(5),
    });

    let response = app
        .request("GET", "/api/purchase/success?session_id=cs_underpaid", None, None)
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(app.licenses.stats().await.unwrap().total, 0);
}

#[tokio::test]
async fn test_cancel_acknowledged() {
    let app = TestApp::new();

    let response = app
        .request("POST", "/api/purchase/cancel?session_id=cs_abandoned", None, None)
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(app.licenses.stats().await.unwrap().total, 0);
}

#[tokio::test]
async fn test_signed_webhook_confirms_purchase_once() {
    let app = TestApp::new();
    let session_id = start_checkout(&app, 1).await;
    app.gateway.mark_paid(&session_id);
    let event = completed_event(&session_id);

    let first = app.post_webhook(&event, Some(app.sign(&event))).await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.data()["result"], "processed");
    assert_eq!(first.data()["newly_issued"], true);
    assert_eq!(first.data()["order_id"], session_id.as_str());

    let replay = app.post_webhook(&event, Some(app.sign(&event))).await;
    assert_eq!(replay.status, StatusCode::OK);
    assert_eq!(replay.data()["newly_issued"], false);

    let license = app.licenses.find_by_order(&session_id).await.unwrap().unwrap();
    assert_eq!(license.allotted_seconds, 3600);
    assert_eq!(app.licenses.stats().await.unwrap().total, 1);
}

#[tokio::test]
async fn test_webhook_signature_required() {
    let app = TestApp::new();
    let session_id = start_checkout(&app, 1).await;
    app.gateway.mark_paid(&session_id);
    let event = completed_event(&session_id);

    let unsigned = app.post_webhook(&event, None).await;
    assert_eq!(unsigned.status, StatusCode::UNAUTHORIZED);

    let forged = app
        .post_webhook(&event, Some("t=1,v1=deadbeef".to_string()))
        .await;
    assert_eq!(forged.status, StatusCode::UNAUTHORIZED);

    let signature = app.sign(&event);
    app.advance(3600);
    let stale = app.post_webhook(&event, Some(signature)).await;
    assert_eq!(stale.status, StatusCode::UNAUTHORIZED);

    assert_eq!(app.licenses.stats().await.unwrap().total, 0);
}

#[tokio::test]
async fn test_webhook_extreme_timestamps_rejected() {
    let app = TestApp::new();
    let session_id = start_checkout(&app, 1).await;
    app.gateway.mark_paid(&session_id);
    let event = completed_event(&session_id);

    for header in [
        format!("t={},v1=00", i64::MIN),
        format!("t={},v1=00", i64::MAX),
        "t=99999999999999999999,v1=00".to_string(),
    ] {
        let response = app.post_webhook(&event, Some(header)).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    }

    assert_eq!(app.licenses.stats().await.unwrap().total, 0);
}

#[tokio::test]
async fn test_webhook_ignores_other_events() {
    let app = TestApp::new();
    let event = json!({
        "id": "evt_2",
        "type": "payment_intent.created",
        "data": { "object": { "id": "pi_1" } }
    });

    let response = app.post_webhook(&event, Some(app.sign(&event))).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["result"], "ignored");
    assert_eq!(response.data()["event_type"], "payment_intent.created");
}
