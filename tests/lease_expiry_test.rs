// Lease expiry notifications

mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::{setup_test_app, TestApp, PRICE_PRO};
use serde_json::{json, Value};

async fn realtor_with_leases(app: &TestApp, realtor_id: &str) {
    app.onboard_realtor(realtor_id).await;
    app.activate_plan(realtor_id, PRICE_PRO).await;

    let today = Utc::now().date_naive();
    let leases = [
        ("Soon", Some(today + Duration::days(10))),
        ("Later", Some(today + Duration::days(90))),
        ("Expired", Some(today - Duration::days(3))),
        ("Open ended", None),
    ];
    for (title, lease_end) in leases {
        let response = app
            .post("/v1/properties")
            .as_user(realtor_id)
            .json(&json!({
                "title": title,
                "address": "9 Harbor Rd",
                "price_cents": 120_000,
                "lease_end": lease_end
            }))
            .send()
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }
}

async fn notifications(app: &TestApp, realtor_id: &str) -> Vec<Value> {
    app.get("/v1/notifications")
        .as_user(realtor_id)
        .send()
        .await
        .json()
        .await
}

#[tokio::test]
async fn test_listing_properties_notifies_once() {
    let app = setup_test_app();
    realtor_with_leases(&app, "realtor_l1").await;

    for _ in 0..3 {
        let response = app.get("/v1/properties").as_user("realtor_l1").send().await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let listed = notifications(&app, "realtor_l1").await;
    assert_eq!(listed.len(), 1);
    let message = listed[0]["message"].as_str().unwrap();
    assert!(message.starts_with("Lease for \"Soon\" expires on "));
    assert_eq!(listed[0]["read"], false);
}

#[tokio::test]
async fn test_sweep_endpoint_reports_counts() {
    let app = setup_test_app();
    realtor_with_leases(&app, "realtor_l2").await;

    let first: Value = app
        .post("/v1/notifications/sweep")
        .as_user("realtor_l2")
        .send()
        .await
        .json()
        .await;
    assert_eq!(first["scanned"], 4);
    assert_eq!(first["expiring"], 1);
    assert_eq!(first["created"], 1);
    assert_eq!(first["already_notified"], 0);
    assert_eq!(first["failed"], 0);

    let second: Value = app
        .post("/v1/notifications/sweep")
        .as_user("realtor_l2")
        .send()
        .await
        .json()
        .await;
    assert_eq!(second["created"], 0);
    assert_eq!(second["already_notified"], 1);
}

#[tokio::test]
async fn test_notification_store_failure_does_not_fail_listing() {
    let app = setup_test_app();
    realtor_with_leases(&app, "realtor_l3").await;
    app.store.fail_table("notifications");

    let response = app.get("/v1/properties").as_user("realtor_l3").send().await;
    assert_eq!(response.status(), StatusCode::OK);
    let properties: Vec<Value> = response.json().await;
    assert_eq!(properties.len(), 4);

    app.store.heal_table("notifications");
    assert!(notifications(&app, "realtor_l3").await.is_empty());
}

#[tokio::test]
async fn test_mark_read_is_scoped_to_owner() {
    let app = setup_test_app();
    realtor_with_leases(&app, "realtor_l4").await;
    app.onboard_realtor("realtor_l5").await;
    app.post("/v1/notifications/sweep")
        .as_user("realtor_l4")
        .send()
        .await;

    let listed = notifications(&app, "realtor_l4").await;
    let id = listed[0]["id"].as_str().unwrap().to_string();

    let foreign = app
        .post(&format!("/v1/notifications/{}/read", id))
        .as_user("realtor_l5")
        .send()
        .await;
    assert_eq!(foreign.status(), StatusCode::NOT_FOUND);

    let marked = app
        .post(&format!("/v1/notifications/{}/read", id))
        .as_user("realtor_l4")
        .send()
        .await;
    assert_eq!(marked.status(), StatusCode::OK);
    let body: Value = marked.json().await;
    assert_eq!(body["read"], true);

    // A read notification still suppresses the duplicate
    let report: Value = app
        .post("/v1/notifications/sweep")
        .as_user("realtor_l4")
        .send()
        .await
        .json()
        .await;
    assert_eq!(report["created"], 0);
}
