// Plan limits on property creation

mod common;

use axum::http::StatusCode;
use common::{
    checkout_completed, setup_test_app, status_event, subscription_updated, TestApp, PRICE_BASIC,
    PRICE_PREMIUM, PRICE_PRO,
};
use serde_json::{json, Value};

async fn create_property(app: &TestApp, owner_id: &str, title: &str) -> StatusCode {
    app.post("/v1/properties")
        .as_user(owner_id)
        .json(&json!({
            "title": title,
            "address": "1 Main St",
            "price_cents": 250_000_00
        }))
        .send()
        .await
        .status()
}

#[tokio::test]
async fn test_no_plan_blocks_creation() {
    let app = setup_test_app();
    app.onboard_realtor("realtor_1").await;

    let response = app
        .post("/v1/properties")
        .as_user("realtor_1")
        .json(&json!({"title": "Loft", "address": "2 Elm St", "price_cents": 1000}))
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
    let body: Value = response.json().await;
    assert_eq!(body["status"], 402);
}

#[tokio::test]
async fn test_basic_plan_allows_five() {
    let app = setup_test_app();
    app.onboard_realtor("realtor_2").await;
    app.activate_plan("realtor_2", PRICE_BASIC).await;

    for n in 0..5 {
        assert_eq!(
            create_property(&app, "realtor_2", &format!("Unit {}", n)).await,
            StatusCode::CREATED
        );
    }
    assert_eq!(
        create_property(&app, "realtor_2", "Unit 6").await,
        StatusCode::PAYMENT_REQUIRED
    );

    let listed: Vec<Value> = app
        .get("/v1/properties")
        .as_user("realtor_2")
        .send()
        .await
        .json()
        .await;
    assert_eq!(listed.len(), 5);
}

#[tokio::test]
async fn test_upgrade_lifts_the_limit() {
    let app = setup_test_app();
    app.onboard_realtor("realtor_3").await;
    app.activate_plan("realtor_3", PRICE_BASIC).await;
    for n in 0..5 {
        create_property(&app, "realtor_3", &format!("Unit {}", n)).await;
    }
    assert_eq!(
        create_property(&app, "realtor_3", "Blocked").await,
        StatusCode::PAYMENT_REQUIRED
    );

    app.send_webhook(&subscription_updated("cus_realtor_3", PRICE_PRO, "active", None))
        .await;
    assert_eq!(
        create_property(&app, "realtor_3", "Allowed").await,
        StatusCode::CREATED
    );
}

#[tokio::test]
async fn test_deleting_frees_a_slot() {
    let app = setup_test_app();
    app.onboard_realtor("realtor_4").await;
    app.activate_plan("realtor_4", PRICE_BASIC).await;
    for n in 0..5 {
        create_property(&app, "realtor_4", &format!("Unit {}", n)).await;
    }

    let listed: Vec<Value> = app
        .get("/v1/properties")
        .as_user("realtor_4")
        .send()
        .await
        .json()
        .await;
    let id = listed[0]["id"].as_str().unwrap().to_string();
    let deleted = app
        .delete(&format!("/v1/properties/{}", id))
        .as_user("realtor_4")
        .send()
        .await;
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

    assert_eq!(
        create_property(&app, "realtor_4", "Replacement").await,
        StatusCode::CREATED
    );
}

#[tokio::test]
async fn test_canceled_plan_blocks_creation() {
    let app = setup_test_app();
    app.onboard_realtor("realtor_5").await;
    app.activate_plan("realtor_5", PRICE_PRO).await;
    assert_eq!(
        create_property(&app, "realtor_5", "Before").await,
        StatusCode::CREATED
    );

    app.send_webhook(&status_event("customer.subscription.deleted", "cus_realtor_5"))
        .await;
    assert_eq!(
        create_property(&app, "realtor_5", "After").await,
        StatusCode::PAYMENT_REQUIRED
    );

    // Existing properties stay readable
    let listed: Vec<Value> = app
        .get("/v1/properties")
        .as_user("realtor_5")
        .send()
        .await
        .json()
        .await;
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
async fn test_late_cancellation_of_old_customer_keeps_newer_plan() {
    let app = setup_test_app();
    app.onboard_realtor("realtor_7").await;
    app.send_webhook(&checkout_completed("cus_old_7", "realtor_7", PRICE_PRO))
        .await;
    app.send_webhook(&checkout_completed("cus_new_7", "realtor_7", PRICE_PREMIUM))
        .await;

    let deleted = app
        .send_webhook(&status_event("customer.subscription.deleted", "cus_old_7"))
        .await;
    assert_eq!(deleted.status(), StatusCode::OK);

    let subscription: Value = app
        .get("/v1/billing/subscription")
        .as_user("realtor_7")
        .send()
        .await
        .json()
        .await;
    assert_eq!(subscription["customer_id"], "cus_new_7");
    assert_eq!(subscription["plan"], "premium");
    assert_eq!(subscription["status"], "active");
    assert_eq!(
        create_property(&app, "realtor_7", "Still allowed").await,
        StatusCode::CREATED
    );
}

#[tokio::test]
async fn test_invalid_property_is_rejected_before_limit_check() {
    let app = setup_test_app();
    app.onboard_realtor("realtor_6").await;

    let response = app
        .post("/v1/properties")
        .as_user("realtor_6")
        .json(&json!({"title": "", "address": "3 Oak St", "price_cents": -1}))
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
