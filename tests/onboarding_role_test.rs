// Role resolution and onboarding through the HTTP API

mod common;

use axum::http::StatusCode;
use chrono::Utc;
use common::{setup_test_app, token_for};
use realty_backend_core::{models::NewRealtor, store::OwnerStore};
use serde_json::{json, Value};

#[tokio::test]
async fn test_requires_bearer_token() {
    let app = setup_test_app();

    let missing = app.get("/v1/onboarding/role").send().await;
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
    let body: Value = missing.json().await;
    assert_eq!(body["status"], 401);

    let garbage = app.get("/v1/onboarding/role").bearer("not-a-jwt").send().await;
    assert_eq!(garbage.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_new_user_is_sent_to_role_selection() {
    let app = setup_test_app();

    let response = app.get("/v1/onboarding/role").as_user("user_new").send().await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await;
    assert_eq!(body["role"], Value::Null);
    assert_eq!(body["dashboard_path"], "/select-role");
    assert_eq!(body["conflicting_roles"], json!([]));
}

#[tokio::test]
async fn test_select_tenant_then_resolve() {
    let app = setup_test_app();

    let selected = app
        .post("/v1/onboarding/role")
        .as_user("user_t")
        .json(&json!({
            "role": "tenant",
            "name": "Sam Tenant",
            "email": "sam@example.com",
            "phone": "555-0100"
        }))
        .send()
        .await;
    assert_eq!(selected.status(), StatusCode::OK);
    let body: Value = selected.json().await;
    assert_eq!(body["role"], "tenant");
    assert_eq!(body["dashboard_path"], "/dashboard/tenant");

    // Resolution is stable across calls
    for _ in 0..2 {
        let resolved: Value = app
            .get("/v1/onboarding/role")
            .as_user("user_t")
            .send()
            .await
            .json()
            .await;
        assert_eq!(resolved["role"], "tenant");
        assert_eq!(resolved["dashboard_path"], "/dashboard/tenant");
    }
}

#[tokio::test]
async fn test_switching_roles_conflicts() {
    let app = setup_test_app();
    app.onboard_realtor("user_r").await;

    let again = app
        .post("/v1/onboarding/role")
        .as_user("user_r")
        .json(&json!({"role": "realtor", "name": "R", "email": "r@example.com"}))
        .send()
        .await;
    assert_eq!(again.status(), StatusCode::OK);

    let switch = app
        .post("/v1/onboarding/role")
        .as_user("user_r")
        .json(&json!({"role": "tenant", "name": "R", "email": "r@example.com"}))
        .send()
        .await;
    assert_eq!(switch.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_company_role_is_not_selectable() {
    let app = setup_test_app();
    let response = app
        .post("/v1/onboarding/role")
        .as_user("user_c")
        .json(&json!({"role": "company", "name": "C", "email": "c@example.com"}))
        .send()
        .await;
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_company_membership_and_precedence() {
    let app = setup_test_app();
    app.store.seed_company("company_1", "Acme Realty");
    app.store.seed_team_member("company_1", "user_m", "agent");

    let member: Value = app
        .get("/v1/onboarding/role")
        .as_user("user_m")
        .send()
        .await
        .json()
        .await;
    assert_eq!(member["role"], "company");
    assert_eq!(member["dashboard_path"], "/dashboard/company");

    // Selection refuses to add a second role
    let select = app
        .post("/v1/onboarding/role")
        .as_user("user_m")
        .json(&json!({"role": "realtor", "name": "M", "email": "m@example.com"}))
        .send()
        .await;
    assert_eq!(select.status(), StatusCode::CONFLICT);

    // A realtor row written out of band outranks the membership and is reported
    app.store
        .insert_realtor(NewRealtor {
            id: "user_m".to_string(),
            name: "M".to_string(),
            email: "m@example.com".to_string(),
            company_name: None,
            created_at: Utc::now(),
        })
        .await
        .unwrap();
    let both: Value = app
        .get("/v1/onboarding/role")
        .as_user("user_m")
        .send()
        .await
        .json()
        .await;
    assert_eq!(both["role"], "realtor");
    assert_eq!(both["conflicting_roles"], json!(["company"]));
}

#[tokio::test]
async fn test_failing_lookup_does_not_fail_resolution() {
    let app = setup_test_app();
    app.onboard_realtor("user_f").await;
    app.store.fail_table("realtors");

    let response = app
        .get("/v1/onboarding/role")
        .bearer(&token_for("user_f"))
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await;
    assert_eq!(body["role"], Value::Null);
    assert_eq!(body["dashboard_path"], "/select-role");
}
