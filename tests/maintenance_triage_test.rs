// Maintenance requests, priority triage and the tenant portal

mod common;

use axum::http::StatusCode;
use chrono::Utc;
use common::{setup_test_app, setup_test_app_with_classifier, StubClassifier};
use realty_backend_core::{
    models::{MaintenanceStatus, NewMaintenanceRequest, Priority},
    store::MaintenanceStore,
};
use serde_json::{json, Value};
use uuid::Uuid;

#[tokio::test]
async fn test_triage_endpoint_uses_classifier() {
    let app = setup_test_app();
    app.onboard_realtor("realtor_t1").await;
    let response = app
        .post("/v1/maintenance-requests/triage")
        .as_user("realtor_t1")
        .json(&json!({"description": "Water is pouring through the ceiling"}))
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await;
    assert_eq!(body["priority"], "high");
}

#[tokio::test]
async fn test_triage_falls_back_to_medium() {
    let app = setup_test_app_with_classifier(StubClassifier(None));
    app.onboard_realtor("realtor_t2").await;

    let triaged: Value = app
        .post("/v1/maintenance-requests/triage")
        .as_user("realtor_t2")
        .json(&json!({"description": "Squeaky door"}))
        .send()
        .await
        .json()
        .await;
    assert_eq!(triaged["priority"], "medium");

    let created = app
        .post("/v1/maintenance-requests")
        .as_user("realtor_t2")
        .json(&json!({"title": "  Door  ", "description": "Squeaky door"}))
        .send()
        .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let body: Value = created.json().await;
    assert_eq!(body["priority"], "medium");
    assert_eq!(body["status"], "pending");
    assert_eq!(body["title"], "Door");
}

#[tokio::test]
async fn test_explicit_priority_skips_triage() {
    let app = setup_test_app();
    app.onboard_realtor("realtor_t3").await;
    let body: Value = app
        .post("/v1/maintenance-requests")
        .as_user("realtor_t3")
        .json(&json!({"title": "Bulb", "description": "Hall light out", "priority": "Low"}))
        .send()
        .await
        .json()
        .await;
    assert_eq!(body["priority"], "low");
}

#[tokio::test]
async fn test_classify_backfills_missing_priorities() {
    let app = setup_test_app();
    app.onboard_realtor("realtor_t4").await;
    let now = Utc::now();
    for title in ["Leak", "Heater"] {
        app.store
            .insert_maintenance(NewMaintenanceRequest {
                id: Uuid::new_v4(),
                realtor_id: "realtor_t4".to_string(),
                tenant_id: None,
                property_id: None,
                title: title.to_string(),
                description: format!("{} needs attention", title),
                status: MaintenanceStatus::Pending,
                priority: None,
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();
    }

    let body: Value = app
        .post("/v1/maintenance-requests/classify")
        .as_user("realtor_t4")
        .send()
        .await
        .json()
        .await;
    assert_eq!(body["classified"], 2);

    let requests = app.store.list_maintenance("realtor_t4").await.unwrap();
    assert!(requests.iter().all(|r| r.priority == Some(Priority::High)));

    let again: Value = app
        .post("/v1/maintenance-requests/classify")
        .as_user("realtor_t4")
        .send()
        .await
        .json()
        .await;
    assert_eq!(again["classified"], 0);
}

#[tokio::test]
async fn test_update_and_delete_are_scoped() {
    let app = setup_test_app();
    app.onboard_realtor("realtor_t5").await;
    app.onboard_realtor("realtor_other").await;
    let created: Value = app
        .post("/v1/maintenance-requests")
        .as_user("realtor_t5")
        .json(&json!({"title": "Sink", "description": "Clogged"}))
        .send()
        .await
        .json()
        .await;
    let uri = format!("/v1/maintenance-requests/{}", created["id"].as_str().unwrap());

    let foreign = app
        .put(&uri)
        .as_user("realtor_other")
        .json(&json!({"status": "completed"}))
        .send()
        .await;
    assert_eq!(foreign.status(), StatusCode::NOT_FOUND);

    let updated: Value = app
        .put(&uri)
        .as_user("realtor_t5")
        .json(&json!({"status": "in_progress"}))
        .send()
        .await
        .json()
        .await;
    assert_eq!(updated["status"], "in_progress");

    let deleted = app.delete(&uri).as_user("realtor_t5").send().await;
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);
    let missing = app.delete(&uri).as_user("realtor_t5").send().await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_portal_files_requests_for_linked_tenant() {
    let app = setup_test_app();
    app.link_tenant("realtor_p1", "tenant_p1").await;

    let created = app
        .post("/v1/portal/maintenance-requests")
        .as_user("tenant_p1")
        .json(&json!({
            "title": "Heating",
            "description": "Radiator is cold",
            "tenant_id": "somebody_else"
        }))
        .send()
        .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let body: Value = created.json().await;
    assert_eq!(body["tenant_id"], "tenant_p1");
    assert_eq!(body["realtor_id"], "realtor_p1");

    let mine: Vec<Value> = app
        .get("/v1/portal/maintenance-requests")
        .as_user("tenant_p1")
        .send()
        .await
        .json()
        .await;
    assert_eq!(mine.len(), 1);

    // The realtor sees it in their own list
    let realtor_view: Vec<Value> = app
        .get("/v1/maintenance-requests")
        .as_user("realtor_p1")
        .send()
        .await
        .json()
        .await;
    assert_eq!(realtor_view.len(), 1);
}

#[tokio::test]
async fn test_portal_rejects_non_tenants() {
    let app = setup_test_app();
    app.onboard_realtor("realtor_p2").await;

    for uri in [
        "/v1/portal/maintenance-requests",
        "/v1/portal/rent-payments",
    ] {
        let response = app.get(uri).as_user("realtor_p2").send().await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    let stranger = app
        .get("/v1/portal/rent-payments")
        .as_user("nobody")
        .send()
        .await;
    assert_eq!(stranger.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_unlinked_tenant_cannot_file() {
    let app = setup_test_app();
    let selected = app
        .post("/v1/onboarding/role")
        .as_user("tenant_p3")
        .json(&json!({"role": "tenant", "name": "Lone", "email": "lone@example.com"}))
        .send()
        .await;
    assert_eq!(selected.status(), StatusCode::OK);

    let response = app
        .post("/v1/portal/maintenance-requests")
        .as_user("tenant_p3")
        .json(&json!({"title": "Window", "description": "Cracked pane"}))
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_cannot_file_for_another_realtors_tenant() {
    let app = setup_test_app();
    app.link_tenant("realtor_b1", "tenant_b1").await;
    app.onboard_realtor("realtor_a1").await;

    let foreign = app
        .post("/v1/maintenance-requests")
        .as_user("realtor_a1")
        .json(&json!({
            "title": "Mould",
            "description": "Black mould in the bathroom",
            "tenant_id": "tenant_b1"
        }))
        .send()
        .await;
    assert_eq!(foreign.status(), StatusCode::BAD_REQUEST);

    // Rows that name the tenant under some other realtor stay out of the portal
    let now = Utc::now();
    app.store
        .insert_maintenance(NewMaintenanceRequest {
            id: Uuid::new_v4(),
            realtor_id: "realtor_a1".to_string(),
            tenant_id: Some("tenant_b1".to_string()),
            property_id: None,
            title: "Planted".to_string(),
            description: "Filed under the wrong realtor".to_string(),
            status: MaintenanceStatus::Pending,
            priority: Some(Priority::Low),
            created_at: now,
            updated_at: now,
        })
        .await
        .unwrap();

    let portal: Vec<Value> = app
        .get("/v1/portal/maintenance-requests")
        .as_user("tenant_b1")
        .send()
        .await
        .json()
        .await;
    assert!(portal.is_empty());
}

#[tokio::test]
async fn test_back_office_routes_require_a_realtor() {
    let app = setup_test_app();
    app.link_tenant("realtor_g1", "tenant_g1").await;

    for uri in [
        "/v1/properties",
        "/v1/tenants",
        "/v1/appointments",
        "/v1/maintenance-requests",
        "/v1/rent-payments",
        "/v1/notifications",
    ] {
        for user in ["tenant_g1", "nobody_g1"] {
            let response = app.get(uri).as_user(user).send().await;
            assert_eq!(response.status(), StatusCode::FORBIDDEN, "{} as {}", uri, user);
        }
    }

    let filed = app
        .post("/v1/maintenance-requests")
        .as_user("tenant_g1")
        .json(&json!({"title": "Door", "description": "Lock is stuck"}))
        .send()
        .await;
    assert_eq!(filed.status(), StatusCode::FORBIDDEN);
}
