// HTTP handlers, one module per resource

pub mod appointments;
pub mod billing;
pub mod leads;
pub mod maintenance;
pub mod notifications;
pub mod onboarding;
pub mod portal;
pub mod properties;
pub mod rent_payments;
pub mod tenants;

use crate::app::AppState;
use axum::{
    routing::{get, post, put},
    Router,
};

// Onboarding routes
pub fn onboarding_routes() -> Router<AppState> {
    Router::new().route(
        "/role",
        get(onboarding::resolve_role).post(onboarding::select_role),
    )
}

pub fn property_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(properties::list_properties).post(properties::create_property),
        )
        .route(
            "/{id}",
            get(properties::get_property)
                .put(properties::update_property)
                .delete(properties::delete_property),
        )
}

pub fn tenant_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(tenants::list_tenants).post(tenants::create_tenant))
        .route(
            "/{id}",
            get(tenants::get_tenant)
                .put(tenants::update_tenant)
                .delete(tenants::delete_tenant),
        )
}

pub fn appointment_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(appointments::list_appointments).post(appointments::create_appointment),
        )
        .route(
            "/{id}",
            put(appointments::update_appointment).delete(appointments::delete_appointment),
        )
}

pub fn maintenance_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(maintenance::list_maintenance).post(maintenance::create_maintenance),
        )
        .route("/triage", post(maintenance::triage_description))
        .route("/classify", post(maintenance::classify_pending))
        .route(
            "/{id}",
            put(maintenance::update_maintenance).delete(maintenance::delete_maintenance),
        )
}

pub fn rent_payment_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(rent_payments::list_rent_payments).post(rent_payments::create_rent_payment),
        )
        .route(
            "/{id}",
            put(rent_payments::update_rent_payment).delete(rent_payments::delete_rent_payment),
        )
}

pub fn lead_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(leads::list_leads))
        .route("/{id}", put(leads::update_lead).delete(leads::delete_lead))
}

pub fn notification_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(notifications::list_notifications))
        .route("/sweep", post(notifications::sweep_lease_expiry))
        .route("/{id}/read", post(notifications::mark_read))
}

pub fn billing_routes() -> Router<AppState> {
    Router::new()
        .route("/checkout", post(billing::start_checkout))
        .route("/subscription", get(billing::get_subscription))
}

// Tenant portal routes
pub fn portal_routes() -> Router<AppState> {
    Router::new()
        .route("/claim", post(portal::claim_tenant_record))
        .route(
            "/maintenance-requests",
            get(portal::list_my_maintenance).post(portal::create_my_maintenance),
        )
        .route("/rent-payments", get(portal::list_my_rent_payments))
}

// Routes reachable without a bearer token
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/webhooks/payments", post(billing::payments_webhook))
        .route("/public/leads", post(leads::capture_lead))
}
