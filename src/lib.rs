// Library exports for the realty back office API
// main.rs and the integration tests both build the router from here

pub mod app;
pub mod app_config;
pub mod db;
pub mod handlers;
pub mod middleware;
pub mod migrations;
pub mod models;
pub mod schema;
pub mod services;
pub mod store;
pub mod utils;

// Re-export commonly used types
pub use app::AppState;
pub use app_config::{AppConfig, ConfigError, StoreBackend};
pub use db::{DieselDatabaseConfig, DieselPool};
pub use middleware::{auth_middleware, AuthenticatedUser};
pub use store::{MemoryStore, PgStore, Store, StoreError};
pub use utils::ServiceError;

use axum::{
    extract::State,
    http::StatusCode,
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use services::{
    subscription::PriceCatalog, triage::classifier_from_config, HttpCheckoutClient,
    IdentityVerifier, WebhookVerifier,
};

/// Build every client once and wire them into the shared state
pub async fn initialize_app_state(
    config: AppConfig,
) -> Result<AppState, Box<dyn std::error::Error + Send + Sync>> {
    let store: Arc<dyn Store> = match config.store_backend {
        StoreBackend::Postgres => {
            info!("Initializing database pool...");
            let pool =
                db::create_diesel_pool(DieselDatabaseConfig::from(&config.database)).await?;
            migrations::run_all_migrations(&config).await?;
            Arc::new(PgStore::new(pool))
        },
        StoreBackend::Memory => {
            info!("Using in-memory store, data is lost on restart");
            Arc::new(MemoryStore::new())
        },
    };

    let identity = Arc::new(IdentityVerifier::from_config(&config.identity)?);
    let webhooks = Arc::new(WebhookVerifier::new(
        &config.payments.webhook_secret,
        config.payments.webhook_tolerance_secs,
    ));

    let prices = PriceCatalog::from_config(&config.payments);
    if prices.is_empty() {
        tracing::warn!("No plan price ids configured, checkout and plan webhooks will be rejected");
    }

    let checkout = Arc::new(HttpCheckoutClient::from_config(&config.payments)?);
    let classifier = classifier_from_config(&config.ai)?;

    Ok(AppState {
        config: Arc::new(config),
        store,
        identity,
        webhooks,
        prices: Arc::new(prices),
        checkout,
        classifier,
    })
}

/// Full router: authenticated API under /v1, public endpoints alongside
pub fn build_router(state: AppState) -> Router {
    let realtor_only = Router::new()
        .nest("/properties", handlers::property_routes())
        .nest("/tenants", handlers::tenant_routes())
        .nest("/appointments", handlers::appointment_routes())
        .nest("/maintenance-requests", handlers::maintenance_routes())
        .nest("/rent-payments", handlers::rent_payment_routes())
        .nest("/notifications", handlers::notification_routes())
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware::require_realtor,
        ));

    // auth_middleware is the outer route layer, so it runs before the guard
    let authenticated = Router::new()
        .nest("/onboarding", handlers::onboarding_routes())
        .merge(realtor_only)
        .nest("/leads", handlers::lead_routes())
        .nest("/billing", handlers::billing_routes())
        .nest("/portal", handlers::portal_routes())
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    let v1 = authenticated.merge(handlers::public_routes());

    Router::new()
        .route("/health", get(health_check))
        .nest("/v1", v1)
        .layer(from_fn_with_state(
            state.clone(),
            middleware::dynamic_cors_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// Health check handler
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let timestamp = chrono::Utc::now().to_rfc3339();

    let (healthy, store_health) = match state.store.health_check().await {
        Ok(()) => (
            true,
            serde_json::json!({ "status": "healthy", "error": null }),
        ),
        Err(e) => (
            false,
            serde_json::json!({
                "status": "unhealthy",
                "error": format!("Store check failed: {}", e)
            }),
        ),
    };

    let response = serde_json::json!({
        "status": if healthy { "healthy" } else { "degraded" },
        "service": "realty-backend-core",
        "timestamp": timestamp,
        "components": {
            "store": store_health,
            "triage": if state.config.ai.api_key.is_some() { "configured" } else { "fallback" },
        }
    });

    if healthy {
        (StatusCode::OK, Json(response))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(response))
    }
}
