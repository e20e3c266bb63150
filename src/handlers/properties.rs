// Property management handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use tracing::warn;
use uuid::Uuid;

use crate::{
    app::AppState,
    middleware::auth::AuthenticatedUser,
    models::{CreatePropertyRequest, UpdatePropertyRequest},
    utils::ServiceError,
};

/// GET /v1/properties
/// Every fetch of the list also runs the lease-expiry sweep over it
pub async fn list_properties(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    let properties = state.properties().list(&auth_user.user_id).await?;

    if state.config.notifications.sweep_on_property_list {
        let report = state
            .lease_expiry()
            .sweep(&auth_user.user_id, &properties, Utc::now())
            .await;
        if report.failed > 0 {
            warn!(
                "Lease expiry sweep for {} had {} failures",
                auth_user.user_id, report.failed
            );
        }
    }

    Ok(Json(properties))
}

/// POST /v1/properties
pub async fn create_property(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Json(request): Json<CreatePropertyRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let property = state
        .properties()
        .create(&auth_user.user_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(property)))
}

/// GET /v1/properties/{id}
pub async fn get_property(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(state.properties().get(&auth_user.user_id, id).await?))
}

/// PUT /v1/properties/{id}
pub async fn update_property(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdatePropertyRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let property = state
        .properties()
        .update(&auth_user.user_id, id, request)
        .await?;
    Ok(Json(property))
}

/// DELETE /v1/properties/{id}
pub async fn delete_property(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.properties().delete(&auth_user.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
