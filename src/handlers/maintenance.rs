// Maintenance request handlers, including AI triage

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    app::AppState,
    middleware::auth::AuthenticatedUser,
    models::{CreateMaintenanceRequest, TriageRequest, TriageResponse, UpdateMaintenanceRequest},
    services::triage::triage,
    utils::ServiceError,
};

pub async fn list_maintenance(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(state.maintenance().list(&auth_user.user_id).await?))
}

pub async fn create_maintenance(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Json(request): Json<CreateMaintenanceRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let created = state
        .maintenance()
        .create(&auth_user.user_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_maintenance(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateMaintenanceRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let updated = state
        .maintenance()
        .update(&auth_user.user_id, id, request)
        .await?;
    Ok(Json(updated))
}

pub async fn delete_maintenance(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.maintenance().delete(&auth_user.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /v1/maintenance-requests/triage - Classify a description without storing it
pub async fn triage_description(
    State(state): State<AppState>,
    _auth_user: AuthenticatedUser,
    Json(request): Json<TriageRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    request.validate()?;
    let priority = triage(state.classifier.as_ref(), &request.description).await;
    Ok(Json(TriageResponse { priority }))
}

/// POST /v1/maintenance-requests/classify - Backfill missing priorities
pub async fn classify_pending(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    let classified = state
        .maintenance()
        .classify_pending(&auth_user.user_id)
        .await?;
    Ok(Json(json!({ "classified": classified })))
}
