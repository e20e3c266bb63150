// Notification handlers

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{app::AppState, middleware::auth::AuthenticatedUser, utils::ServiceError};

pub async fn list_notifications(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(state.store.list_notifications(&auth_user.user_id).await?))
}

/// POST /v1/notifications/sweep - Run the lease-expiry sweep now
pub async fn sweep_lease_expiry(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    let report = state
        .lease_expiry()
        .sweep_realtor(&auth_user.user_id, Utc::now())
        .await?;
    Ok(Json(report))
}

pub async fn mark_read(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let notification = state
        .store
        .mark_notification_read(&auth_user.user_id, id)
        .await?
        .ok_or(ServiceError::NotFound)?;
    Ok(Json(notification))
}
