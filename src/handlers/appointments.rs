// Appointment calendar handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    app::AppState,
    middleware::auth::AuthenticatedUser,
    models::{
        check_time_range, AppointmentChanges, CreateAppointmentRequest, UpdateAppointmentRequest,
    },
    services::ownership::ensure_owned,
    utils::ServiceError,
};

pub async fn list_appointments(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(state.store.list_appointments(&auth_user.user_id).await?))
}

pub async fn create_appointment(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Json(request): Json<CreateAppointmentRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    request.validate()?;
    check_time_range(request.starts_at, request.ends_at).map_err(ServiceError::ValidationError)?;
    ensure_owned(
        state.store.as_ref(),
        &auth_user.user_id,
        None,
        request.property_id,
    )
    .await?;

    let appointment = state
        .store
        .insert_appointment(request.into_new_appointment(&auth_user.user_id))
        .await?;
    Ok((StatusCode::CREATED, Json(appointment)))
}

pub async fn update_appointment(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateAppointmentRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    request.validate()?;
    // Only checkable when both ends arrive together
    if let (Some(starts_at), Some(ends_at)) = (request.starts_at, request.ends_at) {
        check_time_range(starts_at, ends_at).map_err(ServiceError::ValidationError)?;
    }
    ensure_owned(
        state.store.as_ref(),
        &auth_user.user_id,
        None,
        request.property_id.flatten(),
    )
    .await?;

    let appointment = state
        .store
        .update_appointment(&auth_user.user_id, id, AppointmentChanges::from(request))
        .await?
        .ok_or(ServiceError::NotFound)?;
    Ok(Json(appointment))
}

pub async fn delete_appointment(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    if state.store.delete_appointment(&auth_user.user_id, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ServiceError::NotFound)
    }
}
