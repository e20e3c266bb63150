// Rent payment ledger handlers

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
    models::{CreateRentPaymentRequest, RentPaymentChanges, UpdateRentPaymentRequest},
    services::ownership::ensure_owned,
    utils::ServiceError,
};

pub async fn list_rent_payments(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(state.store.list_rent_payments(&auth_user.user_id).await?))
}

/// POST /v1/rent-payments - the tenant and property must belong to the caller
pub async fn create_rent_payment(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Json(request): Json<CreateRentPaymentRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    request.validate()?;
    ensure_owned(
        state.store.as_ref(),
        &auth_user.user_id,
        Some(&request.tenant_id),
        request.property_id,
    )
    .await?;

    let payment = state
        .store
        .insert_rent_payment(request.into_new_payment(&auth_user.user_id))
        .await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

pub async fn update_rent_payment(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateRentPaymentRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    request.validate()?;
    let payment = state
        .store
        .update_rent_payment(&auth_user.user_id, id, RentPaymentChanges::from(request))
        .await?
        .ok_or(ServiceError::NotFound)?;
    Ok(Json(payment))
}

pub async fn delete_rent_payment(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    if state.store.delete_rent_payment(&auth_user.user_id, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ServiceError::NotFound)
    }
}
