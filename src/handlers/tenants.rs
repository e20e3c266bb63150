// Tenant records managed by a realtor

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    app::AppState,
    middleware::auth::AuthenticatedUser,
    models::{CreateTenantRequest, UpdateTenantRequest},
    utils::ServiceError,
};

pub async fn list_tenants(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(state.store.list_tenants(&auth_user.user_id).await?))
}

/// POST /v1/tenants - the id is generated; the tenant links it to their
/// account through POST /v1/portal/claim
pub async fn create_tenant(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Json(request): Json<CreateTenantRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let tenant = state
        .tenants()
        .create(&auth_user.user_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(tenant)))
}

pub async fn get_tenant(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let tenant = state
        .store
        .get_tenant(&auth_user.user_id, &id)
        .await?
        .ok_or(ServiceError::NotFound)?;
    Ok(Json(tenant))
}

pub async fn update_tenant(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(id): Path<String>,
    Json(request): Json<UpdateTenantRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let tenant = state
        .tenants()
        .update(&auth_user.user_id, &id, request)
        .await?;
    Ok(Json(tenant))
}

pub async fn delete_tenant(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    if state.store.delete_tenant(&auth_user.user_id, &id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ServiceError::NotFound)
    }
}
