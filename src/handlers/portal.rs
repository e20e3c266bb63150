// Tenant portal handlers
// Callers must resolve to the tenant role; requests are filed and listed
// under the realtor the tenant record is linked to

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::{
    app::AppState,
    middleware::auth::AuthenticatedUser,
    models::{ClaimTenantRequest, CreateMaintenanceRequest, Role, Tenant},
    utils::ServiceError,
};

async fn require_tenant(
    state: &AppState,
    auth_user: &AuthenticatedUser,
) -> Result<Tenant, ServiceError> {
    let resolution = state.roles().resolve(&auth_user.user_id).await;
    if resolution.role != Some(Role::Tenant) {
        return Err(ServiceError::Forbidden(
            "Only tenants can use the tenant portal".to_string(),
        ));
    }

    state
        .store
        .find_tenant(&auth_user.user_id)
        .await?
        .ok_or_else(|| ServiceError::Forbidden("Tenant profile not found".to_string()))
}

/// POST /v1/portal/claim - link the caller to a record their realtor created
pub async fn claim_tenant_record(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Json(request): Json<ClaimTenantRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let tenant = state
        .tenants()
        .claim(&auth_user.user_id, auth_user.email.as_deref(), request)
        .await?;
    Ok(Json(tenant))
}

/// GET /v1/portal/maintenance-requests
pub async fn list_my_maintenance(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    let tenant = require_tenant(&state, &auth_user).await?;
    let requests = match tenant.realtor_id.as_deref() {
        Some(realtor_id) => {
            state
                .maintenance()
                .list_for_tenant(realtor_id, &tenant.id)
                .await?
        },
        None => Vec::new(),
    };
    Ok(Json(requests))
}

/// POST /v1/portal/maintenance-requests
pub async fn create_my_maintenance(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Json(mut request): Json<CreateMaintenanceRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let tenant = require_tenant(&state, &auth_user).await?;
    let realtor_id = tenant.realtor_id.clone().ok_or_else(|| {
        ServiceError::ValidationError("Your account is not linked to a realtor yet".to_string())
    })?;

    // Tenants cannot file on behalf of someone else or pick another unit
    request.tenant_id = Some(tenant.id);
    request.property_id = tenant.property_id;

    let created = state.maintenance().create(&realtor_id, request).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /v1/portal/rent-payments
pub async fn list_my_rent_payments(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    let tenant = require_tenant(&state, &auth_user).await?;
    let payments = match tenant.realtor_id.as_deref() {
        Some(realtor_id) => {
            state
                .store
                .list_rent_payments_for_tenant(realtor_id, &tenant.id)
                .await?
        },
        None => Vec::new(),
    };
    Ok(Json(payments))
}
