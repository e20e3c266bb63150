// Onboarding handlers
// Resolves which dashboard a signed-in identity belongs to and lets
// first-time users pick a role

use axum::{extract::State, response::IntoResponse, Json};

use crate::{
    app::AppState, middleware::auth::AuthenticatedUser, models::SelectRoleRequest,
    utils::ServiceError,
};

/// GET /v1/onboarding/role - Resolve the caller's role and dashboard path
pub async fn resolve_role(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
) -> impl IntoResponse {
    Json(state.roles().resolve(&auth_user.user_id).await)
}

/// POST /v1/onboarding/role - Register the caller as a realtor or tenant
pub async fn select_role(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Json(payload): Json<SelectRoleRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let resolution = state.roles().select(&auth_user.user_id, payload).await?;
    tracing::info!(
        "User {} onboarded as {:?}",
        auth_user.user_id,
        resolution.role
    );
    Ok(Json(resolution))
}
