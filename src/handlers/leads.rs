// Lead handlers: public capture form and the owner's lead inbox

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::{
    app::AppState,
    middleware::auth::AuthenticatedUser,
    models::{CaptureLeadRequest, LeadChanges, UpdateLeadRequest},
    utils::ServiceError,
};

/// POST /v1/public/leads - Unauthenticated contact form submission
pub async fn capture_lead(
    State(state): State<AppState>,
    Json(request): Json<CaptureLeadRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    request.validate()?;
    let lead = state.store.insert_lead(request.into_new_lead()).await?;
    info!("Captured lead {} for {}", lead.id, lead.owner_id);
    // The submitter only learns that the lead was received
    Ok((StatusCode::CREATED, Json(json!({ "id": lead.id }))))
}

pub async fn list_leads(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(state.store.list_leads(&auth_user.user_id).await?))
}

pub async fn update_lead(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateLeadRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    request.validate()?;
    let lead = state
        .store
        .update_lead(&auth_user.user_id, id, LeadChanges::from(request))
        .await?
        .ok_or(ServiceError::NotFound)?;
    Ok(Json(lead))
}

pub async fn delete_lead(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    if state.store.delete_lead(&auth_user.user_id, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ServiceError::NotFound)
    }
}
