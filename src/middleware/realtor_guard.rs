// Route guard for the realtor back office
// Runs after auth_middleware; callers without a realtor row get 403

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::{app::AppState, middleware::auth::AuthenticatedUser, utils::ServiceError};

/// Realtor rows win role precedence, so a realtor row is the realtor role
pub async fn require_realtor(
    State(app_state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let Some(user_id) = request
        .extensions()
        .get::<AuthenticatedUser>()
        .map(|user| user.user_id.clone())
    else {
        return ServiceError::Unauthorized.into_response();
    };

    match app_state.store.find_realtor(&user_id).await {
        Ok(Some(_)) => next.run(request).await,
        Ok(None) => {
            tracing::debug!("Non-realtor {} refused on {}", user_id, request.uri().path());
            ServiceError::Forbidden("Only realtors can manage these records".to_string())
                .into_response()
        },
        Err(e) => ServiceError::from(e).into_response(),
    }
}
