// Billing handlers: checkout, current plan and the provider webhook

use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::warn;

use crate::{
    app::AppState,
    middleware::auth::AuthenticatedUser,
    models::{PlanTier, SubscriptionResponse},
    services::{webhook_signature::SIGNATURE_HEADER, CheckoutRequest},
    utils::ServiceError,
};

#[derive(Debug, Deserialize)]
pub struct StartCheckoutRequest {
    pub plan: PlanTier,
}

/// POST /v1/billing/checkout - Create a hosted checkout session for a plan
pub async fn start_checkout(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Json(payload): Json<StartCheckoutRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let payments = &state.config.payments;
    let session = state
        .billing()
        .start_checkout(
            state.checkout.as_ref(),
            payload.plan,
            CheckoutRequest {
                owner_id: auth_user.user_id.clone(),
                price_id: String::new(),
                customer_email: auth_user.email.clone(),
                success_url: payments.checkout_success_url.clone(),
                cancel_url: payments.checkout_cancel_url.clone(),
            },
        )
        .await?;
    Ok(Json(session))
}

/// GET /v1/billing/subscription
pub async fn get_subscription(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    let subscription = state
        .billing()
        .current_subscription(&auth_user.user_id)
        .await?
        .ok_or(ServiceError::NotFound)?;
    Ok(Json(SubscriptionResponse::from(subscription)))
}

/// POST /v1/webhooks/payments - Signed provider events
/// The signature is checked over the raw body before anything is parsed
pub async fn payments_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ServiceError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    if let Err(e) = state
        .webhooks
        .verify(signature, &body, Utc::now().timestamp())
    {
        warn!("Rejected payments webhook: {}", e);
        return Err(ServiceError::InvalidSignature(e.to_string()));
    }

    let outcome = state.billing().handle_webhook(&body, Utc::now()).await?;
    Ok(Json(outcome))
}
