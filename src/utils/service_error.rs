// Service error type returned by every handler
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::models::QuotaDenied;
use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not found")]
    NotFound,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Subscription limit exceeded")]
    SubscriptionLimitExceeded(String),

    #[error("No active plan")]
    NoActivePlan,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Invalid webhook signature: {0}")]
    InvalidSignature(String),

    #[error("Unknown price id: {0}")]
    UnknownPrice(String),

    #[error("Upstream error: {0}")]
    UpstreamError(String),

    #[error("Internal server error")]
    InternalError,
}

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServiceError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound => StatusCode::NOT_FOUND,
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::SubscriptionLimitExceeded(_) => StatusCode::PAYMENT_REQUIRED,
            ServiceError::NoActivePlan => StatusCode::PAYMENT_REQUIRED,
            ServiceError::Unauthorized => StatusCode::UNAUTHORIZED,
            ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,
            ServiceError::InvalidSignature(_) => StatusCode::BAD_REQUEST,
            ServiceError::UnknownPrice(_) => StatusCode::BAD_REQUEST,
            ServiceError::UpstreamError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServiceError::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_message = match self {
            // Store and upstream details stay in the logs
            ServiceError::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                "Database error".to_string()
            },
            ServiceError::UpstreamError(msg) => {
                tracing::error!("Upstream error: {}", msg);
                "Upstream service error".to_string()
            },
            ServiceError::ValidationError(msg) => msg,
            ServiceError::NotFound => "Resource not found".to_string(),
            ServiceError::Conflict(msg) => msg,
            ServiceError::SubscriptionLimitExceeded(msg) => msg,
            ServiceError::NoActivePlan => {
                "An active subscription is required to add properties".to_string()
            },
            ServiceError::Unauthorized => "Unauthorized".to_string(),
            ServiceError::Forbidden(msg) => msg,
            ServiceError::InvalidSignature(msg) => format!("Invalid webhook signature: {}", msg),
            ServiceError::UnknownPrice(price) => format!("Unknown price id: {}", price),
            ServiceError::InternalError => "Internal server error".to_string(),
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

// Conversion from various error types
impl From<StoreError> for ServiceError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Conflict(msg) => ServiceError::Conflict(msg),
            other => ServiceError::DatabaseError(other.to_string()),
        }
    }
}

impl From<QuotaDenied> for ServiceError {
    fn from(denied: QuotaDenied) -> Self {
        match denied {
            QuotaDenied::NoPlan => ServiceError::NoActivePlan,
            QuotaDenied::LimitReached { plan, limit } => ServiceError::SubscriptionLimitExceeded(
                format!("Your {} plan allows {} properties", plan, limit),
            ),
        }
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(error: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ServiceError::SubscriptionLimitExceeded("limit".into()).status_code(),
            StatusCode::PAYMENT_REQUIRED
        );
        assert_eq!(ServiceError::NoActivePlan.status_code(), StatusCode::PAYMENT_REQUIRED);
        assert_eq!(
            ServiceError::InvalidSignature("bad".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::UnknownPrice("price_x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_store_conflict_maps_to_409() {
        let error: ServiceError = StoreError::Conflict("tenants_pkey".into()).into();
        assert_eq!(error.status_code(), StatusCode::CONFLICT);

        let error: ServiceError = StoreError::Pool("timed out".into()).into();
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
