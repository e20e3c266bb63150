// Payment provider checkout client

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::app_config::PaymentsConfig;

#[derive(Debug, Error)]
pub enum PaymentsError {
    #[error("Payments API key is not configured")]
    NotConfigured,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Payments API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

/// Subscription-mode checkout for one price
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutRequest {
    pub owner_id: String,
    pub price_id: String,
    pub customer_email: Option<String>,
    pub success_url: String,
    pub cancel_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

#[async_trait]
pub trait CheckoutClient: Send + Sync {
    async fn create_checkout_session(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, PaymentsError>;
}

/// Stripe-compatible REST client
pub struct HttpCheckoutClient {
    http: reqwest::Client,
    api_base: String,
    api_key: Option<String>,
}

impl HttpCheckoutClient {
    pub fn from_config(config: &PaymentsConfig) -> Result<Self, PaymentsError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }
}

/// Form fields for the checkout session endpoint. Metadata goes on both the
/// session and the subscription so every later event can be attributed.
pub fn checkout_form(request: &CheckoutRequest) -> Vec<(String, String)> {
    let mut form = vec![
        ("mode".to_string(), "subscription".to_string()),
        ("line_items[0][price]".to_string(), request.price_id.clone()),
        ("line_items[0][quantity]".to_string(), "1".to_string()),
        ("success_url".to_string(), request.success_url.clone()),
        ("cancel_url".to_string(), request.cancel_url.clone()),
        ("client_reference_id".to_string(), request.owner_id.clone()),
        ("metadata[owner_id]".to_string(), request.owner_id.clone()),
        ("metadata[price_id]".to_string(), request.price_id.clone()),
        (
            "subscription_data[metadata][owner_id]".to_string(),
            request.owner_id.clone(),
        ),
        (
            "subscription_data[metadata][price_id]".to_string(),
            request.price_id.clone(),
        ),
    ];
    if let Some(email) = &request.customer_email {
        form.push(("customer_email".to_string(), email.clone()));
    }
    form
}

#[async_trait]
impl CheckoutClient for HttpCheckoutClient {
    async fn create_checkout_session(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, PaymentsError> {
        let api_key = self.api_key.as_deref().ok_or(PaymentsError::NotConfigured)?;

        let response = self
            .http
            .post(format!("{}/v1/checkout/sessions", self.api_base))
            .bearer_auth(api_key)
            .form(&checkout_form(request))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PaymentsError::Api {
                status: status.as_u16(),
                body,
            });
        }

        #[derive(Deserialize)]
        struct SessionBody {
            id: String,
            url: Option<String>,
        }

        let body: SessionBody = response.json().await?;
        let url = body
            .url
            .ok_or_else(|| PaymentsError::UnexpectedResponse("session has no url".to_string()))?;

        Ok(CheckoutSession { id: body.id, url })
    }
}
