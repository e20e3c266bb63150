// Common test utilities and helper structs
// Every integration test drives the real router against the in-memory store

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, Response, StatusCode},
    Router,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use realty_backend_core::{
    app::AppState,
    app_config::AppConfig,
    build_router,
    models::Priority,
    services::{
        payments::{CheckoutClient, CheckoutRequest, CheckoutSession, PaymentsError},
        subscription::PriceCatalog,
        triage::{PriorityClassifier, TriageError},
        IdentityClaims, IdentityVerifier, WebhookVerifier,
    },
    store::MemoryStore,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tower::util::ServiceExt;

pub const TEST_JWT_SECRET: &str = "test-identity-secret-with-at-least-32-chars";
pub const TEST_WEBHOOK_SECRET: &str = "whsec_test_webhook_secret";
pub const PRICE_BASIC: &str = "price_basic_monthly";
pub const PRICE_PRO: &str = "price_pro_monthly";
pub const PRICE_PREMIUM: &str = "price_premium_monthly";

/// Test configuration: memory store, HS256 identity, known price ids
pub fn test_config() -> AppConfig {
    let vars: HashMap<&str, &str> = HashMap::from([
        ("STORE_BACKEND", "memory"),
        ("ENVIRONMENT", "test"),
        ("IDENTITY_JWT_SECRET", TEST_JWT_SECRET),
        ("IDENTITY_JWT_LEEWAY_SECS", "0"),
        ("PAYMENTS_WEBHOOK_SECRET", TEST_WEBHOOK_SECRET),
        ("PAYMENTS_PRICE_BASIC", PRICE_BASIC),
        ("PAYMENTS_PRICE_PRO", PRICE_PRO),
        ("PAYMENTS_PRICE_PREMIUM", PRICE_PREMIUM),
        ("CORS_ALLOWED_ORIGINS", "https://app.example.com"),
    ]);
    AppConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap()
}

/// Classifier returning a fixed answer, or failing when `None`
pub struct StubClassifier(pub Option<Priority>);

#[async_trait]
impl PriorityClassifier for StubClassifier {
    async fn classify(&self, _description: &str) -> Result<Priority, TriageError> {
        self.0
            .ok_or_else(|| TriageError::Unparsable("I cannot decide".to_string()))
    }
}

/// Records checkout requests instead of calling the provider
#[derive(Default)]
pub struct RecordingCheckout {
    pub requests: Mutex<Vec<CheckoutRequest>>,
}

#[async_trait]
impl CheckoutClient for RecordingCheckout {
    async fn create_checkout_session(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, PaymentsError> {
        let mut requests = self.requests.lock().unwrap();
        requests.push(request.clone());
        Ok(CheckoutSession {
            id: format!("cs_test_{}", requests.len()),
            url: "https://checkout.example.com/session".to_string(),
        })
    }
}

/// Test application wrapper
pub struct TestApp {
    pub app: Router,
    pub store: Arc<MemoryStore>,
    pub checkout: Arc<RecordingCheckout>,
    pub webhooks: WebhookVerifier,
}

pub fn setup_test_app() -> TestApp {
    setup_test_app_with_classifier(StubClassifier(Some(Priority::High)))
}

pub fn setup_test_app_with_classifier(classifier: StubClassifier) -> TestApp {
    let config = test_config();
    let store = Arc::new(MemoryStore::new());
    let checkout = Arc::new(RecordingCheckout::default());

    let state = AppState {
        identity: Arc::new(IdentityVerifier::from_config(&config.identity).unwrap()),
        webhooks: Arc::new(WebhookVerifier::new(
            &config.payments.webhook_secret,
            config.payments.webhook_tolerance_secs,
        )),
        prices: Arc::new(PriceCatalog::from_config(&config.payments)),
        store: store.clone(),
        checkout: checkout.clone(),
        classifier: Arc::new(classifier),
        config: Arc::new(config),
    };

    TestApp {
        app: build_router(state),
        store,
        checkout,
        webhooks: WebhookVerifier::new(TEST_WEBHOOK_SECRET, 300),
    }
}

/// Mint an identity token the way the identity provider would
pub fn token_for(user_id: &str) -> String {
    let claims = IdentityClaims {
        sub: user_id.to_string(),
        exp: (chrono::Utc::now().timestamp() + 3600) as u64,
        sid: Some(format!("sess_{}", user_id)),
        email: Some(format!("{}@example.com", user_id)),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .unwrap()
}

impl TestApp {
    pub fn get(&self, uri: &str) -> TestRequest {
        TestRequest::new(self, "GET", uri)
    }

    pub fn post(&self, uri: &str) -> TestRequest {
        TestRequest::new(self, "POST", uri)
    }

    pub fn put(&self, uri: &str) -> TestRequest {
        TestRequest::new(self, "PUT", uri)
    }

    pub fn delete(&self, uri: &str) -> TestRequest {
        TestRequest::new(self, "DELETE", uri)
    }

    /// Deliver a correctly signed webhook payload
    pub async fn send_webhook(&self, payload: &serde_json::Value) -> TestResponse {
        let body = payload.to_string();
        let header = self
            .webhooks
            .header_for(chrono::Utc::now().timestamp(), body.as_bytes());
        self.post("/v1/webhooks/payments")
            .header("stripe-signature", &header)
            .raw_body(body)
            .send()
            .await
    }

    /// Sign up `user_id` as a realtor through the onboarding endpoint
    pub async fn onboard_realtor(&self, user_id: &str) {
        let response = self
            .post("/v1/onboarding/role")
            .as_user(user_id)
            .json(&serde_json::json!({
                "role": "realtor",
                "name": "Test Realtor",
                "email": format!("{}@example.com", user_id),
            }))
            .send()
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    /// Create a tenant record under `realtor_id` and return its generated id
    pub async fn create_tenant_record(&self, realtor_id: &str, email: &str) -> String {
        let response = self
            .post("/v1/tenants")
            .as_user(realtor_id)
            .json(&serde_json::json!({"name": "Pat Tenant", "email": email}))
            .send()
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body: serde_json::Value = response.json().await;
        body["id"].as_str().unwrap().to_string()
    }

    /// Onboard `realtor_id`, invite `tenant_id` by email and let them claim it
    pub async fn link_tenant(&self, realtor_id: &str, tenant_id: &str) {
        self.onboard_realtor(realtor_id).await;
        let record_id = self
            .create_tenant_record(realtor_id, &format!("{}@example.com", tenant_id))
            .await;
        let response = self
            .post("/v1/portal/claim")
            .as_user(tenant_id)
            .json(&serde_json::json!({"tenant_id": record_id}))
            .send()
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    /// Give `owner_id` an active plan through the checkout webhook
    pub async fn activate_plan(&self, owner_id: &str, price_id: &str) {
        let response = self
            .send_webhook(&checkout_completed(&format!("cus_{}", owner_id), owner_id, price_id))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}

/// Test request builder
pub struct TestRequest<'a> {
    app: &'a TestApp,
    method: &'static str,
    uri: String,
    headers: Vec<(String, String)>,
    body: Body,
}

impl<'a> TestRequest<'a> {
    fn new(app: &'a TestApp, method: &'static str, uri: &str) -> Self {
        Self {
            app,
            method,
            uri: uri.to_string(),
            headers: Vec::new(),
            body: Body::empty(),
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn bearer(self, token: &str) -> Self {
        self.header("authorization", &format!("Bearer {}", token))
    }

    pub fn as_user(self, user_id: &str) -> Self {
        self.bearer(&token_for(user_id))
    }

    /// Add JSON body to request
    pub fn json<T: Serialize>(mut self, body: &T) -> Self {
        self.body = Body::from(serde_json::to_vec(body).unwrap());
        self.header("content-type", "application/json")
    }

    pub fn raw_body(mut self, body: String) -> Self {
        self.body = Body::from(body);
        self.header("content-type", "application/json")
    }

    /// Send the request
    pub async fn send(self) -> TestResponse {
        let mut builder = Request::builder().method(self.method).uri(&self.uri);
        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        let request = builder.body(self.body).unwrap();
        let response = self.app.app.clone().oneshot(request).await.unwrap();

        TestResponse { response }
    }
}

/// Test response wrapper
pub struct TestResponse {
    response: Response<Body>,
}

impl TestResponse {
    pub fn status(&self) -> StatusCode {
        self.response.status()
    }

    pub fn header(&self, name: &str) -> Option<String> {
        self.response
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
    }

    /// Parse JSON response
    pub async fn json<T: serde::de::DeserializeOwned>(self) -> T {
        let body = axum::body::to_bytes(self.response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }
}

// =============================================================================
// PROVIDER EVENT FIXTURES
// =============================================================================

pub fn checkout_completed(customer_id: &str, owner_id: &str, price_id: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "evt_checkout",
        "type": "checkout.session.completed",
        "data": {"object": {
            "object": "checkout.session",
            "customer": customer_id,
            "client_reference_id": owner_id,
            "metadata": {"owner_id": owner_id, "price_id": price_id}
        }}
    })
}

pub fn subscription_updated(
    customer_id: &str,
    price_id: &str,
    status: &str,
    trial_end: Option<i64>,
) -> serde_json::Value {
    serde_json::json!({
        "id": "evt_sub_updated",
        "type": "customer.subscription.updated",
        "data": {"object": {
            "object": "subscription",
            "customer": {"id": customer_id},
            "status": status,
            "trial_end": trial_end,
            "items": {"data": [{"price": {"id": price_id}}]}
        }}
    })
}

pub fn status_event(event_type: &str, customer_id: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "evt_status",
        "type": event_type,
        "data": {"object": {"customer": customer_id}}
    })
}
